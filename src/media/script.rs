//! Script data tags (onMetaData and friends)

use bytes::Bytes;

use crate::amf::{Amf0Decoder, AmfValue};
use crate::error::AmfError;

/// Decoded script data tag: a handler name followed by its argument
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptData {
    /// Handler name, e.g. `onMetaData`
    pub name: String,
    pub value: AmfValue,
}

impl ScriptData {
    /// Decode a script data tag payload; `data` is shared, not copied
    pub fn decode(data: &Bytes) -> Result<Self, AmfError> {
        let mut buf = data.clone();
        let mut decoder = Amf0Decoder::new();

        let name = match decoder.decode(&mut buf)? {
            AmfValue::String(name) => name,
            other => {
                tracing::debug!(value = ?other, "Script data does not start with a name");
                String::new()
            }
        };
        let value = if buf.is_empty() {
            AmfValue::Undefined
        } else {
            decoder.decode(&mut buf)?
        };

        Ok(Self { name, value })
    }

    pub fn is_metadata(&self) -> bool {
        self.name == "onMetaData"
    }

    /// Top-level properties, in wire order
    pub fn properties(&self) -> &[(String, AmfValue)] {
        self.value.properties().unwrap_or(&[])
    }

    /// Render the value as indented property lines for logging
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self.value.properties() {
            Some(props) => describe_properties(props, 0, &mut lines),
            None => describe_value(None, &self.value, 0, &mut lines),
        }
        lines
    }
}

fn describe_properties(props: &[(String, AmfValue)], depth: usize, lines: &mut Vec<String>) {
    for (name, value) in props {
        describe_value(Some(name.as_str()), value, depth, lines);
    }
}

fn describe_value(name: Option<&str>, value: &AmfValue, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let label = name.map(|n| format!("{n}: ")).unwrap_or_default();

    match value {
        AmfValue::Number(n) => lines.push(format!("{indent}{label}{n:.2}")),
        AmfValue::Boolean(b) => {
            lines.push(format!("{indent}{label}{}", if *b { "TRUE" } else { "FALSE" }))
        }
        AmfValue::String(s) | AmfValue::Xml(s) => lines.push(format!("{indent}{label}{s}")),
        AmfValue::Date(ms) => lines.push(format!("{indent}{label}timestamp:{ms:.2}")),
        AmfValue::Null => lines.push(format!("{indent}{label}null")),
        AmfValue::Undefined => lines.push(format!("{indent}{label}undefined")),
        AmfValue::Object(props) | AmfValue::EcmaArray(props) => {
            if let Some(name) = name {
                lines.push(format!("{indent}{name}:"));
            }
            describe_properties(props, depth + 1, lines);
        }
        AmfValue::Array(items) => {
            if let Some(name) = name {
                lines.push(format!("{indent}{name}:"));
            }
            for item in items {
                describe_value(None, item, depth + 1, lines);
            }
        }
    }
}
