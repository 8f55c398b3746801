//! AMF0 value type
//!
//! Object-like values keep their properties in wire order so metadata can be
//! dumped in the order the muxer wrote it.

/// Decoded AMF0 value
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    /// Null (0x05)
    Null,

    /// Undefined (0x06), also used for unsupported markers in lenient mode
    Undefined,

    /// Boolean (0x01)
    Boolean(bool),

    /// IEEE 754 double-precision floating point (0x00)
    Number(f64),

    /// UTF-8 string (0x02 short, 0x0C long)
    String(String),

    /// Dense array (0x0A)
    Array(Vec<AmfValue>),

    /// Anonymous object (0x03)
    Object(Vec<(String, AmfValue)>),

    /// Associative array (0x08), the usual container for onMetaData
    EcmaArray(Vec<(String, AmfValue)>),

    /// Date as milliseconds since Unix epoch (0x0B)
    Date(f64),

    /// XML document (0x0F)
    Xml(String),
}

impl AmfValue {
    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmfValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AmfValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Properties of an object or ECMA array, in wire order
    pub fn properties(&self) -> Option<&[(String, AmfValue)]> {
        match self {
            AmfValue::Object(props) | AmfValue::EcmaArray(props) => Some(props),
            _ => None,
        }
    }

    /// Get the first property named `key`
    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        self.properties()?
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Get a string property from an object value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Get a number property from an object value
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_number()
    }
}

impl Default for AmfValue {
    fn default() -> Self {
        AmfValue::Null
    }
}
