//! AMF0 decoding for FLV script data tags

pub mod amf0;
pub mod value;

pub use amf0::Amf0Decoder;
pub use value::AmfValue;
