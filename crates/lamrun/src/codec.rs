//! # Data codec
//!
//! JSON encode/decode shared by the argument decoder and the result encoder.
//! The codec is an immutable value configured once per process and passed
//! explicitly; there is no global instance.

use serde_json::Value;

#[derive(Debug)]
pub enum Error {
    /// The input is not valid JSON.
    Parse(serde_json::Error),
    /// The value could not be serialized.
    Serialize(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid JSON: {}", e),
            Self::Serialize(e) => write!(f, "serialization failed: {}", e),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Encoding options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodecConfig {
    /// Indent encoded output.
    pub pretty: bool,
    /// Keep object fields whose value is `null`. Dropped by default.
    pub emit_nulls: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes).map_err(Error::Parse)
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        if self.config.emit_nulls {
            return self.write(value);
        }
        self.write(&strip_nulls(value))
    }

    fn write(&self, value: &Value) -> Result<Vec<u8>> {
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        bytes.map_err(Error::Serialize)
    }
}

/// Removes `null`-valued object fields at every depth. List elements are kept
/// so positions do not shift.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}
