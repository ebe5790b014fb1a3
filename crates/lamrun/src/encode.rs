//! # Result encoder
//!
//! Turns what a handler produced into the response body:
//!
//! - stream overloads: the bytes written to the output sink, verbatim;
//! - `void` overloads: no body;
//! - value overloads: the returned value, JSON encoded with the shared codec.
//!
//! A returned value must have the JSON type of the declared kind. `null` is
//! accepted for every kind.

use serde_json::Value;
use tracing::warn;

use crate::args::Output;
use crate::codec::Codec;
use crate::decode::json_type;
use crate::invoke::Returned;
use crate::signature::Collection;
use crate::signature::ParameterKind;
use crate::signature::Primitive;
use crate::signature::ReturnKind;
use crate::signature::Shape;

#[derive(Debug)]
pub enum Error {
    /// The handler returned a value of another type than it declared.
    ReturnMismatch {
        declared: ParameterKind,
        found: &'static str,
    },
    Codec(crate::codec::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReturnMismatch { declared, found } => {
                write!(f, "declared return type {} but returned {}", declared, found)
            }
            Self::Codec(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::codec::Error> for Error {
    fn from(e: crate::codec::Error) -> Self {
        Self::Codec(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The result of a successful invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Void,
    Body(Vec<u8>),
}

impl Outcome {
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Void => None,
            Self::Body(bytes) => Some(bytes),
        }
    }

    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            Self::Void => None,
            Self::Body(bytes) => Some(bytes),
        }
    }
}

/// Encodes the result of one call.
///
/// `output` is the stream sink for stream overloads and ignored otherwise.
pub fn encode(
    codec: &Codec,
    shape: Shape,
    declared: &ReturnKind,
    returned: Returned,
    output: Option<Output>,
) -> Result<Outcome> {
    if shape == Shape::Stream {
        let bytes = output.map(Output::into_bytes).unwrap_or_default();
        return Ok(Outcome::Body(bytes));
    }

    match (declared, returned) {
        (ReturnKind::Void, Returned::Void) => Ok(Outcome::Void),
        (ReturnKind::Void, Returned::Value(_)) => {
            warn!("value returned from a void overload was dropped");
            Ok(Outcome::Void)
        }
        (ReturnKind::Value(kind), Returned::Value(value)) => {
            if !conforms(kind, &value) {
                return Err(Error::ReturnMismatch {
                    declared: kind.clone(),
                    found: json_type(&value),
                });
            }
            Ok(Outcome::Body(codec.encode(&value)?))
        }
        (ReturnKind::Value(_), Returned::Void) => Ok(Outcome::Body(codec.encode(&Value::Null)?)),
    }
}

/// Whether `value` has the JSON type of `kind`.
fn conforms(kind: &ParameterKind, value: &Value) -> bool {
    match (kind, value) {
        (_, Value::Null) => true,
        (ParameterKind::Primitive(Primitive::Int), Value::Number(n)) => n.is_i64() || n.is_u64(),
        (ParameterKind::Primitive(Primitive::Bool), Value::Bool(_)) => true,
        (ParameterKind::Primitive(Primitive::String), Value::String(_)) => true,
        (ParameterKind::Collection(Collection::Map), Value::Object(_)) => true,
        (ParameterKind::Collection(Collection::List), Value::Array(_)) => true,
        (ParameterKind::Record(_), Value::Object(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use serde_json::json;

    use crate::signature::ParameterKind;

    #[test]
    fn test_void() {
        let out = encode(&Codec::default(), Shape::General, &ReturnKind::Void, Returned::Void, None).unwrap();
        assert_eq!(out, Outcome::Void);
        assert_eq!(out.body(), None);
    }

    #[test]
    fn test_value_keeps_list_order() {
        let declared = ReturnKind::Value(ParameterKind::list());
        let out = encode(&Codec::default(), Shape::General, &declared, Returned::Value(json!([3, 1, 2])), None).unwrap();
        assert_eq!(out.body(), Some(&b"[3,1,2]"[..]));
    }

    #[test]
    fn test_string_value_is_quoted() {
        let declared = ReturnKind::Value(ParameterKind::string());
        let out = encode(&Codec::default(), Shape::General, &declared, Returned::Value(json!("7")), None).unwrap();
        assert_eq!(out.into_body(), Some(b"\"7\"".to_vec()));
    }

    #[test]
    fn test_mismatched_returns() {
        let declared = ReturnKind::Value(ParameterKind::int());
        let out = encode(&Codec::default(), Shape::General, &declared, Returned::Void, None).unwrap();
        assert_eq!(out.body(), Some(&b"null"[..]));

        let out = encode(&Codec::default(), Shape::General, &ReturnKind::Void, Returned::Value(json!(1)), None).unwrap();
        assert_eq!(out, Outcome::Void);
    }

    #[test]
    fn test_value_must_match_declared_kind() {
        let declared = ReturnKind::Value(ParameterKind::int());
        let err = encode(&Codec::default(), Shape::General, &declared, Returned::Value(json!("7")), None).unwrap_err();
        assert!(matches!(err, Error::ReturnMismatch { found: "a string", .. }));

        let declared = ReturnKind::Value(ParameterKind::record("Atom"));
        assert!(encode(&Codec::default(), Shape::General, &declared, Returned::Value(json!([1])), None).is_err());
        assert!(encode(&Codec::default(), Shape::General, &declared, Returned::Value(json!({"symbol": "He"})), None).is_ok());
    }

    #[test]
    fn test_null_fits_any_kind() {
        let declared = ReturnKind::Value(ParameterKind::string());
        let out = encode(&Codec::default(), Shape::General, &declared, Returned::Value(Value::Null), None).unwrap();
        assert_eq!(out.body(), Some(&b"null"[..]));
    }

    #[test]
    fn test_stream_body_is_verbatim() {
        let mut output = Output::new();
        output.write_all(b"HELLO").unwrap();
        let out = encode(&Codec::default(), Shape::Stream, &ReturnKind::Void, Returned::Void, Some(output)).unwrap();
        assert_eq!(out.body(), Some(&b"HELLO"[..]));
    }
}
