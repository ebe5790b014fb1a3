//! # Argument decoder
//!
//! Turns a raw payload into the argument list of the selected overload.
//!
//! - Stream overloads get the payload piped through untouched.
//! - One value position decodes the whole payload against its kind.
//! - Two value positions expect a two-element JSON array, one element per position.
//!
//! Scalars are strict (`123` is an int, `"123"` is not), records are permissive
//! (unknown fields ignored, absent fields zeroed). A failure here is final for
//! the invocation: no other overload is tried and user code never runs.

use serde_json::Map;
use serde_json::Value;

use crate::args::Arg;
use crate::args::Args;
use crate::args::Input;
use crate::args::Output;
use crate::args::Record;
use crate::codec::Codec;
use crate::payload::Payload;
use crate::payload::PayloadTag;
use crate::registry::FieldKind;
use crate::registry::RecordSchema;
use crate::registry::TypeRegistry;
use crate::signature::Collection;
use crate::signature::ParameterKind;
use crate::signature::Primitive;
use crate::signature::Shape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The payload does not match the grammar of the target kind.
    TypeMismatch {
        /// Where in the argument list, e.g. `$0` or `$0.firstName`.
        path: String,
        expected: String,
        found: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch { path, expected, found } => {
                write!(f, "type mismatch at {}: expected {}, found {}", path, expected, found)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

fn mismatch(path: &str, expected: impl std::fmt::Display, found: impl Into<String>) -> Error {
    Error::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: found.into(),
    }
}

/// Decodes `payload` into arguments for an overload of the given shape whose
/// non-context parameters are `positions`.
pub fn decode(
    codec: &Codec,
    registry: &dyn TypeRegistry,
    shape: Shape,
    positions: &[ParameterKind],
    payload: &Payload,
) -> Result<Args> {
    if shape == Shape::Stream {
        return Ok(Args::new(vec![
            Arg::Input(Input::new(payload.as_bytes().to_vec())),
            Arg::Output(Output::new()),
        ]));
    }

    let decoder = Decoder { codec, registry };
    match positions {
        [] => Ok(Args::default()),
        [kind] => Ok(Args::new(vec![decoder.whole_payload(kind, payload)?])),
        kinds => decoder.positional(kinds, payload),
    }
}

struct Decoder<'a> {
    codec: &'a Codec,
    registry: &'a dyn TypeRegistry,
}

impl Decoder<'_> {
    /// Decodes the entire payload as a single argument.
    fn whole_payload(&self, kind: &ParameterKind, payload: &Payload) -> Result<Arg> {
        const PATH: &str = "$0";

        match kind {
            ParameterKind::Primitive(Primitive::Int) => {
                if payload.tag() != PayloadTag::Integer {
                    return Err(mismatch(PATH, kind, describe_tag(payload.tag())));
                }
                let value = self.parse(PATH, kind, payload)?;
                self.json_arg(kind, &value, PATH)
            }
            ParameterKind::Primitive(Primitive::Bool) => match payload.trimmed() {
                b"true" => Ok(Arg::Bool(true)),
                b"false" => Ok(Arg::Bool(false)),
                _ => Err(mismatch(PATH, kind, describe_tag(payload.tag()))),
            },
            ParameterKind::Primitive(Primitive::String) => match self.codec.parse(payload.as_bytes()) {
                Ok(Value::String(s)) => Ok(Arg::Str(s)),
                Ok(other) => Err(mismatch(PATH, kind, json_type(&other))),
                // Not JSON at all: the bare text is the string.
                Err(_) => std::str::from_utf8(payload.as_bytes())
                    .map(|raw| Arg::Str(raw.to_string()))
                    .map_err(|_| mismatch(PATH, kind, "non-UTF-8 bytes")),
            },
            ParameterKind::Collection(Collection::Map) | ParameterKind::Record(_) => {
                if payload.tag() != PayloadTag::JsonObject {
                    return Err(mismatch(PATH, kind, describe_tag(payload.tag())));
                }
                let value = self.parse(PATH, kind, payload)?;
                self.json_arg(kind, &value, PATH)
            }
            ParameterKind::Collection(Collection::List) => {
                if payload.tag() != PayloadTag::JsonArray {
                    return Err(mismatch(PATH, kind, describe_tag(payload.tag())));
                }
                let value = self.parse(PATH, kind, payload)?;
                self.json_arg(kind, &value, PATH)
            }
            ParameterKind::Context | ParameterKind::InputStream | ParameterKind::OutputStream => {
                Err(mismatch(PATH, "a value parameter", kind.to_string()))
            }
        }
    }

    /// Decodes a JSON array payload with one element per position.
    fn positional(&self, kinds: &[ParameterKind], payload: &Payload) -> Result<Args> {
        let expected = format!("array of {} arguments", kinds.len());

        if payload.tag() != PayloadTag::JsonArray {
            return Err(mismatch("$", &expected, describe_tag(payload.tag())));
        }

        let items = match self.codec.parse(payload.as_bytes()) {
            Ok(Value::Array(items)) => items,
            Ok(other) => return Err(mismatch("$", &expected, json_type(&other))),
            Err(_) => return Err(mismatch("$", &expected, "invalid JSON")),
        };

        if items.len() != kinds.len() {
            return Err(mismatch("$", &expected, format!("array of {}", items.len())));
        }

        let mut args = Args::default();
        for (i, (kind, item)) in kinds.iter().zip(items.iter()).enumerate() {
            args.push(self.json_arg(kind, item, &format!("${}", i))?);
        }
        Ok(args)
    }

    fn parse(&self, path: &str, kind: &ParameterKind, payload: &Payload) -> Result<Value> {
        self.codec
            .parse(payload.as_bytes())
            .map_err(|_| mismatch(path, kind, "invalid JSON"))
    }

    /// Converts an already parsed JSON value into an argument.
    fn json_arg(&self, kind: &ParameterKind, value: &Value, path: &str) -> Result<Arg> {
        match (kind, value) {
            (ParameterKind::Primitive(Primitive::Int), Value::Number(n)) => n
                .as_i64()
                .map(Arg::Int)
                .ok_or_else(|| mismatch(path, kind, format!("number {}", n))),
            (ParameterKind::Primitive(Primitive::Bool), Value::Bool(b)) => Ok(Arg::Bool(*b)),
            (ParameterKind::Primitive(Primitive::String), Value::String(s)) => Ok(Arg::Str(s.clone())),
            (ParameterKind::Collection(Collection::Map), Value::Object(o)) => Ok(Arg::Map(o.clone())),
            (ParameterKind::Collection(Collection::List), Value::Array(a)) => Ok(Arg::List(a.clone())),
            (ParameterKind::Record(name), Value::Object(o)) => {
                let schema = self
                    .registry
                    .record(name)
                    .ok_or_else(|| mismatch(path, kind, "unregistered record type"))?;
                self.record(&schema, o, path).map(Arg::Record)
            }
            (_, other) => Err(mismatch(path, kind, json_type(other))),
        }
    }

    /// Populates a record field by field. Unknown fields are ignored; absent
    /// and `null` fields take the zero value of their kind.
    fn record(&self, schema: &RecordSchema, object: &Map<String, Value>, path: &str) -> Result<Record> {
        let mut fields = Map::new();

        for field in &schema.fields {
            let field_path = format!("{}.{}", path, field.name);
            let value = match object.get(&field.name) {
                None | Some(Value::Null) => zero_value(&field.kind),
                Some(value) => self.field(&field.kind, value, &field_path)?,
            };
            fields.insert(field.name.clone(), value);
        }

        Ok(Record {
            type_name: schema.name.clone(),
            fields,
        })
    }

    fn field(&self, kind: &FieldKind, value: &Value, path: &str) -> Result<Value> {
        let ok = match (kind, value) {
            (FieldKind::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldKind::Float, Value::Number(_)) => true,
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::List, Value::Array(_)) => true,
            (FieldKind::Map, Value::Object(_)) => true,
            (FieldKind::Any, _) => true,
            (FieldKind::Record(name), Value::Object(o)) => {
                return match self.registry.record(name) {
                    Some(schema) => self.record(&schema, o, path).map(Record::into_value),
                    // No schema to narrow by: keep the object as sent.
                    None => Ok(value.clone()),
                };
            }
            _ => false,
        };

        if ok {
            Ok(value.clone())
        } else {
            Err(mismatch(path, kind, json_type(value)))
        }
    }
}

/// Zero value used for absent record fields.
fn zero_value(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Int => Value::from(0),
        FieldKind::Float => Value::from(0.0),
        FieldKind::Bool => Value::Bool(false),
        FieldKind::String => Value::String(String::new()),
        FieldKind::List => Value::Array(Vec::new()),
        FieldKind::Map => Value::Object(Map::new()),
        // Nested records stay unset rather than recursing into their defaults.
        FieldKind::Record(_) | FieldKind::Any => Value::Null,
    }
}

fn describe_tag(tag: PayloadTag) -> &'static str {
    match tag {
        PayloadTag::Integer => "an integer",
        PayloadTag::Boolean => "a boolean",
        PayloadTag::JsonObject => "an object",
        PayloadTag::JsonArray => "an array",
        PayloadTag::PlainString => "plain text",
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
