//! # Decoded arguments
//!
//! [`Args`] is the argument list a handler receives: the decoded payload
//! positions in declared order, followed by the [`Context`] when the overload
//! asks for one. Stream overloads get an [`Input`] over the payload bytes and
//! an [`Output`] sink whose contents become the response body.
//!
//! Everything in an `Args` belongs to exactly one invocation and is dropped
//! with it.

use std::io::BufRead;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;

use anyhow::Context as _;
use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::context::Context;

/// Readable view of the payload bytes for stream handlers.
#[derive(Debug)]
pub struct Input {
    inner: Cursor<Vec<u8>>,
}

impl Input {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(bytes),
        }
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for Input {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// In-memory sink capturing a stream handler's output.
#[derive(Debug, Default)]
pub struct Output {
    buf: Vec<u8>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A decoded instance of a registered record type.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Converts into a serde type with the same field names.
    pub fn into_typed<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        let type_name = self.type_name;
        serde_json::from_value(Value::Object(self.fields))
            .with_context(|| format!("record '{}' does not fit the requested type", type_name))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// One argument value.
#[derive(Debug)]
pub enum Arg {
    Int(i64),
    Bool(bool),
    Str(String),
    Map(Map<String, Value>),
    List(Vec<Value>),
    Record(Record),
    Input(Input),
    Output(Output),
    Context(Context),
}

impl Arg {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Map(_) => "map",
            Self::List(_) => "list",
            Self::Record(_) => "record",
            Self::Input(_) => "InputStream",
            Self::Output(_) => "OutputStream",
            Self::Context(_) => "Context",
        }
    }
}

/// The full argument list for one call.
#[derive(Debug, Default)]
pub struct Args {
    values: Vec<Arg>,
}

impl Args {
    pub fn new(values: Vec<Arg>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.values.iter()
    }

    pub fn into_inner(self) -> Vec<Arg> {
        self.values
    }

    pub(crate) fn push(&mut self, arg: Arg) {
        self.values.push(arg);
    }

    fn at(&self, index: usize) -> anyhow::Result<&Arg> {
        self.values
            .get(index)
            .ok_or_else(|| anyhow!("no argument at position {} (have {})", index, self.values.len()))
    }

    fn mismatch(&self, index: usize, wanted: &str) -> anyhow::Error {
        let found = self.values.get(index).map(Arg::kind_name).unwrap_or("nothing");
        anyhow!("argument {} is {}, not {}", index, found, wanted)
    }

    pub fn int(&self, index: usize) -> anyhow::Result<i64> {
        match self.at(index)? {
            Arg::Int(v) => Ok(*v),
            _ => Err(self.mismatch(index, "int")),
        }
    }

    pub fn bool(&self, index: usize) -> anyhow::Result<bool> {
        match self.at(index)? {
            Arg::Bool(v) => Ok(*v),
            _ => Err(self.mismatch(index, "bool")),
        }
    }

    pub fn str(&self, index: usize) -> anyhow::Result<&str> {
        match self.at(index)? {
            Arg::Str(v) => Ok(v),
            _ => Err(self.mismatch(index, "string")),
        }
    }

    pub fn map(&self, index: usize) -> anyhow::Result<&Map<String, Value>> {
        match self.at(index)? {
            Arg::Map(v) => Ok(v),
            _ => Err(self.mismatch(index, "map")),
        }
    }

    pub fn list(&self, index: usize) -> anyhow::Result<&[Value]> {
        match self.at(index)? {
            Arg::List(v) => Ok(v),
            _ => Err(self.mismatch(index, "list")),
        }
    }

    pub fn record(&self, index: usize) -> anyhow::Result<&Record> {
        match self.at(index)? {
            Arg::Record(v) => Ok(v),
            _ => Err(self.mismatch(index, "record")),
        }
    }

    /// Clones the record at `index` into a serde type.
    pub fn typed<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        self.record(index)?.clone().into_typed()
    }

    /// The input stream and output sink of a stream overload.
    pub fn streams(&mut self) -> anyhow::Result<(&mut Input, &mut Output)> {
        match self.values.as_mut_slice() {
            [Arg::Input(input), Arg::Output(output), ..] => Ok((input, output)),
            _ => Err(anyhow!("arguments do not start with an input and an output stream")),
        }
    }

    /// The injected context, when the overload declared one.
    pub fn context(&self) -> Option<&Context> {
        match self.values.last() {
            Some(Arg::Context(ctx)) => Some(ctx),
            _ => None,
        }
    }

    /// Removes the output sink, leaving an empty one in its place.
    pub(crate) fn take_output(&mut self) -> Option<Output> {
        self.values.iter_mut().find_map(|arg| match arg {
            Arg::Output(output) => Some(std::mem::take(output)),
            _ => None,
        })
    }
}
