//! # Handler descriptors
//!
//! A handler is addressed as `<unit>::<method>`, e.g. `example.Hello::myHandler`.
//! The unit names the registered compilation unit, the method names the family
//! of overloads to resolve within it.

use std::str::FromStr;

const SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The identifier has no `::` separator.
    MissingSeparator(String),
    /// The unit half is empty.
    EmptyUnit(String),
    /// The method half is empty.
    EmptyMethod(String),
    /// The method half contains another `::`.
    TrailingSegment(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSeparator(raw) => write!(f, "handler '{}' is not of the form 'unit::method'", raw),
            Self::EmptyUnit(raw) => write!(f, "handler '{}' names no unit", raw),
            Self::EmptyMethod(raw) => write!(f, "handler '{}' names no method", raw),
            Self::TrailingSegment(raw) => write!(f, "handler '{}' has more than one '::' separator", raw),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the family of overloads to resolve.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct HandlerDescriptor {
    pub unit: String,
    pub method: String,
}

impl HandlerDescriptor {
    pub fn new(unit: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            method: method.into(),
        }
    }

    /// Parses `<unit>::<method>`. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (unit, method) = trimmed
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::MissingSeparator(raw.to_string()))?;

        if unit.is_empty() {
            return Err(Error::EmptyUnit(raw.to_string()));
        }
        if method.is_empty() {
            return Err(Error::EmptyMethod(raw.to_string()));
        }
        if method.contains(SEPARATOR) {
            return Err(Error::TrailingSegment(raw.to_string()));
        }

        Ok(Self::new(unit, method))
    }
}

impl FromStr for HandlerDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.unit, SEPARATOR, self.method)
    }
}
