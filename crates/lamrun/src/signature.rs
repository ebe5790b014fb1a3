//! # Overload signatures
//!
//! Value-level description of what a handler overload accepts and returns.
//! Signatures are declared at registration time; nothing here inspects
//! compiled code.
//!
//! ## Shapes
//!
//! - **Stream**: `[InputStream, OutputStream]` with an optional trailing `Context`.
//! - **General**: up to two value parameters with an optional trailing `Context`.
//!
//! Anything else is not invocable and is excluded before ranking.

/// Scalar parameter types.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Bool,
    String,
}

/// Untyped JSON containers.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Collection {
    Map,
    List,
}

/// The kind of a single declared parameter.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ParameterKind {
    Context,
    InputStream,
    OutputStream,
    Primitive(Primitive),
    Collection(Collection),
    /// A registered record type, matched by exact name.
    Record(String),
}

impl ParameterKind {
    pub fn int() -> Self {
        Self::Primitive(Primitive::Int)
    }

    pub fn bool() -> Self {
        Self::Primitive(Primitive::Bool)
    }

    pub fn string() -> Self {
        Self::Primitive(Primitive::String)
    }

    pub fn map() -> Self {
        Self::Collection(Collection::Map)
    }

    pub fn list() -> Self {
        Self::Collection(Collection::List)
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::Record(name.into())
    }

    /// Handles are runtime objects with no data encoding.
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Context | Self::InputStream | Self::OutputStream)
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context => write!(f, "Context"),
            Self::InputStream => write!(f, "InputStream"),
            Self::OutputStream => write!(f, "OutputStream"),
            Self::Primitive(Primitive::Int) => write!(f, "int"),
            Self::Primitive(Primitive::Bool) => write!(f, "bool"),
            Self::Primitive(Primitive::String) => write!(f, "string"),
            Self::Collection(Collection::Map) => write!(f, "map"),
            Self::Collection(Collection::List) => write!(f, "list"),
            Self::Record(name) => write!(f, "{}", name),
        }
    }
}

/// What an overload hands back.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Value(ParameterKind),
}

impl ReturnKind {
    /// Whether the result encoder can turn this into bytes.
    pub fn is_serializable(&self) -> bool {
        match self {
            Self::Void => true,
            Self::Value(kind) => !kind.is_handle(),
        }
    }
}

impl std::fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Value(kind) => write!(f, "{}", kind),
        }
    }
}

/// Classification of a parameter sequence for eligibility purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Stream,
    General,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream => write!(f, "stream"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Why an overload was dropped before ranking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exclusion {
    /// A `Context` parameter appears somewhere other than last.
    ContextNotLast,
    /// The parameters fit neither the stream nor the general shape.
    UnsupportedShape,
    /// A record parameter names a type the registry does not know.
    UnknownRecord(String),
    /// The return kind cannot be serialized.
    ReturnType(ReturnKind),
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextNotLast => write!(f, "Context must be the last parameter"),
            Self::UnsupportedShape => write!(f, "parameters match neither the stream nor the general shape"),
            Self::UnknownRecord(name) => write!(f, "record type '{}' is not registered", name),
            Self::ReturnType(kind) => write!(f, "return type '{}' cannot be serialized", kind),
        }
    }
}

/// Maximum number of value parameters in the general shape.
pub const MAX_GENERAL_VALUES: usize = 2;

/// The type signature of a single overload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverloadSignature {
    pub params: Vec<ParameterKind>,
    pub returns: ReturnKind,
}

impl OverloadSignature {
    pub fn new(params: Vec<ParameterKind>, returns: ReturnKind) -> Self {
        Self { params, returns }
    }

    /// Shorthand for a signature returning nothing.
    pub fn void(params: Vec<ParameterKind>) -> Self {
        Self::new(params, ReturnKind::Void)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn ends_with_context(&self) -> bool {
        matches!(self.params.last(), Some(ParameterKind::Context))
    }

    /// Parameters excluding a trailing `Context`.
    pub fn value_params(&self) -> &[ParameterKind] {
        if self.ends_with_context() {
            &self.params[..self.params.len() - 1]
        } else {
            &self.params
        }
    }

    /// Classifies the parameter sequence, or reports why it is not invocable.
    pub fn shape(&self) -> Result<Shape, Exclusion> {
        let context_count = self.params.iter().filter(|p| **p == ParameterKind::Context).count();
        if context_count > 1 || (context_count == 1 && !self.ends_with_context()) {
            return Err(Exclusion::ContextNotLast);
        }

        let values = self.value_params();
        if let [ParameterKind::InputStream, ParameterKind::OutputStream] = values {
            return Ok(Shape::Stream);
        }

        let has_stream = values
            .iter()
            .any(|p| matches!(p, ParameterKind::InputStream | ParameterKind::OutputStream));
        if has_stream || values.len() > MAX_GENERAL_VALUES {
            return Err(Exclusion::UnsupportedShape);
        }

        Ok(Shape::General)
    }

    /// Record type names referenced by the parameters, in declaration order.
    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().filter_map(|p| match p {
            ParameterKind::Record(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl std::fmt::Display for OverloadSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ") -> {}", self.returns)
    }
}
