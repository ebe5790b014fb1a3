//! # Type Registry
//!
//! The registry is the source of truth for which handlers exist and what they
//! accept. Hosts populate it by explicit registration: a unit name, a method
//! name, the declared [`OverloadSignature`], and the callable. Record types used
//! as parameters are registered alongside, under their exact type name.
//!
//! Uses DashMap so registration and lookup need no global lock. Lookups clone
//! out an owned [`CandidateSet`], so every invocation works on its own copy.

use std::sync::Arc;

use dashmap::DashMap;

use crate::invoke::Handler;
use crate::signature::OverloadSignature;

/// Position of an overload in its unit's registration order.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OverloadId(pub usize);

impl std::fmt::Display for OverloadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overload-{}", self.0)
    }
}

/// One overload of a method: its signature and the callable behind it.
#[derive(Clone)]
pub struct Candidate {
    pub id: OverloadId,
    pub method: String,
    pub signature: OverloadSignature,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// All overloads sharing a method name, in registration order.
pub type CandidateSet = Vec<Candidate>;

/// Field types a record schema can declare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    String,
    List,
    Map,
    /// A nested registered record.
    Record(String),
    /// Any JSON value, taken as-is.
    Any,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::List => write!(f, "list"),
            Self::Map => write!(f, "map"),
            Self::Record(name) => write!(f, "{}", name),
            Self::Any => write!(f, "any"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
}

/// The named fields of a record parameter type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            kind,
        });
        self
    }
}

/// Read access to registered handlers and record types.
pub trait TypeRegistry: Send + Sync {
    /// All overloads of `unit::method`, in registration order. May be empty.
    fn lookup(&self, unit: &str, method: &str) -> CandidateSet;

    /// The schema registered under exactly `name`.
    fn record(&self, name: &str) -> Option<Arc<RecordSchema>>;
}

/// The default in-memory registry.
#[derive(Default)]
pub struct Registry {
    units: DashMap<String, Vec<Candidate>>,
    records: DashMap<String, Arc<RecordSchema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one overload of `unit::method` and returns its id.
    ///
    /// Signatures are not validated here; ineligible overloads are excluded
    /// when a call is resolved.
    pub fn register(
        &self,
        unit: impl Into<String>,
        method: impl Into<String>,
        signature: OverloadSignature,
        handler: impl Handler + 'static,
    ) -> OverloadId {
        let mut entry = self.units.entry(unit.into()).or_default();
        let id = OverloadId(entry.len());
        entry.push(Candidate {
            id,
            method: method.into(),
            signature,
            handler: Arc::new(handler),
        });
        id
    }

    /// Starts fluent registration of overloads under one unit.
    pub fn unit(&self, name: impl Into<String>) -> UnitBuilder<'_> {
        UnitBuilder {
            registry: self,
            unit: name.into(),
        }
    }

    /// Registers a record schema, replacing any schema of the same name.
    pub fn register_record(&self, schema: RecordSchema) {
        self.records.insert(schema.name.clone(), Arc::new(schema));
    }

    /// Number of overloads registered for a unit, across all methods.
    pub fn overload_count(&self, unit: &str) -> usize {
        self.units.get(unit).map(|entry| entry.len()).unwrap_or(0)
    }
}

/// Registers overloads of one unit in sequence.
///
/// ```rust,ignore
/// registry
///     .unit("example.Hello")
///     .overload("myHandlerInt", OverloadSignature::new(vec![int(), Context], string()), my_handler_int)
///     .overload("myHandlerString", OverloadSignature::new(vec![string(), Context], string()), my_handler_string);
/// ```
pub struct UnitBuilder<'a> {
    registry: &'a Registry,
    unit: String,
}

impl UnitBuilder<'_> {
    pub fn overload(self, method: impl Into<String>, signature: OverloadSignature, handler: impl Handler + 'static) -> Self {
        self.registry.register(self.unit.clone(), method, signature, handler);
        self
    }

    /// Registers a record type alongside the unit's overloads.
    pub fn record(self, schema: RecordSchema) -> Self {
        self.registry.register_record(schema);
        self
    }
}

impl TypeRegistry for Registry {
    fn lookup(&self, unit: &str, method: &str) -> CandidateSet {
        self.units
            .get(unit)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|c| c.method == method)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.records.get(name).map(|entry| Arc::clone(entry.value()))
    }
}
