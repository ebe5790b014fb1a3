//! # Invoker
//!
//! Runs a handler with its decoded arguments and captures one of three
//! outcomes: a value, void completion, or a fault. Faults are errors returned
//! by the handler and panics raised inside it; both surface as
//! [`UserCodeError`] with the failing overload attached, and neither is ever
//! retried or reinterpreted.

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;

use serde::Serialize;
use serde_json::Value;

use crate::args::Args;
use crate::descriptor::HandlerDescriptor;
use crate::registry::Candidate;
use crate::registry::OverloadId;
use crate::signature::OverloadSignature;

/// What a handler hands back on success.
#[derive(Clone, Debug, PartialEq)]
pub enum Returned {
    Void,
    Value(Value),
}

impl Returned {
    /// Serializes any serde value as the return value.
    pub fn json<T: Serialize>(value: &T) -> anyhow::Result<Self> {
        Ok(Self::Value(serde_json::to_value(value)?))
    }
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// A user-supplied callable.
///
/// Implemented for every `Fn(&mut Args) -> anyhow::Result<Returned>` closure or
/// function that is `Send + Sync`.
pub trait Handler: Send + Sync {
    fn call(&self, args: &mut Args) -> anyhow::Result<Returned>;
}

impl<F> Handler for F
where
    F: Fn(&mut Args) -> anyhow::Result<Returned> + Send + Sync,
{
    fn call(&self, args: &mut Args) -> anyhow::Result<Returned> {
        self(args)
    }
}

/// How a handler faulted.
#[derive(Debug)]
pub enum Fault {
    /// The handler returned an error.
    Failed(anyhow::Error),
    /// The handler panicked; the payload message when it was a string.
    Panicked(String),
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "{:#}", e),
            Self::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// A fault raised by user code, tagged with the overload that raised it.
#[derive(Debug)]
pub struct UserCodeError {
    pub handler: HandlerDescriptor,
    pub id: OverloadId,
    pub signature: OverloadSignature,
    pub fault: Fault,
}

impl std::fmt::Display for UserCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler '{}' {} {} failed: {}", self.handler, self.id, self.signature, self.fault)
    }
}

impl std::error::Error for UserCodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.fault {
            Fault::Failed(e) => Some(&**e),
            Fault::Panicked(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UserCodeError>;

/// Calls the candidate's handler with `args`.
///
/// `args` stays owned by the caller so a stream handler's output can be
/// collected afterwards.
pub fn invoke(handler: &HandlerDescriptor, candidate: &Candidate, args: &mut Args) -> Result<Returned> {
    let outcome = catch_unwind(AssertUnwindSafe(|| candidate.handler.call(args)));

    let fault = match outcome {
        Ok(Ok(returned)) => return Ok(returned),
        Ok(Err(e)) => Fault::Failed(e),
        Err(panic) => Fault::Panicked(panic_message(panic.as_ref())),
    };

    Err(UserCodeError {
        handler: handler.clone(),
        id: candidate.id,
        signature: candidate.signature.clone(),
        fault,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
