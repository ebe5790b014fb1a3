//! # Overload selector
//!
//! Picks exactly one overload out of a [`CandidateSet`]:
//!
//! 1. Drop overloads that fit neither shape, put `Context` anywhere but last,
//!    name an unregistered record type, or return something unserializable.
//! 2. Rank survivors by arity, largest first.
//! 3. At equal arity, an overload ending in `Context` ranks first.
//!
//! Overloads still tied after (2) and (3) keep registry order, so the winner is
//! deterministic for a given registration sequence. Which one wins is not part
//! of the contract.

use std::cmp::Reverse;

use tracing::debug;

use crate::descriptor::HandlerDescriptor;
use crate::registry::Candidate;
use crate::registry::CandidateSet;
use crate::registry::OverloadId;
use crate::registry::TypeRegistry;
use crate::signature::Exclusion;
use crate::signature::OverloadSignature;
use crate::signature::ParameterKind;
use crate::signature::Shape;

/// An overload dropped before ranking, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Excluded {
    pub id: OverloadId,
    pub signature: OverloadSignature,
    pub reason: Exclusion,
}

impl std::fmt::Display for Excluded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.id, self.signature, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No overload is left to call.
    NotFound {
        handler: HandlerDescriptor,
        excluded: Vec<Excluded>,
    },
    /// Every declared overload is malformed (`Context` not last).
    InvalidShape {
        handler: HandlerDescriptor,
        excluded: Vec<Excluded>,
    },
}

impl Error {
    pub fn excluded(&self) -> &[Excluded] {
        match self {
            Self::NotFound { excluded, .. } | Self::InvalidShape { excluded, .. } => excluded,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let excluded = match self {
            Self::NotFound { handler, excluded } => {
                write!(f, "handler '{}' not found", handler)?;
                excluded
            }
            Self::InvalidShape { handler, excluded } => {
                write!(f, "handler '{}' has no well-formed overload", handler)?;
                excluded
            }
        };
        for e in excluded {
            write!(f, "; {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// The overload chosen for one invocation.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub candidate: Candidate,
    pub shape: Shape,
    /// Whether a `Context` must be appended to the arguments.
    pub needs_context: bool,
}

impl Resolved {
    /// Parameters the payload is decoded into.
    pub fn positions(&self) -> &[ParameterKind] {
        self.candidate.signature.value_params()
    }
}

/// Selects the best overload of `handler` among `candidates`.
///
/// `registry` is consulted for record types named by the signatures.
pub fn select(
    handler: &HandlerDescriptor,
    candidates: CandidateSet,
    registry: &dyn TypeRegistry,
) -> Result<Resolved> {
    let mut excluded = Vec::new();
    let mut eligible = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match eligibility(&candidate.signature, registry) {
            Ok(shape) => eligible.push((candidate, shape)),
            Err(reason) => {
                debug!(%handler, id = %candidate.id, signature = %candidate.signature, %reason, "overload excluded");
                excluded.push(Excluded {
                    id: candidate.id,
                    signature: candidate.signature,
                    reason,
                });
            }
        }
    }

    rank(&mut eligible);

    let Some((candidate, shape)) = eligible.into_iter().next() else {
        let all_malformed = !excluded.is_empty()
            && excluded.iter().all(|e| e.reason == Exclusion::ContextNotLast);
        let handler = handler.clone();
        return Err(if all_malformed {
            Error::InvalidShape { handler, excluded }
        } else {
            Error::NotFound { handler, excluded }
        });
    };

    let needs_context = candidate.signature.ends_with_context();
    debug!(%handler, id = %candidate.id, signature = %candidate.signature, %shape, "overload selected");

    Ok(Resolved {
        candidate,
        shape,
        needs_context,
    })
}

/// Checks shape, record types and return type, in that order.
fn eligibility(signature: &OverloadSignature, registry: &dyn TypeRegistry) -> std::result::Result<Shape, Exclusion> {
    let shape = signature.shape()?;

    if let Some(name) = signature.record_names().find(|name| registry.record(name).is_none()) {
        return Err(Exclusion::UnknownRecord(name.to_string()));
    }

    if !signature.returns.is_serializable() {
        return Err(Exclusion::ReturnType(signature.returns.clone()));
    }

    Ok(shape)
}

/// Stable sort: arity descending, then trailing `Context` first.
fn rank(eligible: &mut [(Candidate, Shape)]) {
    eligible.sort_by_key(|(c, _)| (Reverse(c.signature.arity()), !c.signature.ends_with_context()));
}
