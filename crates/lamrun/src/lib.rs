//! # lamrun
//!
//! Overload resolution and invocation for function handlers.
//!
//! ## Architecture
//!
//! A host registers handlers under a unit name and a method name, each with a
//! declared parameter list. Given a handler identifier and a raw payload, the
//! engine:
//!
//! - **Selects** one overload out of those registered for the method
//! - **Decodes** the payload into that overload's parameters
//! - **Injects** a per-call [`Context`] when the overload asks for one
//! - **Invokes** the handler, turning errors and panics into user-code faults
//! - **Encodes** what the handler returned into a response body
//!
//! ## Overload shapes
//!
//! - **Stream**: `(InputStream, OutputStream[, Context])`, the handler reads
//!   the raw payload and writes the raw response
//! - **General**: up to two values (`int`, `bool`, `string`, `map`, `list` or
//!   a registered record) plus an optional trailing `Context`
//!
//! Larger arities win, and at equal arity an overload ending in `Context` wins.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use lamrun::{Args, Engine, OverloadSignature, ParameterKind, Registry, ReturnKind, Returned};
//!
//! # fn example() -> anyhow::Result<()> {
//! let registry = Registry::new();
//! registry.unit("example.Hello").overload(
//!     "myHandler",
//!     OverloadSignature::new(vec![ParameterKind::int(), ParameterKind::Context], ReturnKind::Value(ParameterKind::string())),
//!     |args: &mut Args| -> anyhow::Result<Returned> { Ok(serde_json::json!(args.int(0)?.to_string()).into()) },
//! );
//!
//! let engine = Engine::builder().registry(Arc::new(registry)).build();
//! let outcome = engine.invoke("example.Hello::myHandler", "42")?;
//! assert_eq!(outcome.body(), Some(&b"\"42\""[..]));
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod codec;
pub mod context;
pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod engine;
pub mod error;
pub mod invoke;
pub mod launcher;
pub mod payload;
pub mod registry;
pub mod select;
pub mod signature;

pub use args::Arg;
pub use args::Args;
pub use args::Input;
pub use args::Output;
pub use args::Record;
pub use codec::Codec;
pub use codec::CodecConfig;
pub use context::Context;
pub use context::ContextBuilder;
pub use context::ContextConfig;
pub use context::ContextProvider;
pub use context::EnvContextProvider;
pub use descriptor::HandlerDescriptor;
pub use engine::Engine;
pub use engine::EngineBuilder;
pub use engine::Outcome;
pub use error::Error;
pub use error::ErrorKind;
pub use invoke::Handler;
pub use invoke::Returned;
pub use payload::Payload;
pub use payload::PayloadTag;
pub use registry::FieldKind;
pub use registry::OverloadId;
pub use registry::RecordSchema;
pub use registry::Registry;
pub use registry::TypeRegistry;
pub use signature::OverloadSignature;
pub use signature::ParameterKind;
pub use signature::ReturnKind;
pub use signature::Shape;
