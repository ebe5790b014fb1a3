//! # Engine
//!
//! Ties the pipeline together for one call:
//!
//! ```text
//! descriptor -> lookup -> select -> decode -> inject context -> invoke -> encode
//! ```
//!
//! The engine holds no per-call state. Every invocation fetches its own
//! candidate set, decodes into its own [`Args`], and asks the context provider
//! for a fresh [`Context`](crate::context::Context), so one `Engine` can be
//! shared across threads behind an `Arc`.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::args::Arg;
use crate::codec::Codec;
use crate::codec::CodecConfig;
use crate::context::ContextProvider;
use crate::context::EnvContextProvider;
use crate::decode::decode;
use crate::descriptor::HandlerDescriptor;
use crate::encode::encode;
use crate::error::Result;
use crate::invoke::invoke;
use crate::payload::Payload;
use crate::registry::Registry;
use crate::registry::TypeRegistry;
use crate::select::select;

pub use crate::encode::Outcome;

/// Resolves and runs handlers against payloads.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<dyn TypeRegistry>,
    provider: Arc<dyn ContextProvider>,
    codec: Codec,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn registry(&self) -> &dyn TypeRegistry {
        self.registry.as_ref()
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Invokes the handler named by `handler` (`unit::method`) with `payload`.
    pub fn invoke(&self, handler: &str, payload: impl Into<Payload>) -> Result<Outcome> {
        let descriptor = HandlerDescriptor::parse(handler)?;
        self.invoke_descriptor(&descriptor, payload.into())
    }

    /// Invokes an already parsed handler descriptor.
    pub fn invoke_descriptor(&self, handler: &HandlerDescriptor, payload: Payload) -> Result<Outcome> {
        let started = Instant::now();
        let result = self.run(handler, &payload);

        match &result {
            Ok(_) => info!(%handler, elapsed = ?started.elapsed(), "invocation complete"),
            Err(e) => warn!(%handler, kind = %e.kind(), elapsed = ?started.elapsed(), "invocation failed: {}", e),
        }

        result
    }

    fn run(&self, handler: &HandlerDescriptor, payload: &Payload) -> Result<Outcome> {
        let candidates = self.registry.lookup(&handler.unit, &handler.method);
        debug!(%handler, candidates = candidates.len(), tag = ?payload.tag(), "resolving");

        let resolved = select(handler, candidates, self.registry.as_ref())?;

        let mut args = decode(
            &self.codec,
            self.registry.as_ref(),
            resolved.shape,
            resolved.positions(),
            payload,
        )?;

        if resolved.needs_context {
            args.push(Arg::Context(self.provider.current()));
        }

        let returned = invoke(handler, &resolved.candidate, &mut args)?;
        let output = args.take_output();

        Ok(encode(
            &self.codec,
            resolved.shape,
            &resolved.candidate.signature.returns,
            returned,
            output,
        )?)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("codec", &self.codec).finish_non_exhaustive()
    }
}

/// Fluent builder for [`Engine`].
///
/// Defaults: an empty [`Registry`], an [`EnvContextProvider`] with default
/// settings, and the default [`CodecConfig`].
pub struct EngineBuilder {
    registry: Option<Arc<dyn TypeRegistry>>,
    provider: Option<Arc<dyn ContextProvider>>,
    codec: CodecConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            provider: None,
            codec: CodecConfig::default(),
        }
    }

    /// Sets the registry handlers are resolved against.
    pub fn registry(mut self, registry: Arc<dyn TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets where per-call contexts come from.
    pub fn context_provider(mut self, provider: impl ContextProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn codec(mut self, config: CodecConfig) -> Self {
        self.codec = config;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            registry: self.registry.unwrap_or_else(|| Arc::new(Registry::new())),
            provider: self
                .provider
                .unwrap_or_else(|| Arc::new(EnvContextProvider::default())),
            codec: Codec::new(self.codec),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use crate::args::Args;
    use crate::context::Context;
    use crate::error::ErrorKind;
    use crate::invoke::Returned;
    use crate::signature::OverloadSignature;
    use crate::signature::ParameterKind;
    use crate::signature::ReturnKind;

    fn engine(registry: Registry) -> Engine {
        Engine::builder()
            .registry(Arc::new(registry))
            .context_provider(|| Context::builder().function_name("test-fn").request_id("req-1").build())
            .build()
    }

    #[test]
    fn test_invokes_with_context() {
        let registry = Registry::new();
        registry.register(
            "u",
            "h",
            OverloadSignature::new(vec![ParameterKind::int(), ParameterKind::Context], ReturnKind::Value(ParameterKind::string())),
            |args: &mut Args| -> anyhow::Result<Returned> {
                let ctx = args.context().map(|c| c.function_name().to_string()).unwrap_or_default();
                Ok(json!(format!("{}:{}", ctx, args.int(0)?)).into())
            },
        );

        let out = engine(registry).invoke("u::h", "7").unwrap();
        assert_eq!(out.body(), Some(&b"\"test-fn:7\""[..]));
    }

    #[test]
    fn test_context_not_injected_when_undeclared() {
        let registry = Registry::new();
        registry.register(
            "u",
            "h",
            OverloadSignature::void(vec![ParameterKind::int()]),
            |args: &mut Args| -> anyhow::Result<Returned> {
                assert_eq!(args.len(), 1);
                assert!(args.context().is_none());
                Ok(Returned::Void)
            },
        );

        assert_eq!(engine(registry).invoke("u::h", "1").unwrap(), Outcome::Void);
    }

    #[test]
    fn test_bad_descriptor() {
        let err = engine(Registry::new()).invoke("no-separator", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
        assert!(err.is_rejection());
    }

    #[test]
    fn test_decode_failure_skips_handler() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let registry = Registry::new();
        registry.register(
            "u",
            "h",
            OverloadSignature::void(vec![ParameterKind::int()]),
            |_: &mut Args| -> anyhow::Result<Returned> {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Returned::Void)
            },
        );

        let err = engine(registry).invoke("u::h", "abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_unit_not_found() {
        let err = engine(Registry::new()).invoke("missing.Unit::h", "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
