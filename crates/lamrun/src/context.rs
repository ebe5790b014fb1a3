//! # Invocation context
//!
//! A [`Context`] is the read-only metadata a handler may ask for as its last
//! parameter: who it is, which request it serves, and how much time and memory
//! it was granted. The engine only decides *whether* a handler needs one; the
//! values always come from a [`ContextProvider`].

use std::time::Duration;
use std::time::Instant;

use uuid::Uuid;

/// Default function version when none is configured.
pub const DEFAULT_VERSION: &str = "$LATEST";
/// Default time budget granted to one invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);
/// Default memory budget, in bytes.
pub const DEFAULT_MEMORY_BYTES: u64 = 300 * 1024 * 1024;
/// Largest accepted time budget. Longer configured timeouts fall back to
/// [`DEFAULT_TIMEOUT`].
pub const MAX_TIMEOUT: Duration = Duration::from_secs(i32::MAX as u64);

/// Per-invocation metadata handed to handlers.
///
/// Cheap to clone. Every invocation receives its own instance.
#[derive(Clone, Debug)]
pub struct Context {
    function_name: String,
    function_version: String,
    request_id: String,
    deadline: Instant,
    memory_limit_mb: u64,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn function_version(&self) -> &str {
        &self.function_version
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, saturating at zero.
    ///
    /// Informational only: nothing interrupts a handler that overruns it.
    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn memory_limit_mb(&self) -> u64 {
        self.memory_limit_mb
    }
}

/// Fluent builder for [`Context`] values.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    function_name: String,
    function_version: String,
    request_id: Option<String>,
    timeout: Duration,
    memory_limit_mb: u64,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            function_name: String::new(),
            function_version: DEFAULT_VERSION.to_string(),
            request_id: None,
            timeout: DEFAULT_TIMEOUT,
            memory_limit_mb: DEFAULT_MEMORY_BYTES / 1024 / 1024,
        }
    }

    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    pub fn function_version(mut self, version: impl Into<String>) -> Self {
        self.function_version = version.into();
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn memory_limit_mb(mut self, mb: u64) -> Self {
        self.memory_limit_mb = mb;
        self
    }

    /// Builds a context whose deadline starts counting now.
    ///
    /// A fresh random request id is generated when none was set.
    pub fn build(self) -> Context {
        Context {
            function_name: self.function_name,
            function_version: self.function_version,
            request_id: self.request_id.unwrap_or_else(random_request_id),
            deadline: deadline_after(self.timeout),
            memory_limit_mb: self.memory_limit_mb,
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Supplies one fresh [`Context`] per call.
pub trait ContextProvider: Send + Sync {
    fn current(&self) -> Context;
}

impl<F> ContextProvider for F
where
    F: Fn() -> Context + Send + Sync,
{
    fn current(&self) -> Context {
        self()
    }
}

/// Context settings read from the process environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextConfig {
    pub function_name: String,
    pub function_version: String,
    /// Fixed request id; `None` means a random id per invocation.
    pub request_id: Option<String>,
    pub timeout: Duration,
    pub memory_bytes: u64,
}

impl ContextConfig {
    /// Reads `AWS_LAMBDA_FUNCTION_NAME`, `AWS_LAMBDA_FUNCTION_VERSION`,
    /// `TASK_ID`, `TASK_TIMEOUT` and `TASK_MAXRAM` through `lookup`.
    ///
    /// Missing or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = lookup("TASK_TIMEOUT")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .filter(|timeout| *timeout <= MAX_TIMEOUT)
            .unwrap_or(DEFAULT_TIMEOUT);

        let memory_bytes = lookup("TASK_MAXRAM")
            .and_then(|s| parse_memory(&s))
            .unwrap_or(DEFAULT_MEMORY_BYTES);

        Self {
            function_name: lookup("AWS_LAMBDA_FUNCTION_NAME").unwrap_or_default(),
            function_version: lookup("AWS_LAMBDA_FUNCTION_VERSION")
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            request_id: lookup("TASK_ID").filter(|id| !id.is_empty()),
            timeout,
            memory_bytes,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Parses a memory size: plain bytes, or a number with a `b`, `k`, `m` or `g`
/// suffix (powers of 1024).
pub fn parse_memory(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let last = raw.chars().last()?;

    if last.is_ascii_digit() {
        return raw.parse().ok();
    }

    let multiplier: u64 = match last.to_ascii_lowercase() {
        'b' => 1,
        'k' => 1024,
        'm' => 1024 * 1024,
        'g' => 1024 * 1024 * 1024,
        _ => return None,
    };

    let value: u64 = raw[..raw.len() - last.len_utf8()].trim().parse().ok()?;
    value.checked_mul(multiplier)
}

/// Builds contexts from a [`ContextConfig`] snapshot.
#[derive(Clone, Debug, Default)]
pub struct EnvContextProvider {
    config: ContextConfig,
}

impl EnvContextProvider {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(ContextConfig::from_env())
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }
}

impl ContextProvider for EnvContextProvider {
    fn current(&self) -> Context {
        let mut builder = ContextBuilder::new()
            .function_name(self.config.function_name.clone())
            .function_version(self.config.function_version.clone())
            .timeout(self.config.timeout)
            .memory_limit_mb(self.config.memory_bytes / 1024 / 1024);

        if let Some(id) = &self.config.request_id {
            builder = builder.request_id(id.clone());
        }

        builder.build()
    }
}

fn random_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// `now + timeout`, capped at [`MAX_TIMEOUT`] when the sum does not fit.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(MAX_TIMEOUT))
        .unwrap_or(now)
}
