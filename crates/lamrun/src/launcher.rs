//! # Launcher harness
//!
//! Process-level glue for running one invocation from the environment: find
//! the payload file, run the handler, write the body, and turn the result into
//! an exit status. The engine itself never reads the environment or exits.

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::context::ContextConfig;
use crate::context::EnvContextProvider;
use crate::engine::Engine;
use crate::engine::Outcome;
use crate::payload::Payload;

/// Environment variable naming the file that holds the request payload.
pub const PAYLOAD_FILE_VAR: &str = "PAYLOAD_FILE";

/// Everything a launch reads from the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    pub payload_file: Option<PathBuf>,
    pub context: ContextConfig,
}

impl LaunchConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let payload_file = lookup(PAYLOAD_FILE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self {
            payload_file,
            context: ContextConfig::from_lookup(lookup),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// A context provider built from this configuration.
    pub fn context_provider(&self) -> EnvContextProvider {
        EnvContextProvider::new(self.context.clone())
    }
}

/// Reads the payload named by the configuration.
///
/// An unset variable or an unreadable file yields an empty payload.
pub fn read_payload(config: &LaunchConfig) -> Payload {
    let Some(path) = &config.payload_file else {
        warn!("{} is not set, using an empty payload", PAYLOAD_FILE_VAR);
        return Payload::empty();
    };
    read_file(path)
}

fn read_file(path: &Path) -> Payload {
    match std::fs::read(path) {
        Ok(bytes) => Payload::new(bytes),
        Err(e) => {
            warn!(path = %path.display(), "could not read payload file, using an empty payload: {}", e);
            Payload::empty()
        }
    }
}

/// Runs `handler` once and writes its body to `out`.
pub fn run(engine: &Engine, handler: &str, config: &LaunchConfig, out: &mut impl Write) -> ExitCode {
    let payload = read_payload(config);
    info!(handler, bytes = payload.len(), "launching");

    let outcome = match engine.invoke(handler, payload) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(handler, kind = %e.kind(), "{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Outcome::Body(body) = outcome {
        if let Err(e) = out.write_all(&body).and_then(|_| out.flush()) {
            error!(handler, "could not write response body: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::bail;
    use serde_json::json;
    use tempfile::NamedTempFile;

    use crate::args::Args;
    use crate::invoke::Returned;
    use crate::registry::Registry;
    use crate::signature::OverloadSignature;
    use crate::signature::ParameterKind;
    use crate::signature::ReturnKind;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    fn engine() -> Engine {
        let registry = Registry::new();
        registry
            .unit("example.Hello")
            .overload(
                "double",
                OverloadSignature::new(vec![ParameterKind::int()], ReturnKind::Value(ParameterKind::int())),
                |args: &mut Args| -> anyhow::Result<Returned> { Ok(json!(args.int(0)? * 2).into()) },
            )
            .overload("fail", OverloadSignature::void(vec![]), |_: &mut Args| -> anyhow::Result<Returned> {
                bail!("always fails")
            });
        Engine::builder().registry(Arc::new(registry)).build()
    }

    fn payload_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_from_lookup() {
        let config = LaunchConfig::from_lookup(lookup(&[
            ("PAYLOAD_FILE", "/tmp/payload.json"),
            ("TASK_TIMEOUT", "30"),
            ("TASK_MAXRAM", "512m"),
        ]));
        assert_eq!(config.payload_file, Some(PathBuf::from("/tmp/payload.json")));
        assert_eq!(config.context.timeout, Duration::from_secs(30));
        assert_eq!(config.context.memory_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn test_missing_payload_is_empty() {
        assert!(read_payload(&LaunchConfig::default()).is_empty());

        let config = LaunchConfig {
            payload_file: Some(PathBuf::from("/nonexistent/lamrun/payload")),
            ..Default::default()
        };
        assert!(read_payload(&config).is_empty());
    }

    #[test]
    fn test_run_writes_body() {
        let file = payload_file("21");
        let config = LaunchConfig {
            payload_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let mut out = Vec::new();
        let code = run(&engine(), "example.Hello::double", &config, &mut out);
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(out, b"42");
    }

    #[test]
    fn test_run_failure_exit_code() {
        let mut out = Vec::new();
        let code = run(&engine(), "example.Hello::fail", &LaunchConfig::default(), &mut out);
        assert_eq!(code, ExitCode::FAILURE);
        assert!(out.is_empty());

        let code = run(&engine(), "example.Hello::missing", &LaunchConfig::default(), &mut out);
        assert_eq!(code, ExitCode::FAILURE);
    }
}
