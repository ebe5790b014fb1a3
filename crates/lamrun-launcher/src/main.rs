//! Runs one handler invocation from the environment.
//!
//! ```text
//! PAYLOAD_FILE=payload.json lamrun-launcher example.Hello::myHandlerPOJO
//! ```
//!
//! The response body goes to stdout, logs go to stderr (filtered by `RUST_LOG`).

mod hello;

use std::process::ExitCode;
use std::sync::Arc;

use lamrun::Engine;
use lamrun::Registry;
use lamrun::launcher;
use lamrun::launcher::LaunchConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(handler) = std::env::args().nth(1) else {
        error!("usage: lamrun-launcher <unit>::<method>");
        return ExitCode::FAILURE;
    };

    let registry = Registry::new();
    hello::register(&registry);

    let config = LaunchConfig::from_env();
    let engine = Engine::builder()
        .registry(Arc::new(registry))
        .context_provider(config.context_provider())
        .build();

    let stdout = std::io::stdout();
    launcher::run(&engine, &handler, &config, &mut stdout.lock())
}
