use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Where log output goes and how much of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSettings<'a> {
    /// Explicit filter directive. `None` defers to RUST_LOG, then `info`.
    pub level: Option<&'a str>,
    /// Write to stderr. Command output owns stdout.
    pub stderr: bool,
    /// Also append to this file.
    pub file: Option<&'a Path>,
}

/// An explicit `level` wins over `env` (the RUST_LOG value). A bad RUST_LOG
/// falls back to `info`; a bad explicit level is an error.
fn make_filter(
    level: Option<&str>,
    env: Option<&str>,
) -> Result<EnvFilter> {
    match (level, env) {
        (Some(directive), _) => EnvFilter::try_new(directive)
            .map_err(|e| anyhow!("invalid log level '{directive}': {e}")),
        (None, Some(directive)) => {
            Ok(EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")))
        }
        (None, None) => Ok(EnvFilter::new("info")),
    }
}

fn build_subscriber(settings: &LogSettings<'_>) -> Result<impl Subscriber + Send + Sync + 'static> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = make_filter(settings.level, env.as_deref())?;

    let stderr_layer = settings.stderr.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_target(false)
            .without_time()
    });

    let file_layer = match settings.file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer))
}

/// Installs the global subscriber. Call once at startup.
pub fn init_logging(settings: &LogSettings<'_>) -> Result<()> {
    build_subscriber(settings)?
        .try_init()
        .context("logging already initialized")
}
