use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use tax_cli::app::{self, ReturnInput, SubmitTarget};
use tax_cli::config::{CliConfig, DEFAULT_CONFIG_FILE};
use tax_cli::logging::{self, LogSettings};
use tax_core::validation::format_ssn;
use tax_core::{Credentials, Session, TaxApi};

const PASSWORD_ENV: &str = "TAX_FILER_PASSWORD";

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Filing status entry for a tax return.
///
/// Talks to the configured tax-filing service (or the built-in `memory`
/// backend), validates filing status details and saves them on a return.
#[derive(Debug, Parser)]
struct Cli {
    /// Configuration file. Defaults to `tax-filer.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API backend (`http` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Backend endpoint: a base URL for `http`, a deduction CSV for `memory`.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Account name used to log in.
    #[arg(long, global = true)]
    username: Option<String>,

    /// Log filter, e.g. `debug` or `tax_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Suppress log output on stderr.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List filing statuses with their standard deduction.
    Statuses {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Format a spouse SSN the way the form does while typing.
    FormatSsn { raw: String },
    /// Check a filing status JSON file and print field errors.
    Validate { file: PathBuf },
    /// Validate a JSON file and save it as a new or existing return.
    Submit {
        file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
        /// Update this return instead of creating one. Without `--year` the
        /// return keeps its stored year.
        #[arg(long)]
        return_id: Option<i64>,
    },
    /// List saved returns.
    Returns {
        #[arg(long)]
        year: Option<i32>,
    },
}

// ─── configuration ───────────────────────────────────────────────────────────

fn load_config(cli: &Cli) -> anyhow::Result<CliConfig> {
    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path, true)?,
        None => CliConfig::load(&PathBuf::from(DEFAULT_CONFIG_FILE), false)?,
    };

    if let Some(backend) = &cli.backend {
        config.api.backend = backend.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.api.endpoint = endpoint.clone();
    }
    if let Some(username) = &cli.username {
        config.credentials.username = Some(username.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    if let Some(path) = &cli.log_file {
        config.log_file = Some(path.clone());
    }
    Ok(config)
}

fn credentials(config: &CliConfig) -> Credentials {
    let password = std::env::var(PASSWORD_ENV)
        .ok()
        .or_else(|| config.credentials.password.clone())
        .unwrap_or_default();

    Credentials {
        username: config.credentials.username.clone().unwrap_or_default(),
        password,
    }
}

async fn connect(config: &CliConfig) -> anyhow::Result<(Box<dyn TaxApi>, Session)> {
    debug!(backend = %config.api.backend, "connecting");
    let registry = app::build_registry();
    let api = registry.create(&config.api).await?;
    let session = app::login(api.as_ref(), &credentials(config)).await?;
    Ok((api, session))
}

async fn disconnect(
    api: &dyn TaxApi,
    mut session: Session,
) {
    if let Err(e) = api.logout(&mut session).await {
        warn!(error = %e, "logout failed");
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    logging::init_logging(&LogSettings {
        level: config.log_level.as_deref(),
        stderr: !cli.quiet,
        file: config.log_file.as_deref(),
    })?;
    debug!(backend = %config.api.backend, tax_year = config.tax_year, "configuration loaded");

    let mut out = io::stdout().lock();

    match cli.command {
        Command::FormatSsn { raw } => {
            writeln!(out, "{}", format_ssn(&raw))?;
        }
        Command::Validate { file } => {
            if !app::validate_file(&file, &mut out)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Statuses { year } => {
            let (api, mut session) = connect(&config).await?;
            let result =
                app::print_statuses(api.as_ref(), &mut session, year.unwrap_or(config.tax_year), &mut out)
                    .await;
            disconnect(api.as_ref(), session).await;
            result?;
        }
        Command::Submit {
            file,
            year,
            return_id,
        } => {
            let input = ReturnInput::from_file(&file)?;
            let target = match return_id {
                Some(id) => SubmitTarget::Update { id, tax_year: year },
                None => SubmitTarget::Create {
                    tax_year: year.unwrap_or(config.tax_year),
                },
            };
            let (api, mut session) = connect(&config).await?;
            let result = app::submit_return(api.as_ref(), &mut session, &input, target, &mut out).await;
            disconnect(api.as_ref(), session).await;
            result.with_context(|| format!("Failed to submit {}", file.display()))?;
        }
        Command::Returns { year } => {
            let (api, mut session) = connect(&config).await?;
            let result = app::print_returns(api.as_ref(), &mut session, year, &mut out).await;
            disconnect(api.as_ref(), session).await;
            result?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
