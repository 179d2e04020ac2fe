//! Cogsbook settlement preview CLI
//!
//! Reads a JSON run file, previews the COGS and P&L journals for every
//! invoice in it, and prints the results.

mod report;
mod run_file;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cogsbook_core::SettlementProcessor;
use cogsbook_core::settlement::{InMemoryProcessedStore, ProcessedStore};
use cogsbook_shared::{AppConfig, AppError, LoggingConfig};

use report::{InvoiceReport, render_text};
use run_file::RunFile;

/// Exit code when every invoice previewed but at least one cannot be posted.
const EXIT_BLOCKED: u8 = 2;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// Human-readable summary
    Text,
}

/// Preview settlement journals from a run file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The JSON run file to preview
    #[arg(value_name = "RUN_FILE")]
    file: PathBuf,

    /// Configuration file, instead of config/default and config/{RUN_MODE}
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| logging.filter.clone().into());
    // Logs go to stderr so stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, AppError> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
            Ok(AppConfig::from_toml_str(&raw)?)
        }
        None => Ok(AppConfig::load()?),
    }
}

fn run(args: &Args, config: AppConfig) -> anyhow::Result<bool> {
    let run = RunFile::read(&args.file)?;
    info!(
        file = %args.file.display(),
        invoices = run.invoices.len(),
        accounts = run.chart.len(),
        "run file loaded"
    );

    let store = InMemoryProcessedStore::new();
    for (invoice_id, hash) in &run.posted {
        store.record(invoice_id, hash)?;
    }

    let processor = SettlementProcessor::new(
        config.accounts,
        config.processing,
        Arc::new(run.brands.clone()),
        Arc::new(store),
    );
    let jobs = run.jobs();
    let reports: Vec<InvoiceReport> = processor
        .preview_batch(&jobs, &run.history, &run.chart)
        .into_iter()
        .zip(&jobs)
        .map(|(result, job)| InvoiceReport::new(&job.input.invoice_id, result))
        .collect();

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&reports)?,
        OutputFormat::Text => render_text(&reports),
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").context("Failed to write output")?;

    Ok(reports.iter().all(InvoiceReport::is_postable))
}

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match load_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("cogsbook: {err}");
            return ExitCode::from(err.exit_code());
        }
    };
    init_tracing(&config.logging);

    match run(&args, config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_BLOCKED),
        Err(err) => {
            error!(error = %err, "preview failed");
            let code = err
                .downcast_ref::<AppError>()
                .map_or(1, AppError::exit_code);
            ExitCode::from(code)
        }
    }
}
