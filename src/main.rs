use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use automark::config::{LogFormat, LoggingConfig};
use automark::{Config, ConfigError, TaggedValue, TaskKind, TestBundle, ValueCodec, outputs_match};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error reading '{0}': {1}")]
    Io(String, io::Error),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Invalid tagged value in '{0}': {1}")]
    TaggedValue(String, serde_json::Error),

    #[error("Invalid log filter: {0}")]
    LogFilter(String),

    #[error(transparent)]
    Automark(#[from] automark::Error),
}

/// Task kind selector for `compare`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Standard,
    SqlQuery,
    MapReduce,
    PartitionedCollection,
    PartitionedTable,
}

impl From<KindArg> for TaskKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Standard => TaskKind::Standard,
            KindArg::SqlQuery => TaskKind::SqlQuery,
            KindArg::MapReduce => TaskKind::MapReduce,
            KindArg::PartitionedCollection => TaskKind::PartitionedCollection,
            KindArg::PartitionedTable => TaskKind::PartitionedTable,
        }
    }
}

#[derive(Parser)]
#[command(name = "automark")]
#[command(about = "Inspect grading test bundles and compare tagged answers")]
struct Cli {
    /// Path to the configuration file (defaults apply when absent)
    #[arg(short, long, global = true, env = "AUTOMARK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the functions in a test bundle with their task kinds and case counts
    Inspect {
        /// Bundle to read (defaults to the configured test path)
        #[arg(short, long)]
        bundle: Option<PathBuf>,
    },

    /// Compare an actual tagged value against an expected one
    Compare {
        /// Task kind that decides the comparison rule
        #[arg(short, long, value_enum, default_value = "standard")]
        kind: KindArg,

        /// File holding the expected tagged value (JSON)
        #[arg(short, long)]
        expected: PathBuf,

        /// File holding the actual tagged value (JSON)
        #[arg(short, long)]
        actual: PathBuf,
    },
}

fn main() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Inspect { bundle } => {
            let path = bundle.unwrap_or_else(|| config.test_path.clone());
            let bundle = TestBundle::from_file(&path)?;
            tracing::info!(path = %path.display(), functions = bundle.len(), "loaded bundle");

            let width = bundle.functions().map(str::len).max().unwrap_or(0).max(8);
            println!("{:<width$}  {:<22}  CASES", "FUNCTION", "KIND", width = width);
            for (name, case) in bundle.iter() {
                println!(
                    "{:<width$}  {:<22}  {}",
                    name,
                    case.task_kind,
                    case.len(),
                    width = width
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare {
            kind,
            expected,
            actual,
        } => {
            let kind = TaskKind::from(kind);
            let expected = read_tagged(&expected)?;
            let actual_tagged = read_tagged(&actual)?;

            let codec = ValueCodec::local();
            let actual = codec.decode(&actual_tagged).map_err(automark::Error::from)?;
            let matched = outputs_match(kind, &expected, &actual, &codec)?;
            tracing::debug!(%kind, matched, "compared outputs");

            if matched {
                println!("match");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("mismatch");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn read_tagged(path: &Path) -> Result<TaggedValue, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Io(path.display().to_string(), e))?;
    TaggedValue::from_json_str(&text)
        .map_err(|e| AppError::TaggedValue(path.display().to_string(), e))
}

/// Install the stderr subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| AppError::LogFilter(e.to_string()))?,
    };

    match config.format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(io::IsTerminal::is_terminal(&io::stderr()))
                .with_writer(io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
    Ok(())
}
