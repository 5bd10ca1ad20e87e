//! cmdcheck CLI - Functional testing for agent command specs
//!
//! This CLI lets command authors:
//! - List the commands found in a commands directory
//! - Preview the test suite generated for a command
//! - Run suites sequentially or on a worker pool and write a JSON report
//! - Inspect the effective configuration

use clap::{Parser, Subcommand};
use cmdcheck_harness::HarnessConfig;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{config, generate, list, run};
pub use error::{CliError, CliResult};

/// cmdcheck CLI application
#[derive(Parser)]
#[command(name = "cmdcheck")]
#[command(
    about = "cmdcheck - Functional tests for agent command specifications",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CMDCHECK_CONFIG", default_value = "cmdcheck.toml")]
    config: PathBuf,

    /// Commands directory (overrides the config file)
    #[arg(short = 'd', long, env = "CMDCHECK_COMMANDS_DIR")]
    commands_dir: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// List loaded commands
    List,

    /// Show the test suite generated for a command
    Generate {
        /// Command name, with or without a leading slash
        command: String,
    },

    /// Run functional tests
    Run(run::RunArgs),

    /// Show the effective configuration
    Config,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Logs go to stderr so JSON and YAML output stay parseable
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    let mut settings = HarnessConfig::load(&cli.config)?;
    if let Some(dir) = cli.commands_dir {
        settings.commands_dir = dir;
    }

    match cli.command {
        Commands::List => list::execute(&settings, cli.output),
        Commands::Generate { command } => generate::execute(&settings, &command, cli.output),
        Commands::Run(args) => run::execute(args, settings, cli.output),
        Commands::Config => config::execute(&settings, &cli.config, cli.output),
    }
}
