//! Devstack - local development stack control
//!
//! This is the main CLI entry point for devstack.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use devstack::compose::DockerCompose;
use devstack::error::Result;
use devstack::{LogTarget, RunReport, Stack, StackConfig, Verb};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Devstack - control the database, product and sales compose stack
#[derive(Parser)]
#[command(name = "devstack")]
#[command(version)]
#[command(about = "Start, stop, rebuild and inspect the local compose stack", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Stack config file (defaults to ./devstack.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Compose project name
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Seconds to wait after starting the database
    #[arg(long, global = true, value_name = "SECS")]
    db_wait: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the database, then the product and sales services
    Start,

    /// Stop all sections and remove orphan containers
    Stop,

    /// Stop, then start
    Restart,

    /// Show container status for every section
    Status,

    /// Follow logs
    Logs {
        /// Section to follow: db, product, sales or all
        service: Option<String>,
    },

    /// Rebuild images (product and sales without cache)
    Rebuild,

    /// Rebuild, then start
    #[command(name = "rebuild-start")]
    RebuildStart,
}

impl Commands {
    fn into_verb(self) -> Result<Verb> {
        Ok(match self {
            Commands::Start => Verb::Start,
            Commands::Stop => Verb::Stop,
            Commands::Restart => Verb::Restart,
            Commands::Status => Verb::Status,
            Commands::Logs { service } => Verb::Logs(LogTarget::parse(service.as_deref())?),
            Commands::Rebuild => Verb::Rebuild,
            Commands::RebuildStart => Verb::RebuildStart,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::FAILURE,
                _ => {
                    // The short clap error names no verbs
                    eprintln!();
                    eprintln!("{}", Cli::command().render_help());
                    ExitCode::FAILURE
                }
            };
        }
    };

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    match run(cli).await {
        Ok(report) => {
            if !report.is_clean() {
                tracing::warn!(
                    "{} of {} compose calls did not succeed",
                    report.failures().count(),
                    report.steps.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let verb = cli.command.into_verb()?;

    let working_dir = std::env::current_dir()?;
    let mut config = StackConfig::resolve(cli.config.as_deref(), &working_dir)?;

    if let Some(project) = cli.project {
        config.project_name = project;
    }
    if let Some(secs) = cli.db_wait {
        config.database_wait_secs = secs;
    }
    config.validate()?;

    let runner = Arc::new(DockerCompose::new(&config.runtime_command));
    let stack = Stack::new(config, runner);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    stack.dispatch(verb, shutdown).await
}
