mod commands;
mod config;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::executions::ExecutionsCommand;
use commands::nodes::NodesCommand;
use commands::workflows::WorkflowsCommand;
use config::{ConnectionArgs, Settings};
use flowdesk_api::ApiClient;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Operator console for workflows on a remote automation server
#[derive(Parser)]
#[command(name = "flowdesk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./flowdesk.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for JSON log files (default: ./logs)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List, inspect and change workflows
    Workflows {
        #[command(subcommand)]
        command: WorkflowsCommand,
    },
    /// Inspect and edit a workflow's nodes
    Nodes {
        #[command(subcommand)]
        command: NodesCommand,
    },
    /// Inspect past executions
    Executions {
        #[command(subcommand)]
        command: ExecutionsCommand,
    },
    /// Interactive session (the default)
    Shell,
}

fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("logs")
}

/// Console output goes to stderr so `--json` output stays parseable.
fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log dir: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("flowdesk")
        .filename_suffix("txt")
        .build(log_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let file_filter = EnvFilter::new("trace");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(file_filter),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);
    let _guard = init_logging(&log_dir)?;

    let file = config::load_file_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli.connection, file);
    info!(connection = ?settings.connection, update_method = ?settings.update_method, "Starting flowdesk");

    let client =
        ApiClient::new(settings.connection.clone()).context("Invalid connection settings")?;
    info!(base_url = client.base_url(), "Using workflow API");

    let mut stdout = std::io::stdout();
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Workflows { command } => {
            commands::workflows::run(&client, &settings, command, cli.json, &mut stdout).await
        }
        Commands::Nodes { command } => {
            commands::nodes::run(&client, &settings, command, cli.json, &mut stdout).await
        }
        Commands::Executions { command } => {
            commands::executions::run(&client, &settings, command, cli.json, &mut stdout).await
        }
        Commands::Shell => commands::shell::run_interactive(client, &settings).await,
    }
}
