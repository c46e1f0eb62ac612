//! snaptrack command-line entry point.

mod app;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "snaptrack",
    version,
    about = "Upload images and track server-side processing"
)]
struct Cli {
    /// Configuration file (defaults to the platform config directory).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Session token to send instead of the stored one.
    #[arg(long, global = true)]
    auth_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Upload a file and wait until its result is ready.
    Upload {
        file: PathBuf,

        /// MIME type sent with the file.
        #[arg(long)]
        content_type: Option<String>,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Check the status of a job once.
    Status {
        job: String,
    },

    /// Store the session token used for API requests.
    Login {
        token: String,
    },

    /// Remove the stored session token.
    Logout,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = config::Config::load(cli.config.as_deref())?;
    config.apply_overrides(|key| std::env::var(key).ok());

    // Logs go to stderr; stdout carries event output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting snaptrack");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, cli.auth_token, cli.command))
}
