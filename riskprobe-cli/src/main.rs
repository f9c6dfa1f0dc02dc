//! RiskProbe CLI - replay device risk signal collection offline.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

#[derive(Parser)]
#[command(name = "riskprobe")]
#[command(author, version, about = "Client-side device risk signals for authentication", long_about = None)]
#[command(after_help = exit_codes::HELP)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of a report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the device signal bundle from a recorded environment
    Collect {
        /// Recorded environment (JSON)
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
    },

    /// Score VPN and emulator suspicion against a provider report
    Assess {
        /// Recorded environment (JSON)
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        /// Visitor-identification report: {"timezone": ..., "languages": [...]}
        #[arg(long, value_name = "REPORT")]
        visitor: PathBuf,
    },

    /// Summarize a recorded keystroke / mouse event stream
    Biometrics {
        /// Event stream (JSON array of keydown / mousemove events)
        #[arg(value_name = "EVENTS")]
        events: PathBuf,
    },

    /// Build the risk fields of an authentication request body
    Payload {
        /// Recorded environment (JSON)
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        /// Attach a biometrics summary computed from this event stream
        #[arg(long, value_name = "EVENTS")]
        events: Option<PathBuf>,

        /// Attach a device position
        #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
        geo: Option<String>,

        /// Send a geohash instead of raw coordinates
        #[arg(long, requires = "geo")]
        reduce_location: bool,

        /// Merge into this request body (JSON object) instead of printing the fields alone
        #[arg(long, value_name = "BODY")]
        body: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("riskprobe=debug,riskprobe_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Collect { snapshot } => commands::collect::execute(snapshot, json).await,
        Commands::Assess { snapshot, visitor } => {
            commands::assess::execute(snapshot, visitor, json).await
        }
        Commands::Biometrics { events } => commands::biometrics::execute(events, json),
        Commands::Payload {
            snapshot,
            events,
            geo,
            reduce_location,
            body,
        } => {
            commands::payload::execute(commands::payload::PayloadArgs {
                snapshot,
                events,
                geo,
                reduce_location,
                body,
            })
            .await
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(e) => ExitCode::from_anyhow(&e),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
    std::process::ExitCode::from(u8::try_from(exit.code).unwrap_or(1))
}
