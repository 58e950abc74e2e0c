//! Envelope CLI
//!
//! Key generation and hex-envelope encryption from the command line.
//! Results go to stdout, logs to stderr.

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "envelope")]
#[command(about = "Symmetric authenticated-encryption envelopes over hex")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    debug!(command = cli.command.name(), "starting");

    commands::run(cli.command)
}
