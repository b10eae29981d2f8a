//! KOTH CLI - Command-line interface
//!
//! Commands:
//! - serve: Host a tournament over a local hub behind the HTTP API
//! - simulate: Play random rounds between a host and participants

mod serve;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "koth")]
#[command(about = "King of the Hill tournament host and simulator")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a tournament and expose it over HTTP
    Serve(serve::ServeArgs),
    /// Simulate a tournament between a host and participants
    Simulate(simulate::SimulateArgs),
}

fn main() -> Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve::run(args),
        Commands::Simulate(args) => simulate::run(args, cli.seed),
    }
}
