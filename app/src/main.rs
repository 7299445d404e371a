//! EQUwU - standalone equalizer host

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "equwu")]
#[command(author, version, about = "Three-band parametric equalizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the equalizer between an input and an output device
    Run(commands::run::RunArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Print the magnitude response of a parameter set
    Response(commands::response::ResponseArgs),

    /// List parameters with their ranges and defaults
    Params,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("equwu=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Response(args) => commands::response::run(args),
        Commands::Params => commands::params::run(),
    }
}
