use anyhow::Result;
use clap::{Parser, Subcommand};

use dafl::commands;

#[derive(Parser)]
#[command(
    name = "dafl",
    version,
    about = concat!("dafl: DFG-proximity-guided fuzzing scheduler\nVersion: ", env!("CARGO_PKG_VERSION")),
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a pre-recorded execution trace through the scheduler
    Run(commands::RunArgs),

    /// Dump interval-tree and vertical-manager statistics as JSON
    Inspect(commands::InspectArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run_run(&args)?,
        Commands::Inspect(args) => commands::run_inspect(&args)?,
    }

    Ok(())
}
