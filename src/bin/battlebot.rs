//! battlebot CLI - Train and inspect tabular battle agents
//!
//! This CLI provides a unified interface for:
//! - Training Q-learning/SARSA agents in the reference arena
//! - Evaluating saved policies
//! - Inspecting and exporting learned tables
//! - Resetting visit counters before a new training phase

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "battlebot")]
#[command(version, about = "Tabular reinforcement learning for turn-based battles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent
    Train(Box<battlebot::cli::commands::train::TrainArgs>),

    /// Evaluate a saved agent
    Evaluate(battlebot::cli::commands::evaluate::EvaluateArgs),

    /// Summarize a saved model
    Inspect(battlebot::cli::commands::inspect::InspectArgs),

    /// Export a saved model's table as CSV
    Export(battlebot::cli::commands::export::ExportArgs),

    /// Zero a saved model's visit counters
    ResetVisits(battlebot::cli::commands::reset_visits::ResetVisitsArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => battlebot::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => battlebot::cli::commands::evaluate::execute(args),
        Commands::Inspect(args) => battlebot::cli::commands::inspect::execute(args),
        Commands::Export(args) => battlebot::cli::commands::export::execute(args),
        Commands::ResetVisits(args) => battlebot::cli::commands::reset_visits::execute(args),
    }
}
