//! Reset-visits command - Zero a saved model's visit counters
//!
//! Learned values are kept; exploration and learning rates restart from
//! their initial schedule on the next training run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::config::app_for;

#[derive(Parser, Debug)]
#[command(about = "Zero the visit counters of a saved model in place")]
pub struct ResetVisitsArgs {
    /// Path to the saved model
    pub model: PathBuf,
}

pub fn execute(args: ResetVisitsArgs) -> Result<()> {
    let states = app_for(&args.model)
        .reset_visit_counts(&args.model)
        .with_context(|| format!("Failed to reset {}", args.model.display()))?;
    println!("Reset visit counts of {states} states");
    Ok(())
}
