//! Export command - Write a saved model's table as CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    arena::arena_registry,
    cli::config::app_for,
    export::{TableCsvExporter, TableExportConfig},
};

#[derive(Parser, Debug)]
#[command(about = "Export a saved model's action table as CSV")]
pub struct ExportArgs {
    /// Path to the saved model
    pub model: PathBuf,

    /// Output CSV file
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Append visit counters after the action values
    #[arg(long, default_value_t = false)]
    pub visits: bool,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let model = app_for(&args.model)
        .repository()
        .load(&args.model)
        .with_context(|| format!("Failed to load {}", args.model.display()))?;

    // Unknown formats fall back to generated column names.
    let registry = arena_registry()?;
    let mut config = TableExportConfig {
        include_visits: args.visits,
        ..Default::default()
    };
    if let Ok(profile) = registry.get(&model.format) {
        config.feature_names = profile.encoder().feature_names();
        config.action_labels = profile.action_labels();
    }

    let rows = TableCsvExporter::export(&model.table, &config, &args.output)?;
    println!("Exported {rows} states to {}", args.output.display());
    Ok(())
}
