//! Inspect command - Summarize a saved model

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    arena::arena_registry,
    cli::{
        config::app_for,
        output::{format_number, print_kv, print_section, print_subsection},
    },
    tabular::greedy_actions,
};

#[derive(Parser, Debug)]
#[command(about = "Show metadata and the most visited states of a saved model")]
pub struct InspectArgs {
    /// Path to the saved model
    pub model: PathBuf,

    /// Number of most visited states to list
    #[arg(long, short = 't', default_value_t = 10)]
    pub top: usize,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let model = app_for(&args.model)
        .repository()
        .load(&args.model)
        .with_context(|| format!("Failed to load {}", args.model.display()))?;

    let registry = arena_registry()?;
    let labels = match registry.get(&model.format) {
        Ok(profile) => profile.action_labels(),
        Err(_) => (0..model.action_space_size())
            .map(|i| format!("action {i}"))
            .collect(),
    };

    let table = &model.table;
    print_section(&format!("Model {}", args.model.display()));
    print_kv("Version", &model.version.to_string());
    print_kv("Format", &model.format);
    print_kv("Algorithm", &model.algorithm.to_string());
    print_kv("Saved in mode", &model.metadata.mode.to_string());
    print_kv(
        "Episodes trained",
        &model.metadata.episodes_trained.to_string(),
    );
    if !model.metadata.opponents.is_empty() {
        print_kv("Trained against", &model.metadata.opponents.join(", "));
    }
    if let Some(seed) = model.metadata.seed {
        print_kv("Last seed", &seed.to_string());
    }
    print_kv("Action space", &table.action_space_size().to_string());
    print_kv("States", &format_number(table.len()));
    print_kv("Total visits", &table.total_visits().to_string());

    if table.is_empty() || args.top == 0 {
        return Ok(());
    }

    let mut rows = table.sorted_rows();
    rows.sort_by(|a, b| b.1.visits().cmp(&a.1.visits()));

    print_subsection(&format!("Top {} states by visits", args.top.min(rows.len())));
    let all_actions: Vec<usize> = (0..table.action_space_size()).collect();
    for (state, row) in rows.into_iter().take(args.top) {
        let best: Vec<&str> = greedy_actions(row, &all_actions)
            .into_iter()
            .filter_map(|a| labels.get(a).map(String::as_str))
            .collect();
        println!(
            "  {state}  visits={}  best={} ({:.3})",
            row.visits(),
            best.join(" | "),
            row.max_value(&all_actions).unwrap_or(0.0)
        );
    }

    Ok(())
}
