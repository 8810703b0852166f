//! Evaluate command - Play a saved model against the arena opponents

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    arena::{Arena, OpponentPolicy, arena_registry},
    cli::{
        config::{AgentArgs, app_for, opponent_names},
        output::{print_kv, print_result, print_section},
    },
    pipeline::{ProgressObserver, TrainingConfig, TrainingPipeline},
    ports::BattleEnvironment,
    tabular::AgentMode,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a saved model")]
pub struct EvaluateArgs {
    /// Path to the saved model
    pub model: PathBuf,

    #[command(flatten)]
    pub agent: AgentArgs,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 100)]
    pub episodes: usize,

    /// Arena opponents, fielded in rotation (random, max-power, heuristic)
    #[arg(long, value_delimiter = ',', default_value = "random")]
    pub opponents: Vec<OpponentPolicy>,

    /// Turns after which an arena battle is declared a tie
    #[arg(long, default_value_t = Arena::DEFAULT_MAX_TURNS)]
    pub max_turns: usize,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let app = app_for(&args.model);
    let model = app
        .repository()
        .load(&args.model)
        .with_context(|| format!("Failed to load {}", args.model.display()))?;

    print_section("Loaded model");
    print_kv("Path", &args.model.display().to_string());
    print_kv("Format", &model.format);
    print_kv("Algorithm", &model.algorithm.to_string());
    print_kv("Episodes trained", &model.metadata.episodes_trained.to_string());
    if !model.metadata.opponents.is_empty() {
        print_kv("Trained against", &model.metadata.opponents.join(", "));
    }

    let config = args.agent.resolve_for(&model, AgentMode::PlayingFixed)?;
    let registry = arena_registry()?;
    let mut agent = app.restore_agent(config, &registry, model)?.agent;

    let seed = agent.seed();
    let mut env = Arena::new(seed.wrapping_add(1))
        .with_max_turns(args.max_turns)
        .with_opponents(args.opponents.iter().copied());
    let opponents = opponent_names(&env);
    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        seed: Some(seed),
        max_decisions: args.max_turns.saturating_mul(2),
        rotate_opponents: env.opponent_count() > 1,
        ..Default::default()
    });
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    // --mode playing-while-learning evaluates while still adapting; nothing is saved.
    let result = if agent.mode() == AgentMode::PlayingFixed {
        pipeline.evaluate(&mut agent, &mut env)?
    } else {
        pipeline.run(&mut agent, &mut env)?
    };

    print_section(&format!(
        "Results vs {} ({})",
        opponents.join(", "),
        agent.mode()
    ));
    print_result(&result);

    if let Some(path) = &args.export {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &result)?;
        println!("\nResults written to {}", path.display());
    }

    Ok(())
}
