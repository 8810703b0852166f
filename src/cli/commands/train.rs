//! Train command - Train a tabular agent in the reference arena

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    arena::{Arena, OpponentPolicy, arena_registry},
    cli::{
        config::{AgentArgs, app_for, opponent_names},
        output::{print_kv, print_result, print_section},
    },
    pipeline::{
        JsonlObserver, MilestoneObserver, ProgressObserver, TrainingConfig, TrainingPipeline,
        TrainingResult,
    },
    ports::BattleEnvironment,
    tabular::{AgentMode, TdAlgorithm, TrainingMetadata},
};

#[derive(Parser, Debug)]
#[command(about = "Train an agent against the arena's opponents")]
pub struct TrainArgs {
    #[command(flatten)]
    pub agent: AgentArgs,

    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 500)]
    pub episodes: usize,

    /// Continue training a saved model instead of starting empty
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Output file for the trained model (.msgpack or .json)
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Optional file for JSONL per-episode observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Log win rate every N episodes
    #[arg(long, default_value_t = 100)]
    pub milestone_interval: usize,

    /// Turns after which an arena battle is declared a tie
    #[arg(long, default_value_t = Arena::DEFAULT_MAX_TURNS)]
    pub max_turns: usize,

    /// Arena opponents, fielded in rotation one battle each
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "random,max-power,heuristic"
    )]
    pub opponents: Vec<OpponentPolicy>,

    /// Evaluate the frozen policy every N training episodes (0 disables)
    #[arg(long, default_value_t = 0)]
    pub checkpoint_interval: usize,

    /// Battles per checkpoint evaluation
    #[arg(long, default_value_t = 50)]
    pub checkpoint_episodes: usize,

    /// Number of frozen-policy episodes to play after training
    #[arg(long, short = 'v', default_value_t = 0)]
    pub validation_episodes: usize,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: TrainingResult,
    validation: Option<TrainingResult>,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    format: String,
    algorithm: TdAlgorithm,
    mode: AgentMode,
    seed: u64,
    states: usize,
    episodes_trained: u64,
    opponents: Vec<String>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no filename means a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let registry = arena_registry()?;

    let (mut agent, mut history) = match &args.resume {
        Some(path) => {
            let app = app_for(path);
            let model = app
                .repository()
                .load(path)
                .with_context(|| format!("Failed to resume from {}", path.display()))?;
            let config = args.agent.resolve_for(&model, AgentMode::Training)?;
            let loaded = app.restore_agent(config, &registry, model)?;
            (loaded.agent, loaded.metadata)
        }
        None => {
            let config = args.agent.resolve(AgentMode::Training)?;
            let agent = app_for(&args.output).create_agent(config, &registry)?;
            (agent, TrainingMetadata::default())
        }
    };

    let seed = agent.seed();
    let mut env = Arena::new(seed.wrapping_add(1))
        .with_max_turns(args.max_turns)
        .with_opponents(args.opponents.iter().copied());
    let opponents = opponent_names(&env);

    print_section("Training");
    print_kv("Format", agent.format());
    print_kv("Algorithm", &agent.algorithm().to_string());
    print_kv("Mode", &agent.mode().to_string());
    print_kv("Opponents", &opponents.join(", "));
    print_kv("Seed", &seed.to_string());
    if history.episodes_trained > 0 {
        print_kv("Prior episodes", &history.episodes_trained.to_string());
    }

    let rotate_opponents = env.opponent_count() > 1;
    let config = TrainingConfig {
        episodes: args.episodes,
        seed: Some(seed),
        max_decisions: args.max_turns.saturating_mul(2),
        rotate_opponents,
        checkpoint_interval: args.checkpoint_interval,
        checkpoint_episodes: args.checkpoint_episodes,
    };
    let mut pipeline = TrainingPipeline::new(config)
        .with_observer(Box::new(MilestoneObserver::new(
            opponents.join("+"),
            args.milestone_interval,
        )));
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        pipeline = pipeline.with_observer(Box::new(JsonlObserver::new(path)?));
    }

    let training = pipeline.run(&mut agent, &mut env)?;
    print_section("Training results");
    print_result(&training);

    for name in &opponents {
        if !history.opponents.contains(name) {
            history.opponents.push(name.clone());
        }
    }

    let app = app_for(&args.output);
    app.save_agent(&agent, &history, &args.output)
        .with_context(|| format!("Failed to save model to {}", args.output.display()))?;
    println!("\nModel saved to {}", args.output.display());

    let validation = if args.validation_episodes > 0 {
        let mut pipeline = TrainingPipeline::new(TrainingConfig {
            episodes: args.validation_episodes,
            seed: Some(seed.wrapping_add(2)),
            max_decisions: args.max_turns.saturating_mul(2),
            rotate_opponents,
            ..Default::default()
        });
        let result = pipeline.evaluate(&mut agent, &mut env)?;
        print_section("Validation (frozen policy)");
        print_result(&result);
        Some(result)
    } else {
        None
    };

    if let Some(raw) = &args.summary {
        let summary_path = sanitize_summary_path(raw);
        let summary = TrainingSummaryFile {
            training,
            validation,
            metadata: SummaryMetadata {
                format: agent.format().to_string(),
                algorithm: agent.algorithm(),
                mode: agent.mode(),
                seed,
                states: agent.table().len(),
                episodes_trained: history.episodes_trained + agent.episodes_finished(),
                opponents: history.opponents.clone(),
            },
        };

        let file = File::create(&summary_path)
            .with_context(|| format!("Failed to create {}", summary_path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
