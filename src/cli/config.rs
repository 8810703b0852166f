//! Shared configuration for CLI commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::{
    adapters::{JsonRepository, MsgPackRepository},
    app::{AgentConfig, App, AppBuilder},
    arena::{ARENA_FORMAT, Arena},
    tabular::{AgentMode, SavedModel, TdAlgorithm},
};

/// Agent options shared by every command that builds an agent
#[derive(Args, Debug, Clone, Default)]
pub struct AgentArgs {
    /// JSON agent configuration; the flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// TD rule (q-learning or sarsa)
    #[arg(long)]
    pub algorithm: Option<TdAlgorithm>,

    /// Agent mode (training, playing-fixed, playing-while-learning)
    #[arg(long)]
    pub mode: Option<AgentMode>,

    /// Discount factor γ for bootstrapping (0 disables it)
    #[arg(long)]
    pub discount: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

impl AgentArgs {
    /// Build the agent configuration, falling back to `default_mode`.
    pub fn resolve(&self, default_mode: AgentMode) -> Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_json_file(path)
                .with_context(|| format!("Failed to read agent config {}", path.display()))?,
            None => AgentConfig::new(ARENA_FORMAT).with_mode(default_mode),
        };

        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(discount) = self.discount {
            config.discount_factor = discount;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }

    /// Like [`AgentArgs::resolve`], but format and algorithm default to the
    /// saved model's unless given explicitly.
    pub fn resolve_for(&self, model: &SavedModel, default_mode: AgentMode) -> Result<AgentConfig> {
        let mut config = self.resolve(default_mode)?;
        if self.config.is_none() {
            config.format = model.format.clone();
            if self.algorithm.is_none() {
                config.algorithm = model.algorithm;
            }
        }
        Ok(config)
    }
}

/// App whose repository matches the model file's extension.
///
/// `.json` files use the JSON repository, anything else MessagePack.
pub fn app_for(path: &Path) -> App {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        AppBuilder::new().with_repository(JsonRepository::new()).build()
    } else {
        AppBuilder::new()
            .with_repository(MsgPackRepository::new())
            .build()
    }
}

/// Environment names of the arena's roster, in rotation order.
pub fn opponent_names(arena: &Arena) -> Vec<String> {
    arena
        .roster()
        .iter()
        .map(|policy| policy.env_name().to_string())
        .collect()
}
