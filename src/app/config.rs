//! Configuration types for agent creation.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    reward::RewardWeights,
    tabular::{AgentMode, ExplorationSchedule, TdAlgorithm, VisitBasis},
};

/// Configuration for creating a tabular agent.
///
/// This type provides a type-safe, builder-style API for configuring agents
/// before creation through the dependency injection container. Every field
/// has a default, so a JSON config only needs the fields it changes.
///
/// # Examples
///
/// ```
/// use battlebot::app::AgentConfig;
/// use battlebot::tabular::{AgentMode, TdAlgorithm};
///
/// let config = AgentConfig::new("arena")
///     .with_algorithm(TdAlgorithm::Sarsa)
///     .with_mode(AgentMode::PlayingWhileLearning)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Battle format id, resolved through a format registry
    pub format: String,
    pub mode: AgentMode,
    pub algorithm: TdAlgorithm,
    /// Expected action space size; `None` accepts the format's
    pub action_space_size: Option<usize>,
    /// Bootstrap weight γ, 0 disables bootstrapping
    pub discount_factor: f64,
    /// Visit counter driving the learning rate
    pub rate_basis: VisitBasis,
    pub schedule: ExplorationSchedule,
    pub reward: RewardWeights,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.2;

    /// Create a configuration for `format` with default parameters.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            mode: AgentMode::default(),
            algorithm: TdAlgorithm::default(),
            action_space_size: None,
            discount_factor: Self::DEFAULT_DISCOUNT_FACTOR,
            rate_basis: VisitBasis::default(),
            schedule: ExplorationSchedule::default(),
            reward: RewardWeights::default(),
            seed: None,
        }
    }

    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_algorithm(mut self, algorithm: TdAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_action_space_size(mut self, size: usize) -> Self {
        self.action_space_size = Some(size);
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_rate_basis(mut self, rate_basis: VisitBasis) -> Self {
        self.rate_basis = rate_basis;
        self
    }

    pub fn with_schedule(mut self, schedule: ExplorationSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_reward(mut self, reward: RewardWeights) -> Self {
        self.reward = reward;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.format.trim().is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "format must not be empty".to_string(),
            });
        }
        if self.action_space_size == Some(0) {
            return Err(Error::InvalidConfiguration {
                message: "action_space_size must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "discount_factor must be within [0, 1], got {}",
                    self.discount_factor
                ),
            });
        }
        self.schedule.validate()?;
        self.reward.validate()
    }

    /// Read a configuration from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {}", path.display()),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("arena")
    }
}
