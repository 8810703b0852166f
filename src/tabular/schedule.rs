//! Exploration and learning-rate schedules

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// How an agent behaves with respect to learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Decaying exploration and learning rate
    #[default]
    Training,
    /// Frozen greedy policy, no learning
    PlayingFixed,
    /// Small constant exploration and learning rate
    PlayingWhileLearning,
}

impl AgentMode {
    /// Whether the agent records transitions and updates its table.
    pub fn is_learning(self) -> bool {
        !matches!(self, AgentMode::PlayingFixed)
    }

    const EXPECTED: &'static str = "training, playing-fixed, playing-while-learning";
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentMode::Training => "training",
            AgentMode::PlayingFixed => "playing-fixed",
            AgentMode::PlayingWhileLearning => "playing-while-learning",
        };
        f.write_str(name)
    }
}

impl FromStr for AgentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "training" | "train" => Ok(AgentMode::Training),
            "playing-fixed" | "fixed" | "frozen" => Ok(AgentMode::PlayingFixed),
            "playing-while-learning" | "keep-training" => Ok(AgentMode::PlayingWhileLearning),
            _ => Err(Error::ParseAgentMode {
                input: s.to_string(),
                expected: Self::EXPECTED.to_string(),
            }),
        }
    }
}

/// Produces ε (exploration probability) and α (TD learning rate) from a
/// visit count and the agent mode.
///
/// In [`AgentMode::Training`]:
///
/// - ε = max(min(1 / ln(max(2, n)), 1), `epsilon_floor`)
/// - α = min(1, max(`learning_rate_scale` / max(1, n), `learning_rate_floor`))
///
/// Both are non-increasing in `n` and never drop below their floors, so
/// exploration and learning continue for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationSchedule {
    /// Lower bound on ε while training
    pub epsilon_floor: f64,
    /// Constant ε in [`AgentMode::PlayingWhileLearning`]
    pub playing_epsilon: f64,
    /// Lower bound on α while training
    pub learning_rate_floor: f64,
    /// Constant α in [`AgentMode::PlayingWhileLearning`]
    pub playing_learning_rate: f64,
    /// Visit count up to which α stays at 1
    pub learning_rate_scale: f64,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            epsilon_floor: 0.01,
            playing_epsilon: 0.005,
            learning_rate_floor: 0.01,
            playing_learning_rate: 0.001,
            learning_rate_scale: 80.0,
        }
    }
}

impl ExplorationSchedule {
    pub fn epsilon(&self, visits: u64, mode: AgentMode) -> f64 {
        match mode {
            AgentMode::PlayingFixed => 0.0,
            AgentMode::PlayingWhileLearning => self.playing_epsilon,
            AgentMode::Training => {
                let n = visits.max(2) as f64;
                (1.0 / n.ln()).min(1.0).max(self.epsilon_floor)
            }
        }
    }

    pub fn learning_rate(&self, visits: u64, mode: AgentMode) -> f64 {
        match mode {
            AgentMode::PlayingFixed => 0.0,
            AgentMode::PlayingWhileLearning => self.playing_learning_rate,
            AgentMode::Training => {
                let n = visits.max(1) as f64;
                (self.learning_rate_scale / n)
                    .max(self.learning_rate_floor)
                    .min(1.0)
            }
        }
    }

    /// Check every parameter is a usable probability / rate.
    pub fn validate(&self) -> crate::Result<()> {
        let unit = [
            ("epsilon_floor", self.epsilon_floor),
            ("playing_epsilon", self.playing_epsilon),
            ("learning_rate_floor", self.learning_rate_floor),
            ("playing_learning_rate", self.playing_learning_rate),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        if !(self.learning_rate_scale.is_finite() && self.learning_rate_scale > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "learning_rate_scale must be positive, got {}",
                    self.learning_rate_scale
                ),
            });
        }
        Ok(())
    }
}
