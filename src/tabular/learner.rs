//! Temporal-difference update rules
//!
//! Both rules move Q(s,a) toward a one-step target:
//!
//! - Q-learning: Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
//! - SARSA:      Q(s,a) ← Q(s,a) + α[r + γ Q(s',a') - Q(s,a)]
//!
//! Terminal transitions drop the bootstrap term. With γ = 0 both collapse to
//! an exponential moving average toward the immediate reward.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    tabular::{
        action_table::ActionTable,
        schedule::{AgentMode, ExplorationSchedule},
    },
    types::StateKey,
};

/// Which TD rule drives learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TdAlgorithm {
    /// Off-policy: bootstrap from the best next action
    #[default]
    QLearning,
    /// On-policy: bootstrap from the next action actually taken
    Sarsa,
}

impl fmt::Display for TdAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TdAlgorithm::QLearning => f.write_str("q-learning"),
            TdAlgorithm::Sarsa => f.write_str("sarsa"),
        }
    }
}

impl FromStr for TdAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "q-learning" | "qlearning" | "q" => Ok(TdAlgorithm::QLearning),
            "sarsa" => Ok(TdAlgorithm::Sarsa),
            _ => Err(Error::ParseAlgorithm {
                input: s.to_string(),
                expected: "q-learning, sarsa".to_string(),
            }),
        }
    }
}

/// Which visit counter feeds the learning-rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitBasis {
    /// Total updates sourced from the state
    State,
    /// Updates of the specific (state, action) cell
    #[default]
    Action,
}

/// Record of a single applied update.
#[derive(Debug, Clone, PartialEq)]
pub struct TdUpdate {
    pub state: StateKey,
    pub action: usize,
    pub reward: f64,
    pub learning_rate: f64,
    pub target: f64,
    pub old_value: f64,
    pub new_value: f64,
}

/// Applies TD updates to an [`ActionTable`].
///
/// Every call increments the state's visit counter and the cell's action
/// counter by exactly one, even when α = 0 leaves the value unchanged.
#[derive(Debug, Clone, Copy)]
pub struct TdLearner {
    discount_factor: f64,
    rate_basis: VisitBasis,
    schedule: ExplorationSchedule,
}

impl TdLearner {
    pub fn new(discount_factor: f64, rate_basis: VisitBasis, schedule: ExplorationSchedule) -> Self {
        Self {
            discount_factor,
            rate_basis,
            schedule,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Q-learning update for `(state, action)`.
    ///
    /// `next` is the successor state with the actions legal there, or `None`
    /// for a terminal transition.
    pub fn update_q(
        &self,
        table: &mut ActionTable,
        state: &StateKey,
        action: usize,
        reward: f64,
        next: Option<(&StateKey, &[usize])>,
        mode: AgentMode,
    ) -> Result<TdUpdate> {
        let bootstrap = match next {
            Some((next_state, next_legal)) => table
                .get(next_state)
                .and_then(|row| {
                    let legal: Vec<usize> = next_legal
                        .iter()
                        .copied()
                        .filter(|&a| a < row.len())
                        .collect();
                    row.max_value(&legal)
                })
                .unwrap_or(0.0),
            None => 0.0,
        };
        self.apply(table, state, action, reward, bootstrap, mode)
    }

    /// SARSA update for `(state, action)`.
    ///
    /// `next` is the successor state and the action already chosen there, or
    /// `None` for a terminal transition.
    pub fn update_sarsa(
        &self,
        table: &mut ActionTable,
        state: &StateKey,
        action: usize,
        reward: f64,
        next: Option<(&StateKey, usize)>,
        mode: AgentMode,
    ) -> Result<TdUpdate> {
        let bootstrap = match next {
            Some((next_state, next_action)) => {
                check_action(table, next_action)?;
                table
                    .get(next_state)
                    .map(|row| row.value(next_action))
                    .unwrap_or(0.0)
            }
            None => 0.0,
        };
        self.apply(table, state, action, reward, bootstrap, mode)
    }

    fn apply(
        &self,
        table: &mut ActionTable,
        state: &StateKey,
        action: usize,
        reward: f64,
        bootstrap: f64,
        mode: AgentMode,
    ) -> Result<TdUpdate> {
        check_action(table, action)?;
        let row = table.get_or_create(state);

        let visits = match self.rate_basis {
            VisitBasis::State => row.visits(),
            VisitBasis::Action => row.action_visits()[action],
        };
        let learning_rate = self.schedule.learning_rate(visits, mode);

        let old_value = row.value(action);
        let target = reward + self.discount_factor * bootstrap;
        let new_value = old_value + learning_rate * (target - old_value);
        if !new_value.is_finite() {
            return Err(Error::NonFiniteValue {
                state: state.to_string(),
                action,
            });
        }

        row.set_value(action, new_value);
        row.record_visit(action);

        log::debug!(
            "td update {state} a={action}: r={reward:.3} alpha={learning_rate:.4} {old_value:.4} -> {new_value:.4}"
        );

        Ok(TdUpdate {
            state: state.clone(),
            action,
            reward,
            learning_rate,
            target,
            old_value,
            new_value,
        })
    }
}

fn check_action(table: &ActionTable, action: usize) -> Result<()> {
    if action >= table.action_space_size() {
        return Err(Error::ActionOutOfRange {
            action,
            action_space_size: table.action_space_size(),
        });
    }
    Ok(())
}
