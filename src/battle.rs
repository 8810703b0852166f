//! Battle-layer data consumed by the engine
//!
//! The battle simulation itself lives outside this crate. The engine only
//! needs a compact per-side summary of each snapshot to shape rewards and
//! to tell whether a battle has finished.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Non-volatile status afflictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCondition {
    Burn,
    Freeze,
    Paralysis,
    Poison,
    Toxic,
    Sleep,
}

/// Battle outcome from the agent's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    #[default]
    Ongoing,
    Won,
    Lost,
    Tie,
}

impl BattleOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BattleOutcome::Ongoing)
    }
}

/// What the reward shaper needs to know about one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    /// Remaining hp as a fraction of max hp, in [0, 1]
    pub hp_fraction: f64,
    pub fainted: bool,
    pub status: Option<StatusCondition>,
}

impl UnitSummary {
    pub fn healthy() -> Self {
        Self {
            hp_fraction: 1.0,
            fainted: false,
            status: None,
        }
    }

    pub fn with_hp(hp_fraction: f64) -> Self {
        Self {
            hp_fraction,
            fainted: hp_fraction <= 0.0,
            status: None,
        }
    }

    pub fn fainted() -> Self {
        Self {
            hp_fraction: 0.0,
            fainted: true,
            status: None,
        }
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }
}

/// Compact, owned summary of a battle snapshot.
///
/// Units are keyed by a battle-layer identifier. Opponent units appear only
/// once revealed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub own: BTreeMap<String, UnitSummary>,
    pub opponent: BTreeMap<String, UnitSummary>,
    pub outcome: BattleOutcome,
}

impl BattleSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_own(mut self, id: impl Into<String>, unit: UnitSummary) -> Self {
        self.own.insert(id.into(), unit);
        self
    }

    pub fn with_opponent(mut self, id: impl Into<String>, unit: UnitSummary) -> Self {
        self.opponent.insert(id.into(), unit);
        self
    }

    pub fn with_outcome(mut self, outcome: BattleOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }
}

/// A raw snapshot handed over by the battle layer.
pub trait BattleSnapshot {
    /// Summarise the snapshot for reward shaping.
    fn summary(&self) -> BattleSummary;

    /// Whether the battle is over.
    fn is_finished(&self) -> bool {
        self.summary().is_finished()
    }
}

impl BattleSnapshot for BattleSummary {
    fn summary(&self) -> BattleSummary {
        self.clone()
    }

    fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }
}
