//! Reward shaping between consecutive battle summaries

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    battle::{BattleOutcome, BattleSummary, UnitSummary},
};

/// Coefficients applied by [`RewardShaper`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Paid when a unit faints
    pub fainted: f64,
    /// Paid per percentage point of hp lost
    pub hp: f64,
    /// Paid when a status is inflicted or cured
    pub status: f64,
    /// Paid on winning or losing the battle
    pub victory: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            fainted: 10.0,
            hp: 0.1,
            status: 0.0,
            victory: 30.0,
        }
    }
}

impl RewardWeights {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("fainted", self.fainted),
            ("hp", self.hp),
            ("status", self.status),
            ("victory", self.victory),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(Error::InvalidConfiguration {
                    message: format!("reward weight '{name}' must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Turns two consecutive summaries into a scalar reward.
///
/// Own losses are penalised and opponent losses rewarded with the same
/// weights. An opponent unit seen for the first time is treated as having
/// started the transition at full health. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardShaper {
    weights: RewardWeights,
}

impl RewardShaper {
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    pub fn shape(&self, previous: &BattleSummary, current: &BattleSummary) -> f64 {
        let mut reward = 0.0;

        for (id, now) in &current.own {
            if let Some(before) = previous.own.get(id) {
                reward -= self.unit_loss(before, now);
            }
        }

        for (id, now) in &current.opponent {
            let before = previous.opponent.get(id);
            let before = before.cloned().unwrap_or_else(UnitSummary::healthy);
            reward += self.unit_loss(&before, now);
        }

        if previous.outcome != current.outcome {
            match current.outcome {
                BattleOutcome::Won => reward += self.weights.victory,
                BattleOutcome::Lost => reward -= self.weights.victory,
                BattleOutcome::Ongoing | BattleOutcome::Tie => {}
            }
        }

        reward
    }

    /// Value lost by one unit between two summaries (negative on recovery).
    fn unit_loss(&self, before: &UnitSummary, now: &UnitSummary) -> f64 {
        if before.fainted {
            return 0.0;
        }
        if now.fainted {
            return self.weights.fainted + self.weights.hp * before.hp_fraction * 100.0;
        }

        let mut loss = self.weights.hp * (before.hp_fraction - now.hp_fraction) * 100.0;
        match (before.status, now.status) {
            (None, Some(_)) => loss += self.weights.status,
            (Some(_), None) => loss -= self.weights.status,
            _ => {}
        }
        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::StatusCondition;

    const EPS: f64 = 1e-9;

    fn shaper() -> RewardShaper {
        RewardShaper::new(RewardWeights {
            status: 2.0,
            ..RewardWeights::default()
        })
    }

    #[test]
    fn test_identical_summaries_yield_zero() {
        let weights = [
            RewardWeights::default(),
            RewardWeights {
                fainted: -3.0,
                hp: 7.5,
                status: 1.0,
                victory: 0.0,
            },
        ];
        let summary = BattleSummary::new()
            .with_own("a", UnitSummary::with_hp(0.4).with_status(StatusCondition::Burn))
            .with_own("b", UnitSummary::fainted())
            .with_opponent("x", UnitSummary::with_hp(0.9))
            .with_outcome(BattleOutcome::Won);
        for w in weights {
            assert_eq!(RewardShaper::new(w).shape(&summary, &summary), 0.0);
        }
        let empty = BattleSummary::new();
        assert_eq!(shaper().shape(&empty, &empty), 0.0);
    }

    #[test]
    fn test_win_and_loss() {
        let before = BattleSummary::new();
        let won = BattleSummary::new().with_outcome(BattleOutcome::Won);
        let lost = BattleSummary::new().with_outcome(BattleOutcome::Lost);
        let tie = BattleSummary::new().with_outcome(BattleOutcome::Tie);
        assert_eq!(shaper().shape(&before, &won), 30.0);
        assert_eq!(shaper().shape(&before, &lost), -30.0);
        assert_eq!(shaper().shape(&before, &tie), 0.0);
    }

    #[test]
    fn test_own_damage_and_faint() {
        let full = BattleSummary::new().with_own("a", UnitSummary::healthy());
        let half = BattleSummary::new().with_own("a", UnitSummary::with_hp(0.5));
        let down = BattleSummary::new().with_own("a", UnitSummary::fainted());

        assert!((shaper().shape(&full, &half) - (-5.0)).abs() < EPS);
        assert!((shaper().shape(&half, &down) - (-5.0 - 10.0)).abs() < EPS);
        assert_eq!(shaper().shape(&down, &down), 0.0);
    }

    #[test]
    fn test_opponent_damage_and_faint() {
        let full = BattleSummary::new().with_opponent("x", UnitSummary::healthy());
        let half = BattleSummary::new().with_opponent("x", UnitSummary::with_hp(0.5));
        let down = BattleSummary::new().with_opponent("x", UnitSummary::fainted());

        assert!((shaper().shape(&full, &half) - 5.0).abs() < EPS);
        assert!((shaper().shape(&half, &down) - 15.0).abs() < EPS);
    }

    #[test]
    fn test_newly_revealed_opponent_starts_at_full_health() {
        let unseen = BattleSummary::new();
        let revealed_down = BattleSummary::new().with_opponent("x", UnitSummary::fainted());
        let revealed_half = BattleSummary::new().with_opponent("x", UnitSummary::with_hp(0.5));

        assert!((shaper().shape(&unseen, &revealed_down) - 20.0).abs() < EPS);
        assert!((shaper().shape(&unseen, &revealed_half) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_status_is_symmetric() {
        let clean = BattleSummary::new()
            .with_own("a", UnitSummary::healthy())
            .with_opponent("x", UnitSummary::healthy());
        let own_burned = BattleSummary::new()
            .with_own("a", UnitSummary::healthy().with_status(StatusCondition::Burn))
            .with_opponent("x", UnitSummary::healthy());
        let foe_poisoned = BattleSummary::new()
            .with_own("a", UnitSummary::healthy())
            .with_opponent("x", UnitSummary::healthy().with_status(StatusCondition::Poison));

        assert_eq!(shaper().shape(&clean, &own_burned), -2.0);
        assert_eq!(shaper().shape(&own_burned, &clean), 2.0);
        assert_eq!(shaper().shape(&clean, &foe_poisoned), 2.0);
        assert_eq!(shaper().shape(&foe_poisoned, &clean), -2.0);
    }

    #[test]
    fn test_units_missing_from_previous_own_side_are_ignored() {
        let before = BattleSummary::new();
        let after = BattleSummary::new().with_own("a", UnitSummary::with_hp(0.1));
        assert_eq!(shaper().shape(&before, &after), 0.0);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let weights = RewardWeights {
            hp: f64::NAN,
            ..RewardWeights::default()
        };
        assert!(weights.validate().is_err());
    }
}
