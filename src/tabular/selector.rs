//! ε-greedy action selection

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, tabular::action_table::ActionRow};

/// How ties between equally valued greedy actions are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Pick uniformly among the tied actions
    #[default]
    Uniform,
    /// Pick the lowest tied index (no randomness)
    LowestIndex,
}

/// ε-greedy selector restricted to a set of legal actions.
///
/// With probability `1 - ε` the greedy action is returned. Otherwise a
/// uniformly drawn legal action *different from* the greedy one is returned,
/// so exploration always explores. With a single legal action that action
/// is returned unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicySelector {
    tie_break: TieBreak,
}

impl PolicySelector {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Choose an action from `row` among `legal`.
    ///
    /// The RNG is only consulted for tie-breaking (under
    /// [`TieBreak::Uniform`]) and when `epsilon > 0`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoLegalActions`] if `legal` is empty
    /// - [`Error::ActionOutOfRange`] if a legal index is outside the row
    pub fn select<R: Rng + ?Sized>(
        &self,
        row: &ActionRow,
        legal: &[usize],
        epsilon: f64,
        rng: &mut R,
    ) -> Result<usize> {
        let legal = legal_set(row, legal)?;
        let legal = legal.as_slice();

        let greedy = self.greedy_action(row, legal, rng);
        if epsilon <= 0.0 || !legal.iter().any(|&a| a != greedy) {
            return Ok(greedy);
        }

        if rng.random::<f64>() < epsilon {
            let alternatives: Vec<usize> = legal.iter().copied().filter(|&a| a != greedy).collect();
            if let Some(&action) = alternatives.choose(rng) {
                log::trace!("exploring action {action} instead of {greedy} (epsilon {epsilon:.4})");
                return Ok(action);
            }
        }
        Ok(greedy)
    }

    fn greedy_action<R: Rng + ?Sized>(&self, row: &ActionRow, legal: &[usize], rng: &mut R) -> usize {
        let best = greedy_actions(row, legal);
        match self.tie_break {
            TieBreak::LowestIndex => best.iter().copied().min().unwrap_or(legal[0]),
            TieBreak::Uniform if best.len() > 1 => *best.choose(rng).unwrap_or(&best[0]),
            TieBreak::Uniform => best.first().copied().unwrap_or(legal[0]),
        }
    }
}

/// All legal actions achieving the row's maximum value over `legal`,
/// ascending and without repeats.
pub fn greedy_actions(row: &ActionRow, legal: &[usize]) -> Vec<usize> {
    let Some(max_value) = row.max_value(legal) else {
        return Vec::new();
    };
    let mut best: Vec<usize> = legal
        .iter()
        .copied()
        .filter(|&a| row.value(a) == max_value)
        .collect();
    best.sort_unstable();
    best.dedup();
    best
}

/// The legal mask as a sorted set, so a repeated index carries no extra weight.
fn legal_set(row: &ActionRow, legal: &[usize]) -> Result<Vec<usize>> {
    if legal.is_empty() {
        return Err(Error::NoLegalActions);
    }
    if let Some(&action) = legal.iter().find(|&&a| a >= row.len()) {
        return Err(Error::ActionOutOfRange {
            action,
            action_space_size: row.len(),
        });
    }
    let mut set = legal.to_vec();
    set.sort_unstable();
    set.dedup();
    Ok(set)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn row(values: &[f64]) -> ActionRow {
        ActionRow::from_parts(values.to_vec(), 3, vec![0; values.len()]).unwrap()
    }

    #[test]
    fn test_clear_maximum_always_chosen_without_exploration() {
        let selector = PolicySelector::default();
        let mut rng = StdRng::seed_from_u64(1);
        let row = row(&[1.0, 0.0]);
        for _ in 0..1000 {
            assert_eq!(selector.select(&row, &[0, 1], 0.0, &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_full_exploration_always_picks_the_alternative() {
        let selector = PolicySelector::default();
        let mut rng = StdRng::seed_from_u64(2);
        let row = row(&[1.0, 0.0]);
        for _ in 0..1000 {
            assert_eq!(selector.select(&row, &[0, 1], 1.0, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_uniform_tie_break_is_roughly_even() {
        let selector = PolicySelector::new(TieBreak::Uniform);
        let mut rng = StdRng::seed_from_u64(3);
        let row = row(&[0.0, 0.0]);
        let mut counts = [0usize; 2];
        let trials = 100_000;
        for _ in 0..trials {
            counts[selector.select(&row, &[0, 1], 0.0, &mut rng).unwrap()] += 1;
        }
        for count in counts {
            let share = count as f64 / trials as f64;
            assert!((share - 0.5).abs() < 0.01, "share was {share}");
        }
    }

    #[test]
    fn test_lowest_index_tie_break_is_deterministic() {
        let selector = PolicySelector::new(TieBreak::LowestIndex);
        let mut rng = StdRng::seed_from_u64(4);
        let row = row(&[0.3, 0.7, 0.7, 0.1]);
        for _ in 0..100 {
            assert_eq!(selector.select(&row, &[3, 2, 1, 0], 0.0, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_single_action_space_never_hangs() {
        let selector = PolicySelector::default();
        let mut rng = StdRng::seed_from_u64(5);
        let row = row(&[0.0]);
        for epsilon in [0.0, 0.5, 1.0] {
            assert_eq!(selector.select(&row, &[0], epsilon, &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn test_illegal_actions_excluded() {
        let selector = PolicySelector::default();
        let mut rng = StdRng::seed_from_u64(6);
        let row = row(&[5.0, 1.0, 2.0, 0.0]);
        for _ in 0..200 {
            let greedy = selector.select(&row, &[1, 2], 0.0, &mut rng).unwrap();
            assert_eq!(greedy, 2);
            let explored = selector.select(&row, &[1, 2, 3], 1.0, &mut rng).unwrap();
            assert!(explored == 1 || explored == 3);
        }
    }

    #[test]
    fn test_single_legal_action_in_larger_space() {
        let selector = PolicySelector::default();
        let mut rng = StdRng::seed_from_u64(7);
        let row = row(&[9.0, 0.0, 0.0]);
        assert_eq!(selector.select(&row, &[2], 1.0, &mut rng).unwrap(), 2);
    }

    #[test]
    fn test_contract_violations() {
        let selector = PolicySelector::default();
        let mut rng = StdRng::seed_from_u64(8);
        let row = row(&[0.0, 0.0]);
        assert!(matches!(
            selector.select(&row, &[], 0.0, &mut rng),
            Err(Error::NoLegalActions)
        ));
        assert!(matches!(
            selector.select(&row, &[0, 2], 0.0, &mut rng),
            Err(Error::ActionOutOfRange { action: 2, .. })
        ));
    }

    #[test]
    fn test_greedy_actions_collects_ties() {
        let row = row(&[0.5, 0.9, 0.9]);
        assert_eq!(greedy_actions(&row, &[0, 1, 2]), vec![1, 2]);
        assert_eq!(greedy_actions(&row, &[0]), vec![0]);
        assert_eq!(greedy_actions(&row, &[2, 1, 2]), vec![1, 2]);
    }

    #[test]
    fn test_repeated_legal_index_gets_no_extra_weight() {
        let selector = PolicySelector::new(TieBreak::Uniform);
        let mut rng = StdRng::seed_from_u64(9);
        let tied = row(&[0.0, 0.0]);
        let mut counts = [0usize; 2];
        let trials = 100_000;
        for _ in 0..trials {
            counts[selector.select(&tied, &[0, 1, 0], 0.0, &mut rng).unwrap()] += 1;
        }
        let share = counts[0] as f64 / trials as f64;
        assert!((share - 0.5).abs() < 0.01, "share was {share}");

        // Exploration draws from the alternatives once each.
        let skewed = row(&[1.0, 0.0, 0.0]);
        let mut explored = [0usize; 3];
        for _ in 0..trials {
            explored[selector.select(&skewed, &[0, 1, 1, 1, 2], 1.0, &mut rng).unwrap()] += 1;
        }
        assert_eq!(explored[0], 0);
        let share = explored[1] as f64 / trials as f64;
        assert!((share - 0.5).abs() < 0.01, "share was {share}");
    }
}
