//! Environment port for the battle layer.
//!
//! The engine never simulates battles itself. Training and evaluation drive
//! an implementation of [`BattleEnvironment`], which owns turn resolution,
//! move legality and the opponent.

use crate::{Result, battle::BattleSnapshot};

/// One battle at a time, seen from the agent's side.
///
/// # Event Sequence
///
/// 1. `start()` begins a battle and returns the first decision snapshot
/// 2. While the snapshot is not finished: `legal_actions(&snapshot)`, then
///    `step(action)` returns the next snapshot
/// 3. The finished snapshot is handed to the agent's episode-end callback
///
/// Environments with several opponents report the one currently fielded
/// through [`name`](BattleEnvironment::name).
pub trait BattleEnvironment {
    type Snapshot: BattleSnapshot;

    /// Name used in logs and saved-model metadata.
    fn name(&self) -> &str;

    /// Begin a new battle.
    fn start(&mut self) -> Result<Self::Snapshot>;

    /// Indices the agent may choose from at `snapshot`.
    fn legal_actions(&self, snapshot: &Self::Snapshot) -> Vec<usize>;

    /// Apply the agent's action and resolve the turn.
    ///
    /// # Errors
    ///
    /// Fails if no battle is running or `action` is not executable.
    fn step(&mut self, action: usize) -> Result<Self::Snapshot>;

    /// Reseed any internal randomness.
    fn reseed(&mut self, _seed: u64) {}

    /// Number of opponents this environment can field.
    fn opponent_count(&self) -> usize {
        1
    }

    /// Field opponent `index % opponent_count()` from the next battle on.
    fn select_opponent(&mut self, _index: usize) {}
}
