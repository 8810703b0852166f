//! Shared fixtures for the battlebot integration tests.
//!
//! A "duel" is a minimal format: the snapshot carries its own encoded key and
//! the hp of one unit per side, and every action index is a move.

#![allow(dead_code)]

use std::sync::Arc;

use battlebot::{
    BattleOutcome, BattleSnapshot, BattleSummary, FormatProfile, FormatRegistry, StateKey,
    UnitSummary,
    formats::{ActionAvailability, ActionTranslator, BattleOrder, FnEncoder},
};

pub const DUEL_FORMAT: &str = "duel";

#[derive(Debug, Clone)]
pub struct DuelSnapshot {
    pub key: Vec<i64>,
    pub own_hp: f64,
    pub opponent_hp: f64,
    pub outcome: BattleOutcome,
}

impl DuelSnapshot {
    pub fn ongoing(key: &[i64]) -> Self {
        Self {
            key: key.to_vec(),
            own_hp: 1.0,
            opponent_hp: 1.0,
            outcome: BattleOutcome::Ongoing,
        }
    }

    pub fn with_hp(mut self, own_hp: f64, opponent_hp: f64) -> Self {
        self.own_hp = own_hp;
        self.opponent_hp = opponent_hp;
        self
    }

    pub fn finished(mut self, outcome: BattleOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

impl BattleSnapshot for DuelSnapshot {
    fn summary(&self) -> BattleSummary {
        BattleSummary::new()
            .with_own("me", UnitSummary::with_hp(self.own_hp))
            .with_opponent("foe", UnitSummary::with_hp(self.opponent_hp))
            .with_outcome(self.outcome)
    }
}

/// Every index in `0..size` is a move slot.
pub struct MovesOnly(pub usize);

impl ActionTranslator for MovesOnly {
    fn action_space_size(&self) -> usize {
        self.0
    }

    fn action_labels(&self) -> Vec<String> {
        (1..=self.0).map(|i| format!("move {i}")).collect()
    }

    fn to_order(&self, action: usize, _availability: &ActionAvailability) -> Option<BattleOrder> {
        (action < self.0).then_some(BattleOrder::Move {
            slot: action,
            gimmick: None,
        })
    }
}

pub fn duel_profile(action_space_size: usize) -> FormatProfile<DuelSnapshot> {
    FormatProfile::new(
        DUEL_FORMAT,
        Arc::new(
            FnEncoder::new(|s: &DuelSnapshot| StateKey::from_ints(&s.key))
                .with_feature_names(["a", "b"]),
        ),
        Arc::new(MovesOnly(action_space_size)),
    )
}

pub fn duel_registry(action_space_size: usize) -> FormatRegistry<DuelSnapshot> {
    FormatRegistry::new()
        .with_profile(duel_profile(action_space_size))
        .expect("duel profile is valid")
}

/// Play one scripted episode through `agent`: decide at each key, then
/// finish with `outcome`. Returns the chosen actions.
pub fn play_scripted(
    agent: &mut battlebot::TabularAgent<DuelSnapshot>,
    keys: &[[i64; 2]],
    legal: &[usize],
    outcome: BattleOutcome,
) -> Vec<usize> {
    let mut actions = Vec::new();
    let mut opponent_hp = 1.0;
    for key in keys {
        let snapshot = DuelSnapshot::ongoing(key).with_hp(1.0, opponent_hp);
        actions.push(agent.choose_action(&snapshot, legal).expect("legal decision"));
        opponent_hp = (opponent_hp - 0.25_f64).max(0.0);
    }
    let last = keys.last().copied().unwrap_or([0, 0]);
    agent
        .on_episode_finished(
            &DuelSnapshot::ongoing(&last)
                .with_hp(1.0, opponent_hp)
                .finished(outcome),
        )
        .expect("terminal snapshot");
    actions
}
