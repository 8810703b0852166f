//! Tabular reinforcement-learning policy engine for turn-based battle bots
//!
//! This crate provides:
//! - A sparse state→action-value table with lazily created rows
//! - ε-greedy action selection with visit-count-driven schedules
//! - Q-learning and SARSA updates from shaped battle rewards
//! - A decision-point controller that remembers the pending transition
//! - Format profiles mapping battles to state keys and action indices
//! - Versioned model persistence (MessagePack, JSON) and CSV export
//! - A seeded reference arena and a training pipeline with observers

pub mod adapters;
pub mod app;
pub mod arena;
pub mod battle;
pub mod cli;
pub mod controller;
pub mod error;
pub mod export;
pub mod formats;
pub mod pipeline;
pub mod ports;
pub mod reward;
pub mod tabular;
pub mod types;

pub use battle::{BattleOutcome, BattleSnapshot, BattleSummary, StatusCondition, UnitSummary};
pub use controller::{PendingTransition, TabularAgent};
pub use error::{Error, Result};
pub use formats::{ActionTranslator, FormatProfile, FormatRegistry, StateEncoder};
pub use reward::{RewardShaper, RewardWeights};
pub use types::{Feature, StateKey};
