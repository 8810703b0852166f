//! Ports (trait boundaries) for external dependencies.
//!
//! This module defines the interfaces between the engine and infrastructure.
//! Following hexagonal architecture, these traits are owned by the engine and
//! implemented by adapters: model storage, training observation and the
//! battle layer the agent plays in.

pub mod environment;
pub mod observer;
pub mod repository;

pub use environment::BattleEnvironment;
pub use observer::{DecisionEvent, EpisodeReport, Observer};
pub use repository::ModelRepository;
