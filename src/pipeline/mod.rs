//! Training and evaluation pipeline abstractions
//!
//! This module provides composable pipelines for:
//! - Training agents against a battle environment
//! - Evaluating frozen policies
//! - Recording observations during training

pub mod observers;
pub mod training;

// Re-export observer implementations (adapters)
pub use observers::{
    EpisodeRecord, JsonlObserver, MetricsObserver, MetricsSummary, MilestoneObserver,
    ProgressObserver,
};
pub use training::{Checkpoint, TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::Observer;
