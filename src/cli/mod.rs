//! CLI infrastructure for the battlebot toolkit
//!
//! This module provides the command-line interface for training, evaluating,
//! inspecting and exporting tabular battle agents.

pub mod commands;
pub mod config;
pub mod output;
