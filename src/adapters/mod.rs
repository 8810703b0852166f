//! Adapters implementing engine ports.
//!
//! This module contains infrastructure implementations of the traits defined
//! in the ports module. Following hexagonal architecture, adapters depend on
//! ports, not the other way around.

use std::path::Path;

use crate::Error;

pub mod in_memory_repository;
pub mod json_repository;
pub mod msgpack_repository;

pub use in_memory_repository::InMemoryRepository;
pub use json_repository::JsonRepository;
pub use msgpack_repository::MsgPackRepository;

/// Wrap any failure while loading `path` as [`Error::ModelLoad`].
pub(crate) fn model_load_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::ModelLoad {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
