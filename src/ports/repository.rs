//! Repository port for model persistence.
//!
//! This module defines the trait boundary between the engine and the storage
//! layer for saved models.

use std::path::Path;

use crate::{Result, tabular::SavedModel};

/// Repository trait for saved-model persistence
///
/// This trait abstracts model storage, allowing different backends
/// (filesystem, in-memory for tests, etc.) to be used interchangeably.
///
/// # Contract
///
/// `load` fails with [`Error::ModelLoad`](crate::Error::ModelLoad) when the
/// model is missing, corrupt or written by an unsupported version. It never
/// falls back to an empty table.
///
/// # Examples
///
/// ```no_run
/// use battlebot::ports::ModelRepository;
/// use battlebot::adapters::MsgPackRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository::new();
/// let model = repo.load(Path::new("trained.msgpack"))?;
/// println!("{} states", model.table.len());
/// # Ok::<(), battlebot::Error>(())
/// ```
pub trait ModelRepository {
    /// Save a model to the given path.
    fn save(&self, model: &SavedModel, path: &Path) -> Result<()>;

    /// Load a model from the given path.
    fn load(&self, path: &Path) -> Result<SavedModel>;
}
