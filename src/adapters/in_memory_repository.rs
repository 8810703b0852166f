//! In-memory model repository for testing.
//!
//! This adapter provides a pure in-memory implementation of ModelRepository,
//! enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::model_load_error;
use crate::{Result, error::Error, ports::ModelRepository, tabular::SavedModel};

/// In-memory repository for testing.
///
/// Stores MessagePack-encoded models in a shared HashMap keyed by path, so a
/// save/load cycle goes through the same encoding as the file adapter.
///
/// # Examples
///
/// ```
/// use battlebot::adapters::InMemoryRepository;
/// use battlebot::ports::ModelRepository;
/// use battlebot::tabular::{ActionTable, SavedModel, TdAlgorithm, TrainingMetadata};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let model = SavedModel::new(
///     TdAlgorithm::QLearning,
///     "arena",
///     ActionTable::new(6)?,
///     TrainingMetadata::default(),
/// );
///
/// repo.save(&model, Path::new("model"))?;
/// let loaded = repo.load(Path::new("model"))?;
/// assert_eq!(loaded, model);
/// # Ok::<(), battlebot::Error>(())
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of models currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(&key(path))
    }

    /// Store raw bytes under `path`, e.g. to simulate a corrupt file.
    pub fn insert_raw(&self, path: &Path, bytes: Vec<u8>) {
        self.storage().insert(key(path), bytes);
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl ModelRepository for InMemoryRepository {
    fn save(&self, model: &SavedModel, path: &Path) -> Result<()> {
        let bytes = model.to_msgpack().map_err(|e| Error::SerializationContext {
            operation: "serialize model for in-memory storage".to_string(),
            message: e.to_string(),
        })?;
        self.storage().insert(key(path), bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedModel> {
        let storage = self.storage();
        let bytes = storage
            .get(&key(path))
            .ok_or_else(|| model_load_error(path, "no model stored at this key"))?;
        SavedModel::from_msgpack(bytes).map_err(|e| model_load_error(path, e))
    }
}
