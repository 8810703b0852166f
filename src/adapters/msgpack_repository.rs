//! MessagePack implementation of the model repository.
//!
//! This adapter implements the ModelRepository port using rmp_serde for
//! compact binary serialization.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use super::model_load_error;
use crate::{Result, error::Error, ports::ModelRepository, tabular::SavedModel};

/// MessagePack-based model repository.
///
/// Provides persistent storage using the MessagePack binary format via
/// rmp_serde. Field names are kept in the encoding so models stay readable
/// by other MessagePack tooling.
///
/// # Examples
///
/// ```no_run
/// use battlebot::adapters::MsgPackRepository;
/// use battlebot::ports::ModelRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let model = repo.load(Path::new("trained.msgpack"))?;
/// repo.save(&model, Path::new("copy.msgpack"))?;
/// # Ok::<(), battlebot::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

impl ModelRepository for MsgPackRepository {
    fn save(&self, model: &SavedModel, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write_named(&mut writer, model).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize model to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        log::info!("saved {} states to {}", model.table.len(), path.display());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedModel> {
        let file = File::open(path).map_err(|e| model_load_error(path, e))?;

        let model: SavedModel = rmp_serde::decode::from_read(BufReader::new(file))
            .map_err(|e| model_load_error(path, e))?;
        model
            .check_version()
            .map_err(|e| model_load_error(path, e))?;

        if model.table.is_empty() {
            log::warn!("model at {} has no learned states", path.display());
        }
        log::info!("loaded {} states from {}", model.table.len(), path.display());
        Ok(model)
    }
}
