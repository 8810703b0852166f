//! JSON implementation of the model repository.
//!
//! Larger and slower than MessagePack, but diffable and easy to inspect.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use super::model_load_error;
use crate::{Result, error::Error, ports::ModelRepository, tabular::SavedModel};

/// Pretty-printed JSON model repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRepository;

impl JsonRepository {
    pub fn new() -> Self {
        Self
    }
}

impl ModelRepository for JsonRepository {
    fn save(&self, model: &SavedModel, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, model)?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {path:?}"),
            source,
        })?;

        log::info!("saved {} states to {}", model.table.len(), path.display());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedModel> {
        let file = File::open(path).map_err(|e| model_load_error(path, e))?;
        let model: SavedModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| model_load_error(path, e))?;
        model
            .check_version()
            .map_err(|e| model_load_error(path, e))?;

        log::info!("loaded {} states from {}", model.table.len(), path.display());
        Ok(model)
    }
}
