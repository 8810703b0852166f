//! Versioned envelope for persisted models.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    tabular::{action_table::ActionTable, learner::TdAlgorithm, schedule::AgentMode},
};

/// Provenance recorded alongside a saved table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Number of episodes the table has been trained on, across all runs
    pub episodes_trained: u64,
    /// Environment(s) trained against
    pub opponents: Vec<String>,
    /// Random seed of the last run (if any)
    pub seed: Option<u64>,
    /// Mode the agent was in when saved
    pub mode: AgentMode,
}

/// A learned table together with what is needed to resume using it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub version: u32,
    pub algorithm: TdAlgorithm,
    /// Battle format the table was trained for
    pub format: String,
    pub table: ActionTable,
    pub metadata: TrainingMetadata,
}

impl SavedModel {
    /// Current save format version
    pub const VERSION: u32 = 1;

    pub fn new(
        algorithm: TdAlgorithm,
        format: impl Into<String>,
        table: ActionTable,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            version: Self::VERSION,
            algorithm,
            format: format.into(),
            table,
            metadata,
        }
    }

    /// Reject envelopes written by an incompatible version.
    pub fn check_version(&self) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedModelVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(())
    }

    pub fn action_space_size(&self) -> usize {
        self.table.action_space_size()
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| Error::SerializationContext {
            operation: "serialize model to MessagePack".to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        let model: Self = rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize model from MessagePack".to_string(),
            message: e.to_string(),
        })?;
        model.check_version()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tabular::action_table::ActionRow, types::StateKey};

    fn trained_table() -> ActionTable {
        let mut table = ActionTable::new(3).unwrap();
        table
            .insert_row(
                StateKey::from_ints(&[1, 0]),
                ActionRow::from_parts(vec![0.125, -2.5, 1e-12], 7, vec![3, 2, 2]).unwrap(),
            )
            .unwrap();
        table.get_or_create(&StateKey::from_ints(&[0, 1]));
        table
    }

    #[test]
    fn test_msgpack_roundtrip_is_exact() {
        let saved = SavedModel::new(
            TdAlgorithm::Sarsa,
            "arena",
            trained_table(),
            TrainingMetadata {
                episodes_trained: 42,
                opponents: vec!["random".to_string()],
                seed: Some(9),
                mode: AgentMode::Training,
            },
        );

        let bytes = saved.to_msgpack().unwrap();
        let loaded = SavedModel::from_msgpack(&bytes).unwrap();

        assert_eq!(loaded, saved);
        let row = loaded.table.get(&StateKey::from_ints(&[1, 0])).unwrap();
        assert_eq!(row.values()[0].to_bits(), 0.125f64.to_bits());
        assert_eq!(row.values()[2].to_bits(), 1e-12f64.to_bits());
        assert_eq!(row.visits(), 7);
        assert_eq!(row.action_visits(), &[3, 2, 2]);
    }

    #[test]
    fn test_future_version_rejected() {
        let mut saved = SavedModel::new(
            TdAlgorithm::QLearning,
            "arena",
            trained_table(),
            TrainingMetadata::default(),
        );
        saved.version = 99;
        let bytes = rmp_serde::to_vec_named(&saved).unwrap();
        assert!(matches!(
            SavedModel::from_msgpack(&bytes),
            Err(Error::UnsupportedModelVersion {
                found: 99,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(SavedModel::from_msgpack(b"not a model").is_err());
    }
}
