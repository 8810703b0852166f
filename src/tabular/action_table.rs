//! Lazily-populated state -> action-value table

use std::collections::{HashMap, hash_map::Entry};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, types::StateKey};

/// Action values and visit counters for a single state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRow {
    values: Vec<f64>,
    visits: u64,
    action_visits: Vec<u64>,
}

impl ActionRow {
    /// Zero-initialised row for an action space of `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            values: vec![0.0; size],
            visits: 0,
            action_visits: vec![0; size],
        }
    }

    /// Rebuild a row from stored parts, checking the row invariants.
    pub fn from_parts(values: Vec<f64>, visits: u64, action_visits: Vec<u64>) -> Result<Self> {
        if values.len() != action_visits.len() {
            return Err(Error::ActionSpaceMismatch {
                expected: values.len(),
                got: action_visits.len(),
            });
        }
        if let Some(action) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteValue {
                state: "<stored row>".to_string(),
                action,
            });
        }
        Ok(Self {
            values,
            visits,
            action_visits,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, action: usize) -> f64 {
        self.values[action]
    }

    /// Number of learning updates sourced from this state.
    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn action_visits(&self) -> &[u64] {
        &self.action_visits
    }

    /// Number of action slots in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Highest value among `actions`; `None` if `actions` is empty.
    pub fn max_value(&self, actions: &[usize]) -> Option<f64> {
        actions
            .iter()
            .map(|&action| self.values[action])
            .fold(None, |best, v| match best {
                Some(b) if b >= v => Some(b),
                _ => Some(v),
            })
    }

    pub(crate) fn set_value(&mut self, action: usize, value: f64) {
        self.values[action] = value;
    }

    pub(crate) fn record_visit(&mut self, action: usize) {
        self.visits += 1;
        self.action_visits[action] += 1;
    }

    fn reset_visits(&mut self) {
        self.visits = 0;
        self.action_visits.iter_mut().for_each(|n| *n = 0);
    }
}

/// The learned model: every encountered state and its [`ActionRow`].
///
/// Rows are created on first access and never removed. The table assumes a
/// single writer; callers sharing it across workers must serialise access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTable", into = "StoredTable")]
pub struct ActionTable {
    action_space_size: usize,
    rows: HashMap<StateKey, ActionRow>,
}

impl ActionTable {
    /// Create an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an empty action space.
    pub fn new(action_space_size: usize) -> Result<Self> {
        if action_space_size == 0 {
            return Err(Error::InvalidConfiguration {
                message: "action space size must be at least 1".to_string(),
            });
        }
        Ok(Self {
            action_space_size,
            rows: HashMap::new(),
        })
    }

    pub fn action_space_size(&self) -> usize {
        self.action_space_size
    }

    /// Fetch the row for `state`, inserting a zeroed row on first visit.
    pub fn get_or_create(&mut self, state: &StateKey) -> &mut ActionRow {
        let size = self.action_space_size;
        match self.rows.entry(state.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::trace!("new state {state}");
                entry.insert(ActionRow::new(size))
            }
        }
    }

    pub fn get(&self, state: &StateKey) -> Option<&ActionRow> {
        self.rows.get(state)
    }

    pub fn contains(&self, state: &StateKey) -> bool {
        self.rows.contains_key(state)
    }

    /// Insert or replace a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionSpaceMismatch`] if the row width differs from
    /// the table's action space.
    pub fn insert_row(&mut self, state: StateKey, row: ActionRow) -> Result<()> {
        if row.len() != self.action_space_size {
            return Err(Error::ActionSpaceMismatch {
                expected: self.action_space_size,
                got: row.len(),
            });
        }
        self.rows.insert(state, row);
        Ok(())
    }

    /// Zero every visit counter while keeping the learned values.
    pub fn reset_visit_counts(&mut self) {
        self.rows.values_mut().for_each(ActionRow::reset_visits);
        log::info!("reset visit counts for {} states", self.rows.len());
    }

    /// Number of states stored
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature count of the stored keys, if any state has been seen.
    pub fn key_arity(&self) -> Option<usize> {
        self.rows.keys().next().map(StateKey::arity)
    }

    /// Sum of per-state visit counters.
    pub fn total_visits(&self) -> u64 {
        self.rows.values().map(ActionRow::visits).sum()
    }

    /// Rows in ascending key order.
    pub fn sorted_rows(&self) -> Vec<(&StateKey, &ActionRow)> {
        let mut rows: Vec<_> = self.rows.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

/// Stable on-disk shape of an [`ActionTable`].
///
/// Keys are stored inline with their rows so formats without composite map
/// keys (JSON) can carry the table unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTable {
    action_space_size: usize,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    state: StateKey,
    values: Vec<f64>,
    visits: u64,
    action_visits: Vec<u64>,
}

impl From<ActionTable> for StoredTable {
    fn from(table: ActionTable) -> Self {
        let mut entries: Vec<StoredEntry> = table
            .rows
            .into_iter()
            .map(|(state, row)| StoredEntry {
                state,
                values: row.values,
                visits: row.visits,
                action_visits: row.action_visits,
            })
            .collect();
        entries.sort_by(|a, b| a.state.cmp(&b.state));
        StoredTable {
            action_space_size: table.action_space_size,
            entries,
        }
    }
}

impl TryFrom<StoredTable> for ActionTable {
    type Error = Error;

    fn try_from(stored: StoredTable) -> Result<Self> {
        let mut table = ActionTable::new(stored.action_space_size)?;
        for entry in stored.entries {
            let row = ActionRow::from_parts(entry.values, entry.visits, entry.action_visits)?;
            table.insert_row(entry.state, row)?;
        }
        Ok(table)
    }
}
