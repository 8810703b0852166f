//! CSV export of an action table

use std::{io::Write, path::Path};

use crate::{Error, Result, tabular::ActionTable};

/// What goes into the export besides the action values.
#[derive(Debug, Clone, Default)]
pub struct TableExportConfig {
    /// Names of the state-key features; generated when empty
    pub feature_names: Vec<String>,
    /// Names of the actions; generated when empty
    pub action_labels: Vec<String>,
    /// Append the state's visit count and per-action visit counts
    pub include_visits: bool,
}

/// Writes an [`ActionTable`] as CSV, rows sorted by state key.
pub struct TableCsvExporter;

impl TableCsvExporter {
    /// Export to a file, returning the number of state rows written.
    pub fn export(table: &ActionTable, config: &TableExportConfig, path: &Path) -> Result<usize> {
        let file = std::fs::File::create(path).map_err(|source| Error::Io {
            operation: format!("create CSV file {}", path.display()),
            source,
        })?;
        let written = Self::write(table, config, file)?;
        log::info!("exported {written} states to {}", path.display());
        Ok(written)
    }

    /// Export to any writer, returning the number of state rows written.
    pub fn write<W: Write>(table: &ActionTable, config: &TableExportConfig, out: W) -> Result<usize> {
        let arity = table.key_arity().unwrap_or(config.feature_names.len());
        let feature_names = names_or_default(&config.feature_names, arity, "feature")?;
        let action_labels =
            names_or_default(&config.action_labels, table.action_space_size(), "action")?;

        let mut writer = csv::Writer::from_writer(out);
        let mut header: Vec<String> = feature_names;
        header.extend(action_labels.iter().cloned());
        if config.include_visits {
            header.push("visits".to_string());
            header.extend(action_labels.iter().map(|label| format!("{label} visits")));
        }
        writer.write_record(&header)?;

        let rows = table.sorted_rows();
        for (state, row) in &rows {
            let mut record: Vec<String> = state.features().iter().map(ToString::to_string).collect();
            record.extend(row.values().iter().map(ToString::to_string));
            if config.include_visits {
                record.push(row.visits().to_string());
                record.extend(row.action_visits().iter().map(ToString::to_string));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(rows.len())
    }
}

fn names_or_default(names: &[String], expected: usize, prefix: &str) -> Result<Vec<String>> {
    if names.is_empty() {
        return Ok((1..=expected).map(|i| format!("{prefix}_{i}")).collect());
    }
    if names.len() != expected {
        return Err(Error::InvalidConfiguration {
            message: format!(
                "{} {prefix} names given for {expected} columns",
                names.len()
            ),
        });
    }
    Ok(names.to_vec())
}
