//! Export functionality for learned tables
//!
//! Currently supports a CSV rendering of an action table: one row per state,
//! state features first, then one column per action.

mod table_csv;

pub use table_csv::{TableCsvExporter, TableExportConfig};
