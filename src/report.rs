//! CSV reports and end-of-run statistics.

use std::path::Path;

use crate::table::{Table, TableError};

/// Write `table` to `path` as UTF-8 CSV with a header row. Missing cells are
/// written empty. The parent directory must already exist.
pub fn write_report(table: &Table, path: &Path) -> Result<(), TableError> {
    table.write_csv_file(path)?;
    tracing::debug!(
        "Wrote {} rows x {} columns to {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(())
}

/// Rows whose `column` cell is missing, or `None` when the column is absent.
pub fn missing_value_count(table: &Table, column: &str) -> Option<usize> {
    table
        .column(column)
        .map(|values| values.filter(Option::is_none).count())
}

/// Counts reported after a successful run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sitetracker_rows: usize,
    pub distinct_docids: usize,
    pub downloaded_rows: usize,
    pub matched_rows: usize,
    pub duplicates_dropped: usize,
    pub merged_rows: usize,
    pub missing_size: Option<usize>,
}

impl RunSummary {
    /// Merged rows that found a file with a known size.
    pub fn sized_rows(&self) -> Option<usize> {
        self.missing_size
            .map(|missing| self.merged_rows.saturating_sub(missing))
    }
}
