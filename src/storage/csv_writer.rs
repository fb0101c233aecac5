//! Schema-merging CSV writer
//!
//! The column set is only known after every target has run, so the writer
//! unifies the schema itself: it computes the run-wide column union, then
//! flattens each record against that fixed order.

use std::path::{Path, PathBuf};

use eyre::{Context, Result};

use crate::schema::{Record, collect_all_columns};

/// Writes the merged record set to one UTF-8, comma-separated file.
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the header row and one row per record, in accumulation order.
    ///
    /// Returns the number of data rows written.
    pub fn write(&self, records: &[Record]) -> Result<usize> {
        let columns = collect_all_columns(records);
        log::debug!(
            "Writing {} record(s) across {} column(s)",
            records.len(),
            columns.len()
        );

        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        writer
            .write_record(&columns)
            .context("Failed to write CSV header")?;
        for record in records {
            writer
                .write_record(record.flatten(&columns))
                .with_context(|| format!("Failed to write record from '{}'", record.source))?;
        }
        writer.flush().context("Failed to flush CSV output")?;

        Ok(records.len())
    }
}
