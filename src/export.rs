//! Column-export pipeline
//!
//! Queries one column from the time-series database and writes it to a
//! local numeric text file, one value per line. One query, one file, no
//! retry: failures propagate to the caller.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::db::DbClient;
use crate::series::{output_file_name, NumericSeries};
use crate::Result;

/// One-shot exporter of a single database column.
pub struct ColumnExporter {
    config: ExportConfig,
    db: DbClient,
}

impl ColumnExporter {
    /// Create an exporter against the configured database endpoint.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let db = DbClient::new(&config.endpoint);
        Self { config, db }
    }

    /// Export `column` to `<sanitized-column-name>.txt` in the working
    /// directory and return the written path.
    ///
    /// # Errors
    ///
    /// Propagates query failures, a missing column, non-numeric values,
    /// and file I/O errors unhandled.
    pub async fn export(&self, column: &str) -> Result<PathBuf> {
        self.export_to(column, Path::new(".")).await
    }

    /// Export `column` to a file under `dir`.
    ///
    /// The file name is the column name with `[` and `]` replaced by
    /// `_`, plus a `.txt` extension. Values are written in result order;
    /// absent values are written as NaN.
    ///
    /// # Errors
    ///
    /// Propagates query failures, a missing column, non-numeric values,
    /// and file I/O errors unhandled.
    pub async fn export_to(&self, column: &str, dir: &Path) -> Result<PathBuf> {
        tracing::info!(column, table = %self.config.table, "exporting column");
        let values = self.db.select_column(&self.config.table, column).await?;
        let series = NumericSeries::from_values(column, &values)?;

        let path = dir.join(output_file_name(column));
        // Scoped handle: closed on every exit path, including write failure.
        let file = File::create(&path)?;
        series.write_to(BufWriter::new(file))?;

        tracing::info!(rows = series.len(), path = %path.display(), "column exported");
        Ok(path)
    }
}
