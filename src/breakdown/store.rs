//! Table storage (CSV + Parquet)
//!
//! A breakdown directory is rewritten as a whole on every reduction pass,
//! never patched row by row.

use crate::{Error, Result};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::Path;

/// In-memory set of record batches sharing one schema.
pub struct TableStore {
    batches: Vec<RecordBatch>,
}

impl TableStore {
    /// Create a store from existing batches
    #[must_use]
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self { batches }
    }

    /// Load a table from a Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file: {e}"))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            batches.push(batch);
        }

        Ok(Self { batches })
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total rows across batches
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Write every batch to a CSV file with a header row
    ///
    /// # Errors
    /// Returns error if the file cannot be created or written
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = arrow::csv::WriterBuilder::new()
            .with_header(true)
            .build(file);
        for batch in &self.batches {
            writer.write(batch)?;
        }
        Ok(())
    }

    /// Write every batch to a Parquet file
    ///
    /// # Errors
    /// Returns error if the store is empty or the file cannot be written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use parquet::arrow::ArrowWriter;

        let Some(first) = self.batches.first() else {
            return Err(Error::StorageError("Nothing to write".to_string()));
        };
        let file = File::create(path.as_ref())?;
        let mut writer = ArrowWriter::try_new(file, first.schema(), None).map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet writer: {e}"))
        })?;
        for batch in &self.batches {
            writer.write(batch).map_err(|e| {
                Error::StorageError(format!("Failed to write record batch: {e}"))
            })?;
        }
        writer.close().map_err(|e| {
            Error::StorageError(format!("Failed to finish Parquet file: {e}"))
        })?;
        Ok(())
    }
}
