//! CSV Data Loader Module
//! Parses uploaded CSV bytes into a string-typed Polars table and keeps the
//! most recently opened file around so the pipeline can be re-run.

use super::table::RawTable;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to build table: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("CSV has no header row")]
    MissingHeader,
}

/// Holds the uploaded file so that parameter changes can re-run the pipeline.
pub struct DataLoader {
    bytes: Option<Vec<u8>>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { bytes: None }
    }

    /// Read and parse a CSV file, returning its table.
    ///
    /// The previous file is only replaced when the new one loads successfully.
    pub fn load_file(&mut self, file_path: &Path) -> Result<RawTable, LoaderError> {
        let bytes = std::fs::read(file_path)?;
        let table = Self::parse_csv(&bytes)?;

        log::info!(
            "Loaded {} with {} rows and {} columns",
            file_path.display(),
            table.row_count(),
            table.column_count()
        );

        self.bytes = Some(bytes);
        Ok(table)
    }

    /// Parse CSV content with a header row into a [`RawTable`].
    ///
    /// Columns sharing a name keep only their first occurrence; empty cells
    /// become nulls. Ragged rows or non UTF-8 content fail the whole load.
    pub fn parse_csv(bytes: &[u8]) -> Result<RawTable, LoaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(LoaderError::MissingHeader);
        }

        // First occurrence wins
        let mut seen: HashSet<&str> = HashSet::new();
        let kept: Vec<(usize, &str)> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| seen.insert(name))
            .collect();

        if kept.len() < headers.len() {
            log::debug!(
                "Dropped {} duplicate column(s)",
                headers.len() - kept.len()
            );
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); kept.len()];
        for record in reader.records() {
            let record = record?;
            for (slot, (idx, _)) in kept.iter().enumerate() {
                let value = record
                    .get(*idx)
                    .filter(|v| !v.trim().is_empty())
                    .map(str::to_string);
                cells[slot].push(value);
            }
        }

        let columns: Vec<Column> = kept
            .iter()
            .zip(cells)
            .map(|((_, name), values)| Column::new((*name).into(), values))
            .collect();

        Ok(RawTable::new(DataFrame::new(columns)?))
    }

    /// Raw content of the most recently loaded file.
    pub fn get_bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn has_data(&self) -> bool {
        self.bytes.is_some()
    }
}
