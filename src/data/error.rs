//! Pipeline error and warning taxonomy.

use super::filter::DateRange;
use super::loader::LoaderError;
use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// Fatal conditions. Any of these halts the run with a single message.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("No pollutant columns found (expected names containing PM2, PM10, NO2, SO2, CO or O3)")]
    NoPollutantCandidates,
    #[error("Please select at least one pollutant to continue")]
    EmptySelection,
    #[error("Column '{0}' is not a pollutant column of this file")]
    UnknownPollutant(String),
    #[error(
        "No data available for the selected date range{}",
        .range.map(|r| format!(" ({r})")).unwrap_or_default()
    )]
    EmptyRange { range: Option<DateRange> },
    #[error("No valid numeric values in the selected pollutant columns")]
    NoNumericData,
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Non-fatal conditions, reported once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// No date/time column: range filtering and resampling are disabled.
    DegradedTemporal,
    /// Rows whose timestamp could not be parsed were removed.
    DroppedTimestamps { count: usize },
    /// Too few days for rolling and monthly charts to be meaningful.
    SparseRange { days: usize, threshold: usize },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::DegradedTemporal => write!(
                f,
                "No date column detected, time-series plots may not function correctly"
            ),
            PipelineWarning::DroppedTimestamps { count } => {
                write!(f, "{count} rows with unreadable timestamps were skipped")
            }
            PipelineWarning::SparseRange { days, threshold } => write!(
                f,
                "The selected range has {days} days (less than {threshold}), rolling and monthly charts may appear flat"
            ),
        }
    }
}
