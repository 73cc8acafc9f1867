//! Range & Selection Filter Module
//! Restricts a time-indexed table to a date window and the chosen pollutants.

use super::error::PipelineError;
use super::table::TimeIndexedTable;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;

/// Closed calendar interval, compared on the date part of timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

pub struct RangeFilter;

impl RangeFilter {
    /// Keep rows inside `range` and the key plus `selection` columns.
    ///
    /// `range` defaults to the table's own date bounds. In degraded mode the
    /// range cannot be applied and every row passes.
    pub fn apply(
        table: &TimeIndexedTable,
        candidates: &[String],
        selection: &[String],
        range: Option<DateRange>,
    ) -> Result<TimeIndexedTable, PipelineError> {
        let selection = Self::validate_selection(candidates, selection)?;

        let Some(key) = table.key() else {
            let frame = table.frame().select(selection)?;
            if frame.height() == 0 {
                return Err(PipelineError::EmptyRange { range: None });
            }
            return Ok(TimeIndexedTable { frame, key: None });
        };

        let range = range.or_else(|| {
            key.date_bounds()
                .map(|(start, end)| DateRange::new(start, end))
        });
        let Some(range) = range else {
            return Err(PipelineError::EmptyRange { range: None });
        };

        let mask: Vec<bool> = key
            .stamps
            .iter()
            .map(|ts| range.contains(ts.date()))
            .collect();

        let mut columns = Vec::with_capacity(selection.len() + 1);
        columns.push(key.name.clone());
        columns.extend(selection);

        let frame = table
            .frame()
            .filter(&BooleanChunked::from_slice("in_range".into(), &mask))?
            .select(columns)?;

        if frame.height() == 0 {
            return Err(PipelineError::EmptyRange { range: Some(range) });
        }

        Ok(TimeIndexedTable {
            frame,
            key: Some(key.retain(&mask)),
        })
    }

    /// Reject empty selections and names outside the candidate list.
    /// Repeated names collapse to their first position.
    fn validate_selection(
        candidates: &[String],
        selection: &[String],
    ) -> Result<Vec<String>, PipelineError> {
        if selection.is_empty() {
            return Err(PipelineError::EmptySelection);
        }

        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(selection.len());
        for name in selection {
            if !candidates.contains(name) {
                return Err(PipelineError::UnknownPollutant(name.clone()));
            }
            if seen.insert(name.as_str()) {
                validated.push(name.clone());
            }
        }
        Ok(validated)
    }
}
