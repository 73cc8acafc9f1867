//! Table Model Module
//! The tables produced at each pipeline stage, all backed by Polars frames.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Derived month column of the daily table (1 = January).
pub const MONTH_COL: &str = "Month";
/// Derived year column of the daily table.
pub const YEAR_COL: &str = "Year";

/// Parsed CSV content. Every column is a nullable string column.
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
}

impl RawTable {
    pub(crate) fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    pub(crate) fn into_frame(self) -> DataFrame {
        self.frame
    }
}

/// The designated ordering column together with its parsed timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalKey {
    pub name: String,
    /// One timestamp per row of the owning frame, ascending.
    pub stamps: Vec<NaiveDateTime>,
}

impl TemporalKey {
    /// Keep the timestamps whose mask entry is set.
    pub(crate) fn retain(&self, mask: &[bool]) -> Self {
        let stamps = self
            .stamps
            .iter()
            .zip(mask)
            .filter(|(_, &keep)| keep)
            .map(|(ts, _)| *ts)
            .collect();
        Self {
            name: self.name.clone(),
            stamps,
        }
    }

    /// First and last calendar date, if any rows exist.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.stamps.first()?.date();
        let last = self.stamps.last()?.date();
        Some((first, last))
    }
}

/// A table ordered by its temporal key, or left untouched in degraded mode.
#[derive(Debug, Clone)]
pub struct TimeIndexedTable {
    pub(crate) frame: DataFrame,
    pub(crate) key: Option<TemporalKey>,
}

impl TimeIndexedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn key(&self) -> Option<&TemporalKey> {
        self.key.as_ref()
    }

    pub fn time_column(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.name.as_str())
    }

    /// True when no date/time column was detected.
    pub fn is_degraded(&self) -> bool {
        self.key.is_none()
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.key.as_ref().and_then(TemporalKey::date_bounds)
    }
}

/// Filtered, numeric, validity-gated measurements.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    pub(crate) frame: DataFrame,
    pub(crate) key: Option<TemporalKey>,
    pub(crate) pollutants: Vec<String>,
}

impl WorkingTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn key(&self) -> Option<&TemporalKey> {
        self.key.as_ref()
    }

    pub fn pollutants(&self) -> &[String] {
        &self.pollutants
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn values(&self, pollutant: &str) -> PolarsResult<Vec<Option<f64>>> {
        float_values(&self.frame, pollutant)
    }
}

/// One row per calendar day: the surface every chart and statistic reads.
#[derive(Debug, Clone)]
pub struct DailyTable {
    pub(crate) frame: DataFrame,
    pub(crate) days: Option<Vec<NaiveDate>>,
    pub(crate) pollutants: Vec<String>,
}

impl DailyTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Day of each row, or `None` in degraded mode.
    pub fn days(&self) -> Option<&[NaiveDate]> {
        self.days.as_deref()
    }

    pub fn pollutants(&self) -> &[String] {
        &self.pollutants
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn values(&self, pollutant: &str) -> PolarsResult<Vec<Option<f64>>> {
        float_values(&self.frame, pollutant)
    }

    /// Whether the derived Month/Year columns are present.
    pub fn has_calendar(&self) -> bool {
        self.days.is_some()
    }
}

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn float_values(frame: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(frame.column(name)?.f64()?.into_iter().collect())
}

/// Build a `Datetime(ms)` series from naive timestamps.
pub(crate) fn timestamp_series(name: &str, stamps: &[NaiveDateTime]) -> PolarsResult<Series> {
    let millis: Vec<i64> = stamps
        .iter()
        .map(|ts| ts.and_utc().timestamp_millis())
        .collect();
    Series::new(name.into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

/// Build a `Date` series from calendar days.
pub(crate) fn date_series(name: &str, days: &[NaiveDate]) -> PolarsResult<Series> {
    let epoch_days: Vec<i32> = days
        .iter()
        .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
    Series::new(name.into(), epoch_days).cast(&DataType::Date)
}

/// `NaiveDate::from_ymd(1970, 1, 1).num_days_from_ce()`
pub(crate) const EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_offset_matches_chrono() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(epoch.num_days_from_ce(), EPOCH_DAYS_FROM_CE);
    }

    #[test]
    fn retain_keeps_masked_stamps() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let key = TemporalKey {
            name: "Date".to_string(),
            stamps: vec![
                day.and_hms_opt(0, 0, 0).unwrap(),
                day.and_hms_opt(6, 0, 0).unwrap(),
                day.and_hms_opt(12, 0, 0).unwrap(),
            ],
        };
        let kept = key.retain(&[true, false, true]);
        assert_eq!(kept.stamps.len(), 2);
        assert_eq!(kept.stamps[1], day.and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(kept.date_bounds(), Some((day, day)));
    }

    #[test]
    fn date_series_has_date_dtype() {
        let days = vec![NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()];
        let series = date_series("day", &days).unwrap();
        assert_eq!(series.dtype(), &DataType::Date);
        assert_eq!(series.len(), 1);
    }
}
