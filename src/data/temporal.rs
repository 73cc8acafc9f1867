//! Temporal Indexer Module
//! Detects the date/time column, parses it, drops unreadable rows and orders
//! the table by timestamp.

use super::table::{timestamp_series, RawTable, TemporalKey, TimeIndexedTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

/// Substrings that mark a column as the temporal key.
pub const TEMPORAL_KEYWORDS: [&str; 2] = ["date", "time"];

/// Date-time layouts, tried in order. Month-first before day-first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Date-time layouts carrying an offset; the offset is discarded.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
];

/// Promotes a date/time column to the ordering key of a table.
pub struct TemporalIndexer;

impl TemporalIndexer {
    /// Left-most column whose lowercased name contains "date" or "time".
    pub fn detect_column(names: &[String]) -> Option<&str> {
        names
            .iter()
            .find(|name| {
                let lower = name.to_lowercase();
                TEMPORAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
            })
            .map(String::as_str)
    }

    /// Parse a cell as a naive timestamp. Offsets are dropped, wall clock kept.
    pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.naive_local());
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Some(dt);
            }
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
                return Some(dt.naive_local());
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
                return Some(d.and_time(NaiveTime::MIN));
            }
        }
        None
    }

    /// Build a [`TimeIndexedTable`] from a raw table.
    ///
    /// Without a date/time column the table is returned unchanged and has no
    /// key. Otherwise rows with unparseable timestamps are dropped and the
    /// rest are stable-sorted ascending.
    pub fn index(raw: RawTable) -> PolarsResult<TimeIndexedTable> {
        let names = raw.column_names();
        let Some(key_name) = Self::detect_column(&names).map(str::to_string) else {
            log::warn!("No date column detected, continuing without a time index");
            return Ok(TimeIndexedTable {
                frame: raw.into_frame(),
                key: None,
            });
        };
        log::debug!("Using '{}' as the time column", key_name);

        let frame = raw.into_frame();
        let mut order: Vec<(IdxSize, NaiveDateTime)> = frame
            .column(&key_name)?
            .str()?
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| Some((i as IdxSize, Self::parse_timestamp(v?)?)))
            .collect();

        let dropped = frame.height() - order.len();
        if dropped > 0 {
            log::debug!("Dropped {} rows with invalid timestamps", dropped);
        }

        // sort_by_key is stable: equal timestamps keep their file order
        order.sort_by_key(|&(_, ts)| ts);

        let indices: Vec<IdxSize> = order.iter().map(|&(i, _)| i).collect();
        let stamps: Vec<NaiveDateTime> = order.into_iter().map(|(_, ts)| ts).collect();

        let mut frame = frame.take(&IdxCa::from_vec("order".into(), indices))?;
        frame.with_column(timestamp_series(&key_name, &stamps)?)?;

        Ok(TimeIndexedTable {
            frame,
            key: Some(TemporalKey {
                name: key_name,
                stamps,
            }),
        })
    }

    /// Number of raw rows the index step discarded.
    pub fn dropped_rows(raw_rows: usize, indexed: &TimeIndexedTable) -> usize {
        raw_rows.saturating_sub(indexed.row_count())
    }
}
