//! Column Classifier Module
//! Name-based detection of pollutant measurement columns.

use super::table::TimeIndexedTable;

/// Substrings that mark a column as a pollutant measurement.
pub const POLLUTANT_KEYWORDS: [&str; 6] = ["pm2", "pm10", "no2", "so2", "co", "o3"];

pub struct ColumnClassifier;

impl ColumnClassifier {
    pub fn is_pollutant(name: &str) -> bool {
        let lower = name.to_lowercase();
        POLLUTANT_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }

    /// Candidate pollutant columns in source order. The time key is excluded.
    pub fn pollutant_candidates(table: &TimeIndexedTable) -> Vec<String> {
        let key = table.time_column();
        table
            .column_names()
            .into_iter()
            .filter(|name| Some(name.as_str()) != key)
            .filter(|name| Self::is_pollutant(name))
            .collect()
    }

    /// The first `count` candidates, offered as the initial selection.
    pub fn default_selection(candidates: &[String], count: usize) -> Vec<String> {
        candidates.iter().take(count).cloned().collect()
    }
}
