//! Numeric Coercion & Validity Gate Module
//! Converts the selected pollutant columns to numbers and drops empty rows.

use super::error::PipelineError;
use super::table::{TimeIndexedTable, WorkingTable};
use polars::prelude::*;

pub struct NumericGate;

impl NumericGate {
    /// Interpret a cell as a finite number. Anything else is missing.
    pub fn parse_numeric(value: &str) -> Option<f64> {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Coerce `selection` to `Float64` and drop rows where every selected
    /// value is missing. A row with at least one value survives.
    pub fn apply(
        table: TimeIndexedTable,
        selection: &[String],
    ) -> Result<WorkingTable, PipelineError> {
        let TimeIndexedTable { mut frame, key } = table;

        let mut any_valid = vec![false; frame.height()];
        for name in selection {
            let values: Vec<Option<f64>> = frame
                .column(name)?
                .str()?
                .into_iter()
                .map(|v| v.and_then(Self::parse_numeric))
                .collect();

            for (flag, v) in any_valid.iter_mut().zip(&values) {
                *flag |= v.is_some();
            }
            frame.with_column(Series::new(name.as_str().into(), values))?;
        }

        let kept = any_valid.iter().filter(|&&v| v).count();
        if kept == 0 {
            return Err(PipelineError::NoNumericData);
        }

        let (frame, key) = if kept < any_valid.len() {
            log::debug!(
                "Dropped {} rows without any numeric pollutant value",
                any_valid.len() - kept
            );
            let mask = BooleanChunked::from_slice("has_value".into(), &any_valid);
            (frame.filter(&mask)?, key.map(|k| k.retain(&any_valid)))
        } else {
            (frame, key)
        };

        Ok(WorkingTable {
            frame,
            key,
            pollutants: selection.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnClassifier, DataLoader, RangeFilter, TemporalIndexer};

    fn gate(csv: &str, selection: &[&str]) -> Result<WorkingTable, PipelineError> {
        let table = TemporalIndexer::index(DataLoader::parse_csv(csv.as_bytes()).unwrap()).unwrap();
        let candidates = ColumnClassifier::pollutant_candidates(&table);
        let selection: Vec<String> = selection.iter().map(|s| s.to_string()).collect();
        let filtered = RangeFilter::apply(&table, &candidates, &selection, None)?;
        NumericGate::apply(filtered, &selection)
    }

    #[test]
    fn parse_numeric_accepts_numbers_only() {
        assert_eq!(NumericGate::parse_numeric(" 42.5 "), Some(42.5));
        assert_eq!(NumericGate::parse_numeric("1e2"), Some(100.0));
        assert_eq!(NumericGate::parse_numeric("-3"), Some(-3.0));
        assert_eq!(NumericGate::parse_numeric("x"), None);
        assert_eq!(NumericGate::parse_numeric("NaN"), None);
        assert_eq!(NumericGate::parse_numeric("inf"), None);
        assert_eq!(NumericGate::parse_numeric(""), None);
    }

    #[test]
    fn non_numeric_tokens_become_missing_not_zero() {
        let working = gate(
            "Date,PM2.5,NO2\n2024-01-01,50,30\n2024-01-01,70,x\n",
            &["PM2.5", "NO2"],
        )
        .unwrap();
        assert_eq!(working.row_count(), 2);
        assert_eq!(working.values("NO2").unwrap(), vec![Some(30.0), None]);
        assert_eq!(working.values("PM2.5").unwrap(), vec![Some(50.0), Some(70.0)]);
    }

    #[test]
    fn rows_with_all_values_missing_are_dropped() {
        let working = gate(
            "Date,PM2.5,NO2\n2024-01-01,-,n/a\n2024-01-02,,5\n2024-01-03,7,\n",
            &["PM2.5", "NO2"],
        )
        .unwrap();
        assert_eq!(working.row_count(), 2);
        assert_eq!(working.key().unwrap().stamps.len(), 2);
        assert_eq!(working.values("PM2.5").unwrap(), vec![None, Some(7.0)]);
        assert_eq!(working.values("NO2").unwrap(), vec![Some(5.0), None]);
    }

    #[test]
    fn unselected_columns_do_not_keep_rows_alive() {
        let working = gate(
            "Date,PM2.5,NO2\n2024-01-01,x,5\n2024-01-02,3,6\n",
            &["PM2.5"],
        )
        .unwrap();
        assert_eq!(working.row_count(), 1);
        assert_eq!(working.frame().width(), 2);
    }

    #[test]
    fn nothing_numeric_halts() {
        let err = gate("Date,CO\n2024-01-01,a\n2024-01-02,b\n", &["CO"]).unwrap_err();
        assert!(matches!(err, PipelineError::NoNumericData));
    }
}
