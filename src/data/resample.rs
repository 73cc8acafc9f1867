//! Daily Resampler Module
//! Collapses the working table to one row per calendar day.

use super::table::{date_series, DailyTable, WorkingTable, MONTH_COL, YEAR_COL};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Running sum and count of valid values for one pollutant on one day.
#[derive(Debug, Clone, Copy, Default)]
struct DayAccumulator {
    sum: f64,
    count: usize,
}

impl DayAccumulator {
    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

pub struct DailyResampler;

impl DailyResampler {
    /// Mean of each pollutant per calendar day present in the input.
    ///
    /// Days without rows are not synthesized. A day on which a pollutant has
    /// no valid values gets a null for that pollutant. Without a time key the
    /// rows pass through unaggregated.
    pub fn resample(working: &WorkingTable) -> PolarsResult<DailyTable> {
        let pollutants = working.pollutants().to_vec();

        let Some(key) = working.key() else {
            return Ok(DailyTable {
                frame: working.frame().select(pollutants.iter().map(String::as_str))?,
                days: None,
                pollutants,
            });
        };

        let columns = pollutants
            .iter()
            .map(|p| working.values(p))
            .collect::<PolarsResult<Vec<_>>>()?;

        // Rows arrive sorted by timestamp, so each day is one contiguous run
        let mut days: Vec<NaiveDate> = Vec::new();
        let mut acc: Vec<Vec<DayAccumulator>> = vec![Vec::new(); pollutants.len()];
        for (row, ts) in key.stamps.iter().enumerate() {
            let day = ts.date();
            if days.last() != Some(&day) {
                days.push(day);
                acc.iter_mut().for_each(|a| a.push(DayAccumulator::default()));
            }
            for (values, day_acc) in columns.iter().zip(acc.iter_mut()) {
                if let (Some(v), Some(slot)) = (values[row], day_acc.last_mut()) {
                    slot.sum += v;
                    slot.count += 1;
                }
            }
        }

        let mut cols: Vec<Column> = Vec::with_capacity(pollutants.len() + 3);
        cols.push(date_series(&key.name, &days)?.into());
        for (name, day_acc) in pollutants.iter().zip(acc) {
            let means: Vec<Option<f64>> = day_acc.into_iter().map(DayAccumulator::mean).collect();
            cols.push(Column::new(name.as_str().into(), means));
        }
        let months: Vec<i32> = days.iter().map(|d| d.month() as i32).collect();
        let years: Vec<i32> = days.iter().map(|d| d.year()).collect();
        cols.push(Column::new(MONTH_COL.into(), months));
        cols.push(Column::new(YEAR_COL.into(), years));

        Ok(DailyTable {
            frame: DataFrame::new(cols)?,
            days: Some(days),
            pollutants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnClassifier, DataLoader, NumericGate, RangeFilter, TemporalIndexer};

    fn daily(csv: &str, selection: &[&str]) -> DailyTable {
        let table = TemporalIndexer::index(DataLoader::parse_csv(csv.as_bytes()).unwrap()).unwrap();
        let candidates = ColumnClassifier::pollutant_candidates(&table);
        let selection: Vec<String> = selection.iter().map(|s| s.to_string()).collect();
        let filtered = RangeFilter::apply(&table, &candidates, &selection, None).unwrap();
        let working = NumericGate::apply(filtered, &selection).unwrap();
        DailyResampler::resample(&working).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn invalid_cells_are_excluded_from_the_mean() {
        let table = daily(
            "date,pm25,no2\n2024-01-01,50,30\n2024-01-01,70,x\n2024-01-02,60,40\n",
            &["pm25", "no2"],
        );
        assert_eq!(table.days(), Some(&[day(2024, 1, 1), day(2024, 1, 2)][..]));
        assert_eq!(table.values("pm25").unwrap(), vec![Some(60.0), Some(60.0)]);
        assert_eq!(table.values("no2").unwrap(), vec![Some(30.0), Some(40.0)]);
    }

    #[test]
    fn gaps_are_not_filled() {
        let table = daily(
            "Date,CO\n2024-01-01 01:00,1\n2024-01-01 02:00,3\n2024-01-05 00:00,10\n",
            &["CO"],
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.values("CO").unwrap(), vec![Some(2.0), Some(10.0)]);
    }

    #[test]
    fn all_missing_day_yields_null_for_that_pollutant() {
        let table = daily(
            "Date,PM10,O3\n2024-02-01,x,4\n2024-02-01,,6\n2024-02-02,8,\n",
            &["PM10", "O3"],
        );
        assert_eq!(table.values("PM10").unwrap(), vec![None, Some(8.0)]);
        assert_eq!(table.values("O3").unwrap(), vec![Some(5.0), None]);
    }

    #[test]
    fn calendar_columns_are_derived_from_days() {
        let table = daily("Date,SO2\n2023-12-31,1\n2024-01-01,2\n", &["SO2"]);
        let frame = table.frame();
        assert_eq!(
            frame.get_column_names().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            vec!["Date", "SO2", "Month", "Year"]
        );
        let months: Vec<Option<i32>> = frame.column(MONTH_COL).unwrap().i32().unwrap().into_iter().collect();
        let years: Vec<Option<i32>> = frame.column(YEAR_COL).unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(months, vec![Some(12), Some(1)]);
        assert_eq!(years, vec![Some(2023), Some(2024)]);
        assert_eq!(frame.column("Date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn degraded_rows_pass_through() {
        let table = daily("Station,PM10\nA,1\nB,x\nC,3\n", &["PM10"]);
        assert!(!table.has_calendar());
        assert_eq!(table.values("PM10").unwrap(), vec![Some(1.0), Some(3.0)]);
    }
}
