//! Pipeline Driver Module
//! Chains loader, indexer, classifier, filter, numeric gate and resampler
//! into pure functions the UI calls on every parameter change.

use super::classifier::ColumnClassifier;
use super::coercion::NumericGate;
use super::error::{PipelineError, PipelineWarning};
use super::filter::{DateRange, RangeFilter};
use super::loader::DataLoader;
use super::resample::DailyResampler;
use super::table::{DailyTable, RawTable, TimeIndexedTable, WorkingTable};
use super::temporal::TemporalIndexer;
use crate::config::AnalysisConfig;
use chrono::NaiveDate;

/// User-chosen parameters of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineRequest {
    pub selection: Vec<String>,
    /// `None` means the full span of the file.
    pub range: Option<DateRange>,
}

/// What the UI needs to build its widgets after a file is opened.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub row_count: usize,
    pub column_count: usize,
    pub time_column: Option<String>,
    pub candidates: Vec<String>,
    pub default_selection: Vec<String>,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub warnings: Vec<PipelineWarning>,
}

/// Output of a successful run.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub working: WorkingTable,
    pub daily: DailyTable,
    pub candidates: Vec<String>,
    pub time_column: Option<String>,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub warnings: Vec<PipelineWarning>,
}

struct Indexed {
    table: TimeIndexedTable,
    candidates: Vec<String>,
    row_count: usize,
    column_count: usize,
    warnings: Vec<PipelineWarning>,
}

/// Index and classify. Halts when no pollutant column exists.
fn index(raw: RawTable) -> Result<Indexed, PipelineError> {
    let row_count = raw.row_count();
    let column_count = raw.column_count();

    let table = TemporalIndexer::index(raw)?;
    let mut warnings = Vec::new();
    if table.is_degraded() {
        warnings.push(PipelineWarning::DegradedTemporal);
    }
    let dropped = TemporalIndexer::dropped_rows(row_count, &table);
    if dropped > 0 {
        warnings.push(PipelineWarning::DroppedTimestamps { count: dropped });
    }

    let candidates = ColumnClassifier::pollutant_candidates(&table);
    log::debug!("Pollutant candidates: {:?}", candidates);
    if candidates.is_empty() {
        return Err(PipelineError::NoPollutantCandidates);
    }

    Ok(Indexed {
        table,
        candidates,
        row_count,
        column_count,
        warnings,
    })
}

/// Inspect a freshly loaded file, reusing the table the loader parsed.
pub fn inspect(raw: RawTable, config: &AnalysisConfig) -> Result<Inspection, PipelineError> {
    let indexed = index(raw)?;
    Ok(Inspection {
        row_count: indexed.row_count,
        column_count: indexed.column_count,
        time_column: indexed.table.time_column().map(str::to_string),
        default_selection: ColumnClassifier::default_selection(
            &indexed.candidates,
            config.default_selection,
        ),
        date_bounds: indexed.table.date_bounds(),
        candidates: indexed.candidates,
        warnings: indexed.warnings,
    })
}

/// Run the full preparation chain for one set of parameters.
///
/// Deterministic: the same bytes and request always produce the same tables.
pub fn prepare(
    bytes: &[u8],
    request: &PipelineRequest,
    config: &AnalysisConfig,
) -> Result<PreparedData, PipelineError> {
    let Indexed {
        table,
        candidates,
        mut warnings,
        ..
    } = index(DataLoader::parse_csv(bytes)?)?;

    let time_column = table.time_column().map(str::to_string);
    let date_bounds = table.date_bounds();

    let filtered = RangeFilter::apply(&table, &candidates, &request.selection, request.range)?;
    let selection: Vec<String> = filtered
        .column_names()
        .into_iter()
        .filter(|name| Some(name) != time_column.as_ref())
        .collect();

    let working = NumericGate::apply(filtered, &selection)?;
    let daily = DailyResampler::resample(&working)?;

    if daily.row_count() < config.sparse_day_threshold {
        warnings.push(PipelineWarning::SparseRange {
            days: daily.row_count(),
            threshold: config.sparse_day_threshold,
        });
    }
    for warning in &warnings {
        log::warn!("{warning}");
    }

    Ok(PreparedData {
        working,
        daily,
        candidates,
        time_column,
        date_bounds,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(selection: &[&str], range: Option<DateRange>) -> PipelineRequest {
        PipelineRequest {
            selection: selection.iter().map(|s| s.to_string()).collect(),
            range,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn inspect_csv(csv: &str) -> Inspection {
        let raw = DataLoader::parse_csv(csv.as_bytes()).unwrap();
        inspect(raw, &AnalysisConfig::default()).unwrap()
    }

    fn days_csv(n: u32) -> String {
        let mut csv = String::from("Date,PM2.5,NO2\n");
        for d in 1..=n {
            csv.push_str(&format!("2024-01-{d:02},{},{}\n", d * 10, d));
        }
        csv
    }

    #[test]
    fn two_day_scenario() {
        let csv = "date,pm25,no2\n2024-01-01,50,30\n2024-01-01,70,x\n2024-01-02,60,40\n";
        let out = prepare(
            csv.as_bytes(),
            &request(&["pm25", "no2"], Some(DateRange::new(day(1), day(2)))),
            &AnalysisConfig::default(),
        )
        .unwrap();

        assert_eq!(out.daily.days(), Some(&[day(1), day(2)][..]));
        assert_eq!(out.daily.values("pm25").unwrap(), vec![Some(60.0), Some(60.0)]);
        assert_eq!(out.daily.values("no2").unwrap(), vec![Some(30.0), Some(40.0)]);
        assert_eq!(out.working.row_count(), 3);
    }

    #[test]
    fn five_days_warn_but_still_produce_a_table() {
        let out = prepare(
            days_csv(5).as_bytes(),
            &request(&["PM2.5"], None),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(out.daily.row_count(), 5);
        assert!(out
            .warnings
            .contains(&PipelineWarning::SparseRange { days: 5, threshold: 7 }));
    }

    #[test]
    fn a_full_week_has_no_sparse_warning() {
        let out = prepare(
            days_csv(7).as_bytes(),
            &request(&["PM2.5", "NO2"], None),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.date_bounds, Some((day(1), day(7))));
    }

    #[test]
    fn no_candidates_halts_before_filtering() {
        // An empty selection would fail the filter; the candidate check wins.
        let csv = "Date,Temp\n2024-01-01,20\n";
        let err = prepare(csv.as_bytes(), &request(&[], None), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoPollutantCandidates));
    }

    #[test]
    fn out_of_range_window_is_fatal() {
        let err = prepare(
            days_csv(3).as_bytes(),
            &request(&["NO2"], Some(DateRange::new(day(20), day(25)))),
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRange { .. }));
    }

    #[test]
    fn all_invalid_timestamps_end_in_empty_range() {
        let csv = "Date,PM2.5\nx,1\ny,2\n";
        let err = prepare(csv.as_bytes(), &request(&["PM2.5"], None), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRange { range: None }));

        let info = inspect_csv(csv);
        assert_eq!(info.time_column.as_deref(), Some("Date"));
        assert_eq!(info.date_bounds, None);
        assert_eq!(info.warnings, vec![PipelineWarning::DroppedTimestamps { count: 2 }]);
    }

    #[test]
    fn header_only_degraded_file_ends_in_empty_range() {
        let err = prepare(b"Station,PM10\n", &request(&["PM10"], None), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRange { range: None }));
    }

    #[test]
    fn load_errors_propagate() {
        let err = prepare(b"", &request(&["CO"], None), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let csv = "Date,PM2.5,CO\n2024-01-02 10:00,5,x\n2024-01-01,3,1\n2024-01-02,7,2\n";
        let req = request(&["PM2.5", "CO"], None);
        let config = AnalysisConfig::default();

        let first = prepare(csv.as_bytes(), &req, &config).unwrap();
        let second = prepare(csv.as_bytes(), &req, &config).unwrap();
        assert!(first.daily.frame().equals_missing(second.daily.frame()));
        assert_eq!(first.daily.days(), second.daily.days());
    }

    #[test]
    fn duplicate_pm25_header_uses_first_column() {
        let csv = "Date,PM2.5,PM2.5\n2024-01-01,1,100\n2024-01-02,3,300\n";
        let out = prepare(csv.as_bytes(), &request(&["PM2.5"], None), &AnalysisConfig::default())
            .unwrap();
        assert_eq!(out.daily.values("PM2.5").unwrap(), vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn degraded_files_run_with_a_warning() {
        let csv = "Station,PM10\nA,4\nB,6\n";
        let out = prepare(csv.as_bytes(), &request(&["PM10"], None), &AnalysisConfig::default())
            .unwrap();
        assert!(out.warnings.contains(&PipelineWarning::DegradedTemporal));
        assert_eq!(out.time_column, None);
        assert_eq!(out.daily.days(), None);
        assert_eq!(out.daily.row_count(), 2);
    }

    #[test]
    fn inspection_takes_the_table_the_loader_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aqi.csv");
        std::fs::write(&path, "Date,CO,Temp\n2024-01-02,1,5\n2024-01-01,2,6\n").unwrap();

        let mut loader = DataLoader::new();
        let raw = loader.load_file(&path).unwrap();
        let info = inspect(raw, &AnalysisConfig::default()).unwrap();
        assert_eq!(info.candidates, vec!["CO"]);
        assert_eq!(info.date_bounds, Some((day(1), day(2))));

        let bytes = loader.get_bytes().unwrap();
        let out = prepare(bytes, &request(&["CO"], None), &AnalysisConfig::default()).unwrap();
        assert_eq!(out.daily.values("CO").unwrap(), vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn inspection_offers_defaults_and_bounds() {
        let csv = "Timestamp,PM2.5,PM10,NO2,SO2\n2024-01-03,1,2,3,4\nbad,1,1,1,1\n2024-01-01,1,2,3,4\n";
        let info = inspect_csv(csv);
        assert_eq!(info.row_count, 3);
        assert_eq!(info.column_count, 5);
        assert_eq!(info.time_column.as_deref(), Some("Timestamp"));
        assert_eq!(info.candidates.len(), 4);
        assert_eq!(info.default_selection, vec!["PM2.5", "PM10", "NO2"]);
        assert_eq!(info.date_bounds, Some((day(1), day(3))));
        assert_eq!(info.warnings, vec![PipelineWarning::DroppedTimestamps { count: 1 }]);
    }
}
