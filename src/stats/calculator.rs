//! Statistics Calculator Module
//! Descriptive statistics, correlation, rolling and calendar aggregates over
//! the prepared air-quality tables.

use crate::config::AnalysisConfig;
use crate::data::{DailyTable, PipelineWarning, PreparedData, MONTH_COL, YEAR_COL};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Describe-style statistics for one pollutant.
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            column: String::new(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Overall figures shown above the statistics table.
#[derive(Debug, Clone, Copy)]
pub struct HeadlineMetrics {
    /// Mean of the per-pollutant means.
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
}

/// Values of one pollutant, aligned with the rows of the daily table.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Rolling mean over consecutive present days.
#[derive(Debug, Clone)]
pub struct RollingMean {
    pub window: usize,
    pub series: Vec<PollutantSeries>,
    /// Too few rows for a window: `series` is the raw daily data.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct MonthlyMeans {
    /// Months present, ascending (1 = January).
    pub months: Vec<u32>,
    pub series: Vec<PollutantSeries>,
}

/// Daily values bucketed by month, for box plots.
#[derive(Debug, Clone)]
pub struct MonthlyDistribution {
    pub months: Vec<u32>,
    pub pollutants: Vec<String>,
    /// `values[month_idx][pollutant_idx]`, missing values removed.
    pub values: Vec<Vec<Vec<f64>>>,
}

/// Pearson correlation over pairwise-complete rows.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Monthly means of one pollutant laid out as years x 12 months.
#[derive(Debug, Clone)]
pub struct YearMonthPivot {
    pub pollutant: String,
    pub years: Vec<i32>,
    pub cells: Vec<[Option<f64>; 12]>,
}

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl Trendline {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Mean level of each pollutant and its share of the total.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub labels: Vec<String>,
    pub means: Vec<f64>,
    pub shares: Vec<f64>,
}

/// Five-number summary used by box plots.
#[derive(Debug, Clone, Copy)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
}

/// Every aggregate the dashboard displays for one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub pollutants: Vec<String>,
    pub time_column: Option<String>,
    /// Day of each daily row, `None` in degraded mode.
    pub days: Option<Vec<NaiveDate>>,
    pub daily: Vec<PollutantSeries>,
    pub working_rows: usize,
    pub headline: HeadlineMetrics,
    pub describe: Vec<DescriptiveStats>,
    pub rolling: RollingMean,
    pub monthly: Option<MonthlyMeans>,
    pub distribution: Option<MonthlyDistribution>,
    pub correlation: CorrelationMatrix,
    pub heatmaps: Vec<YearMonthPivot>,
    pub contribution: Contribution,
    pub warnings: Vec<PipelineWarning>,
}

impl AnalysisReport {
    pub fn series(&self, pollutant: &str) -> Option<&PollutantSeries> {
        self.daily.iter().find(|s| s.name == pollutant)
    }

    /// Trend line between two pollutants of the daily table.
    pub fn trendline(&self, x: &str, y: &str) -> Option<Trendline> {
        let xs = self.series(x)?;
        let ys = self.series(y)?;
        StatsCalculator::trendline(&xs.values, &ys.values)
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(column: &str, values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats {
                column: column.to_string(),
                ..Default::default()
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        DescriptiveStats {
            column: column.to_string(),
            count: n,
            mean: Statistics::mean(values),
            std: Statistics::std_dev(values),
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Quartiles with 1.5 IQR whiskers clamped to observed values.
    pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - 1.5 * iqr)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + 1.5 * iqr)
            .unwrap_or(q3);

        Some(BoxSummary {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
        })
    }

    /// Describe every pollutant of the daily table in parallel, over its
    /// present daily values.
    pub fn describe_all(daily: &DailyTable) -> PolarsResult<Vec<DescriptiveStats>> {
        daily
            .pollutants()
            .par_iter()
            .map(|p| {
                let values: Vec<f64> = daily.values(p)?.into_iter().flatten().collect();
                Ok(Self::describe(p, &values))
            })
            .collect()
    }

    /// Overall average, maximum and minimum across the selected pollutants.
    pub fn headline(describe: &[DescriptiveStats]) -> HeadlineMetrics {
        let present: Vec<&DescriptiveStats> = describe.iter().filter(|d| d.count > 0).collect();
        if present.is_empty() {
            return HeadlineMetrics {
                average: f64::NAN,
                maximum: f64::NAN,
                minimum: f64::NAN,
            };
        }

        let average = present.iter().map(|d| d.mean).sum::<f64>() / present.len() as f64;
        let maximum = present.iter().map(|d| d.max).fold(f64::NEG_INFINITY, f64::max);
        let minimum = present.iter().map(|d| d.min).fold(f64::INFINITY, f64::min);
        HeadlineMetrics {
            average,
            maximum,
            minimum,
        }
    }

    /// Pearson correlation of two columns over rows where both are present.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
        let (xs, ys) = Self::complete_pairs(x, y);
        if xs.len() < 2 {
            return f64::NAN;
        }
        let sx = Statistics::std_dev(&xs);
        let sy = Statistics::std_dev(&ys);
        if sx == 0.0 || sy == 0.0 {
            return f64::NAN;
        }
        (Statistics::covariance(&xs, &ys) / (sx * sy)).clamp(-1.0, 1.0)
    }

    pub fn correlation_matrix(series: &[PollutantSeries]) -> CorrelationMatrix {
        let values = series
            .iter()
            .enumerate()
            .map(|(i, a)| {
                series
                    .iter()
                    .enumerate()
                    .map(|(j, b)| {
                        if i == j {
                            let present: Vec<f64> = a.values.iter().flatten().copied().collect();
                            if present.len() > 1 && Statistics::std_dev(&present) > 0.0 {
                                1.0
                            } else {
                                f64::NAN
                            }
                        } else {
                            Self::pearson(&a.values, &b.values)
                        }
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix {
            labels: series.iter().map(|s| s.name.clone()).collect(),
            values,
        }
    }

    /// Rolling mean over `window` consecutive rows.
    ///
    /// A value exists only when the whole window is present, so the first
    /// `window - 1` rows are empty. With fewer rows than the window the raw
    /// series is returned and flagged as degraded.
    pub fn rolling_mean(series: &[PollutantSeries], window: usize) -> RollingMean {
        let window = window.max(1);
        let rows = series.first().map(|s| s.values.len()).unwrap_or(0);
        if rows < window {
            return RollingMean {
                window,
                series: series.to_vec(),
                degraded: true,
            };
        }

        let series = series
            .iter()
            .map(|s| {
                let values = (0..s.values.len())
                    .map(|i| {
                        if i + 1 < window {
                            return None;
                        }
                        let slice = &s.values[i + 1 - window..=i];
                        let sum = slice.iter().copied().sum::<Option<f64>>()?;
                        Some(sum / window as f64)
                    })
                    .collect();
                PollutantSeries {
                    name: s.name.clone(),
                    values,
                }
            })
            .collect();

        RollingMean {
            window,
            series,
            degraded: false,
        }
    }

    /// Mean of each pollutant per calendar month, months ascending.
    pub fn monthly_means(daily: &DailyTable) -> PolarsResult<Option<MonthlyMeans>> {
        if !daily.has_calendar() {
            return Ok(None);
        }

        let aggs: Vec<Expr> = daily
            .pollutants()
            .iter()
            .map(|p| col(p.as_str()).mean())
            .collect();

        let grouped = daily
            .frame()
            .clone()
            .lazy()
            .group_by([col(MONTH_COL)])
            .agg(aggs)
            .sort([MONTH_COL], SortMultipleOptions::default())
            .collect()?;

        let months: Vec<u32> = grouped
            .column(MONTH_COL)?
            .i32()?
            .into_iter()
            .flatten()
            .map(|m| m as u32)
            .collect();

        let series = daily
            .pollutants()
            .iter()
            .map(|p| {
                Ok(PollutantSeries {
                    name: p.clone(),
                    values: grouped.column(p)?.f64()?.into_iter().collect(),
                })
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(Some(MonthlyMeans { months, series }))
    }

    /// Present daily values of each pollutant grouped by month.
    pub fn monthly_distribution(daily: &DailyTable) -> PolarsResult<Option<MonthlyDistribution>> {
        let Some(days) = daily.days() else {
            return Ok(None);
        };

        let columns = daily
            .pollutants()
            .iter()
            .map(|p| daily.values(p))
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut buckets: BTreeMap<u32, Vec<Vec<f64>>> = BTreeMap::new();
        for (row, day) in days.iter().enumerate() {
            let bucket = buckets
                .entry(day.month())
                .or_insert_with(|| vec![Vec::new(); columns.len()]);
            for (values, slot) in columns.iter().zip(bucket.iter_mut()) {
                if let Some(v) = values[row] {
                    slot.push(v);
                }
            }
        }

        Ok(Some(MonthlyDistribution {
            months: buckets.keys().copied().collect(),
            pollutants: daily.pollutants().to_vec(),
            values: buckets.into_values().collect(),
        }))
    }

    /// Year x month mean grids, one per pollutant.
    pub fn year_month_pivots(daily: &DailyTable) -> PolarsResult<Vec<YearMonthPivot>> {
        if !daily.has_calendar() {
            return Ok(Vec::new());
        }

        let aggs: Vec<Expr> = daily
            .pollutants()
            .iter()
            .map(|p| col(p.as_str()).mean())
            .collect();

        let grouped = daily
            .frame()
            .clone()
            .lazy()
            .group_by([col(YEAR_COL), col(MONTH_COL)])
            .agg(aggs)
            .sort([YEAR_COL, MONTH_COL], SortMultipleOptions::default())
            .collect()?;

        let years: Vec<i32> = grouped.column(YEAR_COL)?.i32()?.into_iter().flatten().collect();
        let months: Vec<i32> = grouped.column(MONTH_COL)?.i32()?.into_iter().flatten().collect();

        let mut distinct_years = years.clone();
        distinct_years.dedup();

        daily
            .pollutants()
            .iter()
            .map(|p| {
                let means: Vec<Option<f64>> = grouped.column(p)?.f64()?.into_iter().collect();
                let mut cells = vec![[None; 12]; distinct_years.len()];
                for ((year, month), mean) in years.iter().zip(&months).zip(means) {
                    let row = distinct_years.iter().position(|y| y == year);
                    let col_idx = (*month as usize).checked_sub(1).filter(|m| *m < 12);
                    if let (Some(row), Some(col_idx)) = (row, col_idx) {
                        cells[row][col_idx] = mean;
                    }
                }
                Ok(YearMonthPivot {
                    pollutant: p.clone(),
                    years: distinct_years.clone(),
                    cells,
                })
            })
            .collect()
    }

    /// Least squares fit of `y` on `x` over rows where both are present.
    pub fn trendline(x: &[Option<f64>], y: &[Option<f64>]) -> Option<Trendline> {
        let (xs, ys) = Self::complete_pairs(x, y);
        if xs.len() < 2 {
            return None;
        }
        let var_x = Statistics::variance(&xs);
        if var_x == 0.0 || var_x.is_nan() {
            return None;
        }

        let cov = Statistics::covariance(&xs, &ys);
        let slope = cov / var_x;
        let intercept = Statistics::mean(&ys) - slope * Statistics::mean(&xs);
        let var_y = Statistics::variance(&ys);
        let r_squared = if var_y > 0.0 {
            (cov * cov) / (var_x * var_y)
        } else {
            f64::NAN
        };

        Some(Trendline {
            slope,
            intercept,
            r_squared,
            n: xs.len(),
        })
    }

    /// Mean of each pollutant and its share of the summed means.
    /// Negative means count as zero towards the shares.
    pub fn contribution(series: &[PollutantSeries]) -> Contribution {
        let means: Vec<f64> = series
            .iter()
            .map(|s| {
                let present: Vec<f64> = s.values.iter().flatten().copied().collect();
                if present.is_empty() {
                    f64::NAN
                } else {
                    Statistics::mean(&present)
                }
            })
            .collect();

        let total: f64 = means.iter().filter(|m| **m > 0.0).sum();
        let shares = means
            .iter()
            .map(|&m| if total > 0.0 && m > 0.0 { m / total } else { 0.0 })
            .collect();

        Contribution {
            labels: series.iter().map(|s| s.name.clone()).collect(),
            means,
            shares,
        }
    }

    /// Compute every aggregate of the dashboard for one pipeline run.
    pub fn analyze(prepared: &PreparedData, config: &AnalysisConfig) -> PolarsResult<AnalysisReport> {
        let daily_table = &prepared.daily;
        let daily = daily_table
            .pollutants()
            .iter()
            .map(|p| {
                Ok(PollutantSeries {
                    name: p.clone(),
                    values: daily_table.values(p)?,
                })
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        let describe = Self::describe_all(daily_table)?;
        let headline = Self::headline(&describe);

        Ok(AnalysisReport {
            pollutants: daily_table.pollutants().to_vec(),
            time_column: prepared.time_column.clone(),
            days: daily_table.days().map(<[NaiveDate]>::to_vec),
            working_rows: prepared.working.row_count(),
            headline,
            describe,
            rolling: Self::rolling_mean(&daily, config.rolling_window),
            monthly: Self::monthly_means(daily_table)?,
            distribution: Self::monthly_distribution(daily_table)?,
            correlation: Self::correlation_matrix(&daily),
            heatmaps: Self::year_month_pivots(daily_table)?,
            contribution: Self::contribution(&daily),
            warnings: prepared.warnings.clone(),
            daily,
        })
    }

    fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
        x.iter()
            .zip(y)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{prepare, PipelineRequest};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn series(name: &str, values: &[Option<f64>]) -> PollutantSeries {
        PollutantSeries {
            name: name.to_string(),
            values: values.to_vec(),
        }
    }

    fn report(csv: &str, selection: &[&str]) -> AnalysisReport {
        let config = AnalysisConfig::default();
        let request = PipelineRequest {
            selection: selection.iter().map(|s| s.to_string()).collect(),
            range: None,
        };
        let prepared = prepare(csv.as_bytes(), &request, &config).unwrap();
        StatsCalculator::analyze(&prepared, &config).unwrap()
    }

    #[test]
    fn describe_matches_pandas_quartiles() {
        let stats = StatsCalculator::describe("pm", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!(close(stats.mean, 2.5));
        assert!(close(stats.std, 1.2909944487358056));
        assert!(close(stats.min, 1.0));
        assert!(close(stats.q25, 1.75));
        assert!(close(stats.median, 2.5));
        assert!(close(stats.q75, 3.25));
        assert!(close(stats.max, 4.0));
    }

    #[test]
    fn describe_of_nothing_is_nan() {
        let stats = StatsCalculator::describe("pm", &[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert_eq!(stats.column, "pm");
    }

    #[test]
    fn single_value_has_undefined_std() {
        let stats = StatsCalculator::describe("pm", &[7.0]);
        assert!(stats.std.is_nan());
        assert!(close(stats.q25, 7.0));
    }

    #[test]
    fn correlation_signs_and_diagonal() {
        let a = series("a", &[Some(1.0), Some(2.0), Some(3.0), None]);
        let b = series("b", &[Some(2.0), Some(4.0), Some(6.0), Some(100.0)]);
        let c = series("c", &[Some(3.0), Some(2.0), Some(1.0), Some(0.0)]);
        let flat = series("flat", &[Some(5.0), Some(5.0), Some(5.0), Some(5.0)]);

        let m = StatsCalculator::correlation_matrix(&[a, b, c, flat]);
        assert!(close(m.values[0][0], 1.0));
        assert!(close(m.values[0][1], 1.0));
        assert!(close(m.values[0][2], -1.0));
        assert!(m.values[3][3].is_nan());
        assert!(m.values[0][3].is_nan());
        assert_eq!(m.labels, vec!["a", "b", "c", "flat"]);
    }

    #[test]
    fn rolling_requires_full_windows() {
        let s = series(
            "pm",
            &[Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0), Some(7.0)],
        );
        let rolling = StatsCalculator::rolling_mean(&[s], 3);
        assert!(!rolling.degraded);
        assert_eq!(
            rolling.series[0].values,
            vec![None, None, Some(2.0), None, None, None, Some(6.0)]
        );
    }

    #[test]
    fn short_series_fall_back_to_raw_values() {
        let s = series("pm", &[Some(1.0), Some(2.0)]);
        let rolling = StatsCalculator::rolling_mean(&[s.clone()], 7);
        assert!(rolling.degraded);
        assert_eq!(rolling.series[0], s);
    }

    #[test]
    fn trendline_recovers_a_line() {
        let x: Vec<Option<f64>> = (0..5).map(|v| Some(v as f64)).collect();
        let mut y: Vec<Option<f64>> = (0..5).map(|v| Some(2.0 * v as f64 + 1.0)).collect();
        y[2] = None;

        let fit = StatsCalculator::trendline(&x, &y).unwrap();
        assert_eq!(fit.n, 4);
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 1.0));
        assert!(close(fit.r_squared, 1.0));
        assert!(close(fit.predict(10.0), 21.0));
    }

    #[test]
    fn trendline_needs_spread_in_x() {
        let x = vec![Some(1.0), Some(1.0), Some(1.0)];
        let y = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert!(StatsCalculator::trendline(&x, &y).is_none());
        assert!(StatsCalculator::trendline(&x[..1], &y[..1]).is_none());
    }

    #[test]
    fn contribution_shares_sum_to_one() {
        let c = StatsCalculator::contribution(&[
            series("a", &[Some(10.0), Some(30.0)]),
            series("b", &[Some(60.0), None]),
            series("c", &[None, None]),
        ]);
        assert!(close(c.means[0], 20.0));
        assert!(close(c.means[1], 60.0));
        assert!(c.means[2].is_nan());
        assert!(close(c.shares[0], 0.25));
        assert!(close(c.shares[1], 0.75));
        assert!(close(c.shares.iter().sum::<f64>(), 1.0));
    }

    #[test]
    fn box_summary_uses_quartiles() {
        let b = StatsCalculator::box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!(close(b.q1, 2.0));
        assert!(close(b.median, 3.0));
        assert!(close(b.q3, 4.0));
        assert!(close(b.whisker_low, 1.0));
        assert!(close(b.whisker_high, 4.0));
        assert!(StatsCalculator::box_summary(&[]).is_none());
    }

    #[test]
    fn report_covers_calendar_aggregates() {
        let csv = "\
Date,PM2.5,NO2
2023-12-30,10,1
2023-12-31,20,x
2024-01-01,30,3
2024-01-01,50,5
2024-02-15,60,6
";
        let r = report(csv, &["PM2.5", "NO2"]);
        assert_eq!(r.days.as_ref().map(Vec::len), Some(4));
        assert_eq!(r.working_rows, 5);
        assert!(r.rolling.degraded);

        // describe runs on the daily means: 2024-01-01 collapses to 40 and 4
        assert_eq!(r.describe[0].count, 4);
        assert!(close(r.describe[0].mean, 32.5));
        assert_eq!(r.describe[1].count, 3);
        assert!(close(r.headline.maximum, 60.0));
        assert!(close(r.headline.minimum, 1.0));

        let monthly = r.monthly.as_ref().unwrap();
        assert_eq!(monthly.months, vec![1, 2, 12]);
        assert_eq!(monthly.series[0].values, vec![Some(40.0), Some(60.0), Some(15.0)]);
        assert_eq!(monthly.series[1].values, vec![Some(4.0), Some(6.0), Some(1.0)]);

        let dist = r.distribution.as_ref().unwrap();
        assert_eq!(dist.months, vec![1, 2, 12]);
        assert_eq!(dist.values[2][0], vec![10.0, 20.0]);
        assert_eq!(dist.values[2][1], vec![1.0]);

        let pivot = &r.heatmaps[0];
        assert_eq!(pivot.pollutant, "PM2.5");
        assert_eq!(pivot.years, vec![2023, 2024]);
        assert_eq!(pivot.cells[0][11], Some(15.0));
        assert_eq!(pivot.cells[1][0], Some(40.0));
        assert_eq!(pivot.cells[1][1], Some(60.0));
        assert_eq!(pivot.cells[0][0], None);
    }

    #[test]
    fn describe_and_headline_use_daily_means() {
        let csv = "\
Date,PM2.5
2024-01-01 01:00,10
2024-01-01 02:00,20
2024-01-01 03:00,30
2024-01-02,100
";
        let r = report(csv, &["PM2.5"]);
        assert_eq!(r.working_rows, 4);
        assert_eq!(r.describe[0].count, 2);
        assert!(close(r.describe[0].mean, 60.0));
        assert!(close(r.describe[0].min, 20.0));
        assert!(close(r.headline.average, 60.0));
        assert!(close(r.headline.maximum, 100.0));
    }

    #[test]
    fn degraded_report_skips_calendar_aggregates() {
        let r = report("Station,PM10,CO\nA,1,2\nB,2,4\nC,3,6\n", &["PM10", "CO"]);
        assert!(r.days.is_none());
        assert!(r.monthly.is_none());
        assert!(r.distribution.is_none());
        assert!(r.heatmaps.is_empty());
        assert!(close(r.correlation.values[0][1], 1.0));
        let fit = r.trendline("PM10", "CO").unwrap();
        assert!(close(fit.slope, 2.0));
    }
}
