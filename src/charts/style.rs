//! Shared chart styling: series palette, heatmap color scale and date axis
//! helpers used by both the interactive and the static charts.

use crate::data::EPOCH_DAYS_FROM_CE;
use chrono::{Datelike, NaiveDate};

/// Series colors (RGB), cycled per pollutant.
pub const PALETTE: [(u8, u8, u8); 10] = [
    (231, 76, 60),  // Red
    (52, 152, 219), // Blue
    (46, 204, 113), // Green
    (155, 89, 182), // Purple
    (243, 156, 18), // Orange
    (26, 188, 156), // Teal
    (233, 30, 99),  // Pink
    (0, 188, 212),  // Cyan
    (121, 85, 72),  // Brown
    (96, 125, 139), // Blue Grey
];

/// Color used for the regression line.
pub const TREND_COLOR: (u8, u8, u8) = (30, 30, 30);
/// Scatter point color.
pub const SCATTER_COLOR: (u8, u8, u8) = (255, 99, 71);
/// Heatmap cells without data.
pub const EMPTY_CELL: (u8, u8, u8) = (235, 235, 235);

/// Anchor points of the viridis color map.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

pub fn series_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

/// Viridis color for `t` in [0, 1]; out-of-range values are clamped.
pub fn viridis(t: f64) -> (u8, u8, u8) {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - idx as f64;

    let (r0, g0, b0) = VIRIDIS[idx];
    let (r1, g1, b1) = VIRIDIS[idx + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Yellow-to-red scale for table backgrounds, `t` in [0, 1].
pub fn yl_or_rd(t: f64) -> (u8, u8, u8) {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let (r0, g0, b0) = (255.0, 255.0, 178.0);
    let (r1, g1, b1) = (189.0, 0.0, 38.0);
    (
        (r0 + (r1 - r0) * t).round() as u8,
        (g0 + (g1 - g0) * t).round() as u8,
        (b0 + (b1 - b0) * t).round() as u8,
    )
}

/// Position of `value` inside [min, max], 0.5 for a flat range.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        0.5
    } else {
        (value - min) / (max - min)
    }
}

/// Text color readable on top of `background`.
pub fn contrast_text(background: (u8, u8, u8)) -> (u8, u8, u8) {
    let (r, g, b) = background;
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luma > 140.0 {
        (0, 0, 0)
    } else {
        (255, 255, 255)
    }
}

/// Days since 1970-01-01, the x coordinate of date axes.
pub fn day_to_x(day: NaiveDate) -> f64 {
    (day.num_days_from_ce() - EPOCH_DAYS_FROM_CE) as f64
}

pub fn x_to_day(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    let days = i32::try_from(x.round() as i64).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Axis label for an x coordinate on a date axis.
pub fn format_day(x: f64) -> String {
    x_to_day(x)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// x coordinates of the daily rows: dates when known, row numbers otherwise.
pub fn x_positions(days: Option<&[NaiveDate]>, rows: usize) -> Vec<f64> {
    match days {
        Some(days) => days.iter().copied().map(day_to_x).collect(),
        None => (0..rows).map(|i| i as f64).collect(),
    }
}

/// Split a series with gaps into contiguous runs of points.
pub fn segments(xs: &[f64], values: &[Option<f64>]) -> Vec<Vec<[f64; 2]>> {
    let mut runs: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for (&x, v) in xs.iter().zip(values) {
        match v {
            Some(y) => current.push([x, *y]),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|m| MONTH_NAMES.get(m as usize))
        .copied()
        .unwrap_or("?")
}

/// Lowercase file-name slug of a chart title.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_endpoints_and_clamping() {
        assert_eq!(viridis(0.0), (68, 1, 84));
        assert_eq!(viridis(1.0), (253, 231, 37));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(f64::NAN), viridis(0.0));
    }

    #[test]
    fn date_axis_round_trip() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(x_to_day(day_to_x(day)), Some(day));
        assert_eq!(day_to_x(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1.0);
        assert_eq!(format_day(0.0), "1970-01-01");
        assert_eq!(format_day(f64::NAN), "");
    }

    #[test]
    fn date_axis_matches_daily_date_column() {
        use crate::config::AnalysisConfig;
        use crate::data::{prepare, PipelineRequest};
        use polars::prelude::DataType;

        let csv = "Date,NO2\n2024-03-01,1\n2024-03-02,2\n";
        let request = PipelineRequest {
            selection: vec!["NO2".to_string()],
            range: None,
        };
        let out = prepare(csv.as_bytes(), &request, &AnalysisConfig::default()).unwrap();
        let stored: Vec<Option<i32>> = out
            .daily
            .frame()
            .column("Date")
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        let axis: Vec<Option<i32>> = out
            .daily
            .days()
            .unwrap()
            .iter()
            .map(|d| Some(day_to_x(*d) as i32))
            .collect();
        assert_eq!(stored, axis);
    }

    #[test]
    fn segments_break_on_gaps() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values = [Some(1.0), None, Some(3.0), Some(4.0), None];
        let runs = segments(&xs, &values);
        assert_eq!(runs, vec![vec![[0.0, 1.0]], vec![[2.0, 3.0], [3.0, 4.0]]]);
    }

    #[test]
    fn degraded_positions_are_row_numbers() {
        assert_eq!(x_positions(None, 3), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn slugs_are_file_safe() {
        assert_eq!(slug("Monthly Means of PM2.5 by Year"), "monthly_means_of_pm2_5_by_year");
        assert_eq!(slug("  7-Day Rolling  "), "7_day_rolling");
    }

    #[test]
    fn month_names_are_bounded() {
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
        assert_eq!(month_name(0), "?");
        assert_eq!(month_name(13), "?");
    }

    #[test]
    fn contrast_prefers_black_on_light() {
        assert_eq!(contrast_text((253, 231, 37)), (0, 0, 0));
        assert_eq!(contrast_text((68, 1, 84)), (255, 255, 255));
    }
}
