//! Static Chart Renderer
//! Exports the dashboard charts as PNG files with the plotters bitmap backend.
//!
//! Files written per export:
//! 1. Daily time series
//! 2. Rolling mean
//! 3. Monthly means (when a calendar is available)
//! 4. Correlation heatmap
//! 5. One year x month heatmap per pollutant
//! 6. Scatter with trend line
//! 7. Mean contribution pie

use crate::charts::style::{self, contrast_text, normalize, viridis};
use crate::stats::{AnalysisReport, PollutantSeries, YearMonthPivot};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};

type RenderResult<T> = Result<T, Box<dyn Error>>;

const FONT: &str = "sans-serif";

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

/// Lower and upper bounds of all present values, padded by 5%.
fn value_range<'a>(values: impl Iterator<Item = &'a Option<f64>>) -> (f64, f64) {
    let (lo, hi) = values
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(0.5);
    (lo - pad, hi + pad)
}

fn axis_range(xs: &[f64]) -> (f64, f64) {
    let (lo, hi) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        (0.0, 1.0)
    } else if hi - lo < 1.0 {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart of `report` into `dir` and return the written paths.
    ///
    /// `scatter` names the (x, y) pollutants of the scatter chart; it defaults
    /// to the first two pollutants and is skipped with fewer than two.
    pub fn export_all(
        report: &AnalysisReport,
        dir: &Path,
        width: u32,
        height: u32,
        scatter: Option<(&str, &str)>,
    ) -> RenderResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let size = (width.max(200), height.max(150));
        let mut written = Vec::new();
        let mut used = HashSet::new();

        let rows = report.daily.first().map_or(0, |s| s.values.len());
        let xs = style::x_positions(report.days.as_deref(), rows);
        let date_axis = report.days.is_some();

        let title = "Daily Pollutant Levels";
        let path = Self::target(dir, title, &mut used);
        Self::render_series(&path, size, title, &xs, &report.daily, date_axis)?;
        written.push(path);

        let title = if report.rolling.degraded {
            "Daily Pollutant Levels (rolling mean unavailable)".to_string()
        } else {
            format!("{}-Day Rolling Mean", report.rolling.window)
        };
        let path = Self::target(dir, &title, &mut used);
        Self::render_series(&path, size, &title, &xs, &report.rolling.series, date_axis)?;
        written.push(path);

        if let Some(monthly) = &report.monthly {
            let title = "Monthly Average Concentration";
            let path = Self::target(dir, title, &mut used);
            let months: Vec<f64> = monthly.months.iter().map(|&m| m as f64).collect();
            Self::render_monthly(&path, size, title, &months, &monthly.series)?;
            written.push(path);
        }

        if !report.correlation.labels.is_empty() {
            let title = "Correlation Between Pollutants";
            let path = Self::target(dir, title, &mut used);
            let cells: Vec<Vec<Option<f64>>> = report
                .correlation
                .values
                .iter()
                .map(|row| row.iter().map(|v| (!v.is_nan()).then_some(*v)).collect())
                .collect();
            let labels = &report.correlation.labels;
            Self::render_heatmap(&path, size, title, labels, labels, &cells, Some((-1.0, 1.0)))?;
            written.push(path);
        }

        for pivot in &report.heatmaps {
            let title = format!("Monthly Means of {} by Year", pivot.pollutant);
            let path = Self::target(dir, &title, &mut used);
            Self::render_pivot(&path, size, &title, pivot)?;
            written.push(path);
        }

        let pair = scatter.or_else(|| match report.pollutants.as_slice() {
            [x, y, ..] => Some((x.as_str(), y.as_str())),
            _ => None,
        });
        if let Some((x_name, y_name)) = pair {
            if let (Some(x), Some(y)) = (report.series(x_name), report.series(y_name)) {
                let title = format!("{} vs {}", y_name, x_name);
                let path = Self::target(dir, &title, &mut used);
                Self::render_scatter(&path, size, &title, report, x, y)?;
                written.push(path);
            }
        }

        if report.contribution.shares.iter().any(|s| *s > 0.0) {
            let title = "Pollutant Contribution by Mean Level";
            let path = Self::target(dir, title, &mut used);
            Self::render_pie(&path, size, title, report)?;
            written.push(path);
        }

        log::info!("Exported {} charts to {}", written.len(), dir.display());
        Ok(written)
    }

    fn target(dir: &Path, title: &str, used: &mut HashSet<String>) -> PathBuf {
        dir.join(format!("{}.png", unique_name(title, used)))
    }

    fn render_series(
        path: &Path,
        size: (u32, u32),
        title: &str,
        xs: &[f64],
        series: &[PollutantSeries],
        date_axis: bool,
    ) -> RenderResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_lo, x_hi) = axis_range(xs);
        let (y_lo, y_hi) = value_range(series.iter().flat_map(|s| s.values.iter()));

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        let x_fmt = move |x: &f64| {
            if date_axis {
                style::format_day(*x)
            } else {
                format!("{:.0}", x)
            }
        };
        chart
            .configure_mesh()
            .x_desc(if date_axis { "Date" } else { "Row" })
            .y_desc("Concentration")
            .x_labels(8)
            .x_label_formatter(&x_fmt)
            .label_style((FONT, 14))
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            let color = rgb(style::series_color(i));
            for (k, run) in style::segments(xs, &s.values).into_iter().enumerate() {
                let points = run.into_iter().map(|[x, y]| (x, y));
                let drawn = chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
                if k == 0 {
                    drawn.label(s.name.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 14))
            .draw()?;
        root.present()?;
        Ok(())
    }

    fn render_monthly(
        path: &Path,
        size: (u32, u32),
        title: &str,
        months: &[f64],
        series: &[PollutantSeries],
    ) -> RenderResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (_, y_hi) = value_range(series.iter().flat_map(|s| s.values.iter()));
        let y_lo = series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold(0.0_f64, |lo, &v| lo.min(v));

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(0.5..12.5, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc("Month")
            .y_desc("Average Concentration")
            .x_labels(12)
            .x_label_formatter(&|x: &f64| {
                let m = x.round();
                if (x - m).abs() < 1e-6 {
                    style::month_name(m as u32).to_string()
                } else {
                    String::new()
                }
            })
            .label_style((FONT, 14))
            .draw()?;

        let as_bars = months.len() <= 2;
        let n = series.len().max(1) as f64;
        let bar_width = 0.8 / n;

        for (i, s) in series.iter().enumerate() {
            let color = rgb(style::series_color(i));
            let drawn = if as_bars {
                let offset = (i as f64 - (n - 1.0) / 2.0) * bar_width;
                let bars: Vec<Rectangle<(f64, f64)>> = months
                    .iter()
                    .zip(&s.values)
                    .filter_map(|(&m, v)| {
                        let x0 = m + offset - bar_width / 2.0;
                        Some(Rectangle::new([(x0, 0.0), (x0 + bar_width, (*v)?)], color.filled()))
                    })
                    .collect();
                chart.draw_series(bars)?
            } else {
                let points: Vec<(f64, f64)> = months
                    .iter()
                    .zip(&s.values)
                    .filter_map(|(&m, v)| Some((m, (*v)?)))
                    .collect();
                chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?
            };
            drawn
                .label(s.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 14))
            .draw()?;
        root.present()?;
        Ok(())
    }

    fn render_pivot(path: &Path, size: (u32, u32), title: &str, pivot: &YearMonthPivot) -> RenderResult<()> {
        let rows: Vec<String> = pivot.years.iter().map(|y| y.to_string()).collect();
        let cols: Vec<String> = style::MONTH_NAMES.iter().map(|m| m.to_string()).collect();
        let cells: Vec<Vec<Option<f64>>> = pivot.cells.iter().map(|row| row.to_vec()).collect();
        Self::render_heatmap(path, size, title, &rows, &cols, &cells, None)
    }

    /// Annotated heatmap; row 0 is drawn at the top.
    fn render_heatmap(
        path: &Path,
        size: (u32, u32),
        title: &str,
        rows: &[String],
        cols: &[String],
        cells: &[Vec<Option<f64>>],
        range: Option<(f64, f64)>,
    ) -> RenderResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (lo, hi) = range.unwrap_or_else(|| {
            cells
                .iter()
                .flatten()
                .flatten()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        });

        let n_rows = rows.len().max(1) as i32;
        let n_cols = cols.len().max(1) as i32;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(110)
            .build_cartesian_2d((0..n_cols).into_segmented(), (0..n_rows).into_segmented())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(cols.len())
            .y_labels(rows.len())
            .x_label_formatter(&|v| segment_label(cols, v, false))
            .y_label_formatter(&|v| segment_label(rows, v, true))
            .label_style((FONT, 14))
            .draw()?;

        let font_size = if cols.len() > 8 { 12 } else { 16 };
        for (r, row) in cells.iter().enumerate() {
            let y = n_rows - 1 - r as i32;
            for c in 0..cols.len() {
                let x = c as i32;
                let value = row.get(c).copied().flatten();
                let fill = value.map(|v| viridis(normalize(v, lo, hi))).unwrap_or(style::EMPTY_CELL);

                let corners = [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ];
                chart.draw_series(std::iter::once(Rectangle::new(corners, rgb(fill).filled())))?;

                if let Some(v) = value {
                    let text_style = (FONT, font_size)
                        .into_font()
                        .color(&rgb(contrast_text(fill)))
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    chart.draw_series(std::iter::once(Text::new(
                        format!("{:.2}", v),
                        (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                        text_style,
                    )))?;
                }
            }
        }

        root.present()?;
        Ok(())
    }

    fn render_scatter(
        path: &Path,
        size: (u32, u32),
        title: &str,
        report: &AnalysisReport,
        x: &PollutantSeries,
        y: &PollutantSeries,
    ) -> RenderResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let points: Vec<(f64, f64)> = x
            .values
            .iter()
            .zip(&y.values)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .collect();
        let (x_lo, x_hi) = value_range(x.values.iter());
        let (y_lo, y_hi) = value_range(y.values.iter());

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc(x.name.as_str())
            .y_desc(y.name.as_str())
            .label_style((FONT, 14))
            .draw()?;

        let dot = rgb(style::SCATTER_COLOR);
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 4, dot.mix(0.7).filled())))?
            .label(title)
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, dot.filled()));

        if let Some(fit) = report.trendline(&x.name, &y.name) {
            let line = vec![(x_lo, fit.predict(x_lo)), (x_hi, fit.predict(x_hi))];
            let trend = rgb(style::TREND_COLOR);
            chart
                .draw_series(LineSeries::new(line, trend.stroke_width(2)))?
                .label(format!("OLS trend (R² = {:.3})", fit.r_squared))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], trend.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 14))
            .draw()?;
        root.present()?;
        Ok(())
    }

    fn render_pie(path: &Path, size: (u32, u32), title: &str, report: &AnalysisReport) -> RenderResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(title, (FONT, 28))?;

        let (w, h) = root.dim_in_pixel();
        let radius = (w.min(h) as f64 * 0.4).max(10.0);
        let center = (w as f64 * 0.4, h as f64 / 2.0);
        let contribution = &report.contribution;

        let mut start = -std::f64::consts::FRAC_PI_2;
        for (i, share) in contribution.shares.iter().enumerate() {
            if *share <= 0.0 {
                continue;
            }
            let sweep = share * std::f64::consts::TAU;
            let color = rgb(style::series_color(i));
            root.draw(&Polygon::new(slice_points(center, radius, start, sweep), color.filled()))?;

            let mid = start + sweep / 2.0;
            let label_pos = (
                (center.0 + radius * 0.65 * mid.cos()) as i32,
                (center.1 + radius * 0.65 * mid.sin()) as i32,
            );
            let text_style = (FONT, 16)
                .into_font()
                .color(&rgb(contrast_text(style::series_color(i))))
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new(format!("{:.1}%", share * 100.0), label_pos, text_style))?;
            start += sweep;
        }

        let legend_x = (center.0 + radius + 40.0) as i32;
        for (i, label) in contribution.labels.iter().enumerate() {
            let y = (h as i32 / 2) - (contribution.labels.len() as i32 * 14) + i as i32 * 28;
            let color = rgb(style::series_color(i));
            root.draw(&Rectangle::new([(legend_x, y), (legend_x + 18, y + 18)], color.filled()))?;
            root.draw(&Text::new(
                format!("{}  ({:.1}%)", label, contribution.shares[i] * 100.0),
                (legend_x + 28, y + 2),
                (FONT, 16).into_font(),
            ))?;
        }

        root.present()?;
        Ok(())
    }
}

/// Label of a heatmap row or column; `flip` counts from the bottom.
fn segment_label(labels: &[String], value: &SegmentValue<i32>, flip: bool) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            let idx = if flip { labels.len() as i32 - 1 - *i } else { *i };
            usize::try_from(idx)
                .ok()
                .and_then(|idx| labels.get(idx))
                .cloned()
                .unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

/// Slug of `title`, suffixed with a counter when an earlier chart already
/// took it.
fn unique_name(title: &str, used: &mut HashSet<String>) -> String {
    let base = style::slug(title);
    let mut name = base.clone();
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{}_{}", base, n);
        n += 1;
    }
    name
}

/// Pixel outline of a pie slice starting at `start` radians.
fn slice_points(center: (f64, f64), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / std::f64::consts::TAU) * 120.0).ceil().max(2.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0 as i32, center.1 as i32));
    for s in 0..=steps {
        let a = start + sweep * s as f64 / steps as f64;
        points.push((
            (center.0 + radius * a.cos()).round() as i32,
            (center.1 + radius * a.sin()).round() as i32,
        ));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_pads_and_handles_empty() {
        assert_eq!(value_range([None, None].iter()), (0.0, 1.0));
        let (lo, hi) = value_range([Some(10.0), None, Some(30.0)].iter());
        assert!(lo < 10.0 && hi > 30.0);
    }

    #[test]
    fn single_point_axis_is_widened() {
        assert_eq!(axis_range(&[5.0]), (4.5, 5.5));
        assert_eq!(axis_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn colliding_titles_get_distinct_files() {
        let mut used = HashSet::new();
        let dir = Path::new("out");
        let a = StaticChartRenderer::target(dir, "Monthly Means of PM2.5 by Year", &mut used);
        let b = StaticChartRenderer::target(dir, "Monthly Means of PM2_5 by Year", &mut used);
        let c = StaticChartRenderer::target(dir, "Monthly Means of PM2 5 by Year", &mut used);
        assert_eq!(a, dir.join("monthly_means_of_pm2_5_by_year.png"));
        assert_eq!(b, dir.join("monthly_means_of_pm2_5_by_year_2.png"));
        assert_eq!(c, dir.join("monthly_means_of_pm2_5_by_year_3.png"));
    }

    #[test]
    fn slice_starts_at_center() {
        let pts = slice_points((100.0, 100.0), 50.0, 0.0, std::f64::consts::PI);
        assert_eq!(pts[0], (100, 100));
        assert_eq!(pts[1], (150, 100));
        assert_eq!(*pts.last().unwrap(), (50, 100));
    }
}
