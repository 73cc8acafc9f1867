//! Chart Plotter Module
//! Creates interactive visualizations of an analysis report using egui_plot
//! and the egui painter.

use crate::charts::style::{self, contrast_text, normalize, viridis, yl_or_rd};
use crate::stats::{
    AnalysisReport, Contribution, CorrelationMatrix, DescriptiveStats, HeadlineMetrics,
    MonthlyDistribution, MonthlyMeans, PollutantSeries, StatsCalculator, Trendline,
    YearMonthPivot,
};
use egui::{Align2, Color32, FontId, Pos2, RichText, Sense, Shape, Stroke, Vec2};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};

const CHART_HEIGHT: f32 = 300.0;
const HEATMAP_CELL: f32 = 56.0;
const HEATMAP_LABEL: f32 = 80.0;

fn rgb((r, g, b): (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(r, g, b)
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}", v)
    }
}

/// Creates the dashboard's interactive charts.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        rgb(style::series_color(index))
    }

    /// Three metric cards: overall average, maximum and minimum.
    pub fn draw_headline(ui: &mut egui::Ui, headline: &HeadlineMetrics) {
        ui.horizontal(|ui| {
            for (label, value) in [
                ("Average (overall)", headline.average),
                ("Maximum observed", headline.maximum),
                ("Minimum observed", headline.minimum),
            ] {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(6.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_min_width(160.0);
                        ui.vertical(|ui| {
                            ui.label(RichText::new(label).size(12.0).color(Color32::GRAY));
                            ui.label(RichText::new(fmt_value(value)).size(24.0).strong());
                        });
                    });
                ui.add_space(10.0);
            }
        });
    }

    /// Describe-style statistics table with a yellow-to-red mean gradient.
    pub fn draw_describe_table(ui: &mut egui::Ui, stats: &[DescriptiveStats]) {
        let (lo, hi) = stats
            .iter()
            .filter(|s| !s.mean.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.mean), hi.max(s.mean))
            });

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("describe_table")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        for header in [
                            "Pollutant", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max",
                        ] {
                            ui.label(RichText::new(header).strong().size(12.0));
                        }
                        ui.end_row();

                        for s in stats {
                            ui.label(RichText::new(&s.column).size(12.0).strong());
                            ui.label(RichText::new(s.count.to_string()).size(12.0));

                            let bg = rgb(yl_or_rd(normalize(s.mean, lo, hi)));
                            ui.label(
                                RichText::new(fmt_value(s.mean))
                                    .size(12.0)
                                    .color(Color32::BLACK)
                                    .background_color(bg),
                            );
                            for v in [s.std, s.min, s.q25, s.median, s.q75, s.max] {
                                ui.label(RichText::new(fmt_value(v)).size(12.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    /// Line chart of one value per daily row for every pollutant.
    ///
    /// Gaps split a line into several segments that share a legend entry.
    pub fn draw_series_chart(
        ui: &mut egui::Ui,
        id: &str,
        xs: &[f64],
        series: &[PollutantSeries],
        date_axis: bool,
    ) {
        let mut plot = Plot::new(id)
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label(if date_axis { "Date" } else { "Row" })
            .y_axis_label("Concentration");
        if date_axis {
            plot = plot.x_axis_formatter(|mark, _range| style::format_day(mark.value));
        }

        plot.show(ui, |plot_ui| {
            for (i, s) in series.iter().enumerate() {
                let color = Self::series_color(i);
                for run in style::segments(xs, &s.values) {
                    if run.len() == 1 {
                        plot_ui.points(
                            Points::new(PlotPoints::from(run))
                                .radius(2.5)
                                .color(color)
                                .name(&s.name),
                        );
                    } else {
                        plot_ui.line(
                            Line::new(PlotPoints::from(run))
                                .color(color)
                                .width(1.5)
                                .name(&s.name),
                        );
                    }
                }
            }
        });
    }

    /// Monthly means: grouped bars for one or two months, lines otherwise.
    pub fn draw_monthly(ui: &mut egui::Ui, monthly: &MonthlyMeans) {
        let months: Vec<f64> = monthly.months.iter().map(|&m| m as f64).collect();
        let as_bars = monthly.months.len() <= 2;
        let n = monthly.series.len().max(1) as f64;
        let bar_width = 0.8 / n;

        Plot::new("monthly_means")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Month")
            .y_axis_label("Average Concentration")
            .x_axis_formatter(|mark, _range| {
                let m = mark.value.round();
                if (mark.value - m).abs() < 1e-6 && (1.0..=12.0).contains(&m) {
                    style::month_name(m as u32).to_string()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                for (i, s) in monthly.series.iter().enumerate() {
                    let color = Self::series_color(i);
                    if as_bars {
                        let offset = (i as f64 - (n - 1.0) / 2.0) * bar_width;
                        let bars: Vec<Bar> = months
                            .iter()
                            .zip(&s.values)
                            .filter_map(|(&m, v)| Some(Bar::new(m + offset, (*v)?).width(bar_width)))
                            .collect();
                        plot_ui.bar_chart(BarChart::new(bars).color(color).name(&s.name));
                    } else {
                        for run in style::segments(&months, &s.values) {
                            plot_ui.line(
                                Line::new(PlotPoints::from(run))
                                    .color(color)
                                    .width(2.0)
                                    .name(&s.name),
                            );
                        }
                    }
                }
            });
    }

    /// Box plots of daily values per month, one box per pollutant.
    pub fn draw_monthly_boxplot(ui: &mut egui::Ui, dist: &MonthlyDistribution) {
        let n = dist.pollutants.len().max(1) as f64;
        let box_width = 0.8 / n;
        let labels: Vec<String> = dist
            .months
            .iter()
            .map(|&m| style::month_name(m).to_string())
            .collect();

        Plot::new("monthly_boxplot")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Month")
            .y_axis_label("Value")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                for (p_idx, name) in dist.pollutants.iter().enumerate() {
                    let color = Self::series_color(p_idx);
                    let offset = (p_idx as f64 - (n - 1.0) / 2.0) * box_width;

                    let boxes: Vec<BoxElem> = dist
                        .values
                        .iter()
                        .enumerate()
                        .filter_map(|(m_idx, per_pollutant)| {
                            let summary = StatsCalculator::box_summary(per_pollutant.get(p_idx)?)?;
                            Some(
                                BoxElem::new(
                                    m_idx as f64 + offset,
                                    BoxSpread::new(
                                        summary.whisker_low,
                                        summary.q1,
                                        summary.median,
                                        summary.q3,
                                        summary.whisker_high,
                                    ),
                                )
                                .box_width(box_width * 0.9)
                                .fill(color.gamma_multiply(0.3))
                                .stroke(Stroke::new(1.5, color)),
                            )
                        })
                        .collect();

                    plot_ui.box_plot(BoxPlot::new(boxes).name(name));
                }
            });
    }

    /// Correlation matrix as an annotated heatmap.
    pub fn draw_correlation(ui: &mut egui::Ui, matrix: &CorrelationMatrix) {
        let cells: Vec<Vec<Option<f64>>> = matrix
            .values
            .iter()
            .map(|row| row.iter().map(|v| (!v.is_nan()).then_some(*v)).collect())
            .collect();
        Self::draw_heatmap(ui, &matrix.labels, &matrix.labels, &cells, Some((-1.0, 1.0)));
    }

    /// Year x month heatmap of one pollutant's monthly means.
    pub fn draw_year_month_heatmap(ui: &mut egui::Ui, pivot: &YearMonthPivot) {
        let rows: Vec<String> = pivot.years.iter().map(|y| y.to_string()).collect();
        let cols: Vec<String> = style::MONTH_NAMES.iter().map(|m| m.to_string()).collect();
        let cells: Vec<Vec<Option<f64>>> = pivot.cells.iter().map(|row| row.to_vec()).collect();
        Self::draw_heatmap(ui, &rows, &cols, &cells, None);
    }

    /// Grid of colored, annotated cells. `range` defaults to the data range.
    fn draw_heatmap(
        ui: &mut egui::Ui,
        rows: &[String],
        cols: &[String],
        cells: &[Vec<Option<f64>>],
        range: Option<(f64, f64)>,
    ) {
        let (lo, hi) = range.unwrap_or_else(|| {
            cells
                .iter()
                .flatten()
                .flatten()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        });

        let cell_w = if cols.len() > 6 { HEATMAP_CELL * 0.8 } else { HEATMAP_CELL };
        let size = Vec2::new(
            HEATMAP_LABEL + cell_w * cols.len() as f32,
            24.0 + HEATMAP_CELL * 0.6 * rows.len() as f32,
        );
        let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
        let painter = ui.painter_at(rect);
        let text_color = ui.visuals().text_color();
        let cell_h = HEATMAP_CELL * 0.6;

        for (c, label) in cols.iter().enumerate() {
            let center = Pos2::new(
                rect.left() + HEATMAP_LABEL + cell_w * (c as f32 + 0.5),
                rect.top() + 12.0,
            );
            painter.text(center, Align2::CENTER_CENTER, label, FontId::proportional(11.0), text_color);
        }

        for (r, label) in rows.iter().enumerate() {
            let top = rect.top() + 24.0 + cell_h * r as f32;
            painter.text(
                Pos2::new(rect.left() + HEATMAP_LABEL - 6.0, top + cell_h / 2.0),
                Align2::RIGHT_CENTER,
                label,
                FontId::proportional(11.0),
                text_color,
            );

            for c in 0..cols.len() {
                let cell = egui::Rect::from_min_size(
                    Pos2::new(rect.left() + HEATMAP_LABEL + cell_w * c as f32, top),
                    Vec2::new(cell_w - 2.0, cell_h - 2.0),
                );
                let value = cells.get(r).and_then(|row| row.get(c)).copied().flatten();
                match value {
                    Some(v) => {
                        let fill = viridis(normalize(v, lo, hi));
                        painter.rect_filled(cell, 2.0, rgb(fill));
                        painter.text(
                            cell.center(),
                            Align2::CENTER_CENTER,
                            format!("{:.2}", v),
                            FontId::proportional(10.0),
                            rgb(contrast_text(fill)),
                        );
                    }
                    None => {
                        painter.rect_filled(cell, 2.0, rgb(style::EMPTY_CELL));
                    }
                }
            }
        }
    }

    /// Scatter of two pollutants with the least squares trend line.
    pub fn draw_scatter(
        ui: &mut egui::Ui,
        x: &PollutantSeries,
        y: &PollutantSeries,
        trend: Option<Trendline>,
    ) {
        let points: Vec<[f64; 2]> = x
            .values
            .iter()
            .zip(&y.values)
            .filter_map(|(a, b)| Some([(*a)?, (*b)?]))
            .collect();
        let (x_min, x_max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

        Plot::new("pollutant_scatter")
            .height(CHART_HEIGHT + 60.0)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label(x.name.clone())
            .y_axis_label(y.name.clone())
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .radius(3.0)
                        .color(rgb(style::SCATTER_COLOR).gamma_multiply(0.7))
                        .name(format!("{} vs {}", y.name, x.name)),
                );
                if let Some(fit) = trend {
                    let line = vec![[x_min, fit.predict(x_min)], [x_max, fit.predict(x_max)]];
                    plot_ui.line(
                        Line::new(PlotPoints::from(line))
                            .color(rgb(style::TREND_COLOR))
                            .width(2.0)
                            .name(format!("OLS trend (R² = {:.3})", fit.r_squared)),
                    );
                }
            });
    }

    /// Pie of each pollutant's share of the summed means, with a legend.
    pub fn draw_contribution(ui: &mut egui::Ui, contribution: &Contribution) {
        ui.horizontal(|ui| {
            let diameter = 220.0;
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(diameter), Sense::hover());
            let painter = ui.painter_at(rect);
            let center = rect.center();
            let radius = diameter / 2.0 - 4.0;

            let mut start = -std::f64::consts::FRAC_PI_2;
            for (i, share) in contribution.shares.iter().enumerate() {
                if *share <= 0.0 {
                    continue;
                }
                let sweep = share * std::f64::consts::TAU;
                for points in pie_wedges(center, radius, start, sweep) {
                    painter.add(Shape::convex_polygon(
                        points,
                        Self::series_color(i),
                        Stroke::new(1.0, Color32::WHITE),
                    ));
                }
                start += sweep;
            }

            ui.add_space(16.0);
            ui.vertical(|ui| {
                for (i, label) in contribution.labels.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let (swatch, _) = ui.allocate_exact_size(Vec2::splat(14.0), Sense::hover());
                        ui.painter().rect_filled(swatch, 3.0, Self::series_color(i));
                        ui.label(format!(
                            "{}  mean {}  ({:.1}%)",
                            label,
                            fmt_value(contribution.means[i]),
                            contribution.shares[i] * 100.0
                        ));
                    });
                }
            });
        });
    }

    /// x coordinates of the report's daily rows.
    pub fn x_positions(report: &AnalysisReport) -> Vec<f64> {
        let rows = report.daily.first().map(|s| s.values.len()).unwrap_or(0);
        style::x_positions(report.days.as_deref(), rows)
    }
}

/// Convex polygons covering a pie slice, each spanning at most a quarter turn.
fn pie_wedges(center: Pos2, radius: f32, start: f64, sweep: f64) -> Vec<Vec<Pos2>> {
    let quarter = std::f64::consts::FRAC_PI_2;
    let pieces = (sweep / quarter).ceil().max(1.0) as usize;
    let piece_sweep = sweep / pieces as f64;

    (0..pieces)
        .map(|p| {
            let a0 = start + piece_sweep * p as f64;
            let steps = 16;
            let mut points = Vec::with_capacity(steps + 2);
            points.push(center);
            for s in 0..=steps {
                let a = a0 + piece_sweep * s as f64 / steps as f64;
                points.push(Pos2::new(
                    center.x + radius * a.cos() as f32,
                    center.y + radius * a.sin() as f32,
                ));
            }
            points
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_circle_splits_into_quarters() {
        let wedges = pie_wedges(Pos2::ZERO, 10.0, 0.0, std::f64::consts::TAU);
        assert_eq!(wedges.len(), 4);
        assert!(wedges.iter().all(|w| w[0] == Pos2::ZERO && w.len() == 18));
    }

    #[test]
    fn small_slice_is_one_wedge() {
        assert_eq!(pie_wedges(Pos2::ZERO, 10.0, 0.0, 0.3).len(), 1);
    }

    #[test]
    fn nan_values_render_as_dash() {
        assert_eq!(fmt_value(f64::NAN), "-");
        assert_eq!(fmt_value(1.234), "1.23");
    }
}
