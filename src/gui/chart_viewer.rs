//! Chart Viewer Widget
//! Right side scrollable dashboard drawing every section of an analysis report.

use crate::charts::ChartPlotter;
use crate::stats::AnalysisReport;
use egui::{Color32, ComboBox, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;

/// Scrollable dashboard of the latest analysis report.
#[derive(Default)]
pub struct ChartViewer {
    pub report: Option<AnalysisReport>,
    /// Fatal error of the latest run, shown instead of charts.
    pub error: Option<String>,
    xs: Vec<f64>,
    pub scatter_x: String,
    pub scatter_y: String,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all charts
    pub fn clear(&mut self) {
        self.report = None;
        self.error = None;
        self.xs.clear();
    }

    pub fn set_error(&mut self, message: String) {
        self.clear();
        self.error = Some(message);
    }

    /// Show a new report, keeping the scatter pickers when still valid.
    pub fn set_report(&mut self, report: AnalysisReport) {
        let names = &report.pollutants;
        if !names.contains(&self.scatter_x) {
            self.scatter_x = names.first().cloned().unwrap_or_default();
        }
        if !names.contains(&self.scatter_y) || self.scatter_y == self.scatter_x {
            self.scatter_y = names
                .iter()
                .find(|n| **n != self.scatter_x)
                .or_else(|| names.first())
                .cloned()
                .unwrap_or_default();
        }
        self.xs = ChartPlotter::x_positions(&report);
        self.error = None;
        self.report = Some(report);
    }

    pub fn scatter_pair(&self) -> Option<(&str, &str)> {
        if self.scatter_x.is_empty() || self.scatter_y.is_empty() {
            None
        } else {
            Some((self.scatter_x.as_str(), self.scatter_y.as_str()))
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        if let Some(error) = &self.error {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new(error)
                        .size(16.0)
                        .color(Color32::from_rgb(220, 53, 69)),
                );
            });
            return;
        }

        let Some(report) = &self.report else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let xs = &self.xs;
        let scatter_x = &mut self.scatter_x;
        let scatter_y = &mut self.scatter_y;
        let date_axis = report.days.is_some();

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(format!(
                    "Air-quality overview: {}",
                    report.pollutants.join(", ")
                ));
                ui.label(
                    RichText::new(format!(
                        "{} readings, {} daily rows",
                        report.working_rows,
                        report.daily.first().map_or(0, |s| s.values.len())
                    ))
                    .color(Color32::GRAY),
                );
                ui.add_space(SECTION_SPACING);

                ChartPlotter::draw_headline(ui, &report.headline);
                ui.add_space(SECTION_SPACING);

                section(ui, "Descriptive statistics", |ui| {
                    ChartPlotter::draw_describe_table(ui, &report.describe);
                });

                section(ui, "Daily levels", |ui| {
                    ChartPlotter::draw_series_chart(ui, "daily_levels", xs, &report.daily, date_axis);
                });

                let rolling_title = if report.rolling.degraded {
                    "Daily levels (too few days for a rolling mean)".to_string()
                } else {
                    format!("{}-day rolling mean", report.rolling.window)
                };
                section(ui, &rolling_title, |ui| {
                    ChartPlotter::draw_series_chart(ui, "rolling_mean", xs, &report.rolling.series, date_axis);
                });

                match (&report.monthly, &report.distribution) {
                    (Some(monthly), Some(dist)) => {
                        section(ui, "Monthly averages", |ui| {
                            ChartPlotter::draw_monthly(ui, monthly);
                        });
                        section(ui, "Monthly distribution", |ui| {
                            ChartPlotter::draw_monthly_boxplot(ui, dist);
                        });
                    }
                    _ => {
                        ui.label(
                            RichText::new("Monthly charts need a time column")
                                .color(Color32::GRAY),
                        );
                        ui.add_space(SECTION_SPACING);
                    }
                }

                section(ui, "Correlation between pollutants", |ui| {
                    ChartPlotter::draw_correlation(ui, &report.correlation);
                });

                for pivot in &report.heatmaps {
                    section(ui, &format!("{} by year and month", pivot.pollutant), |ui| {
                        ScrollArea::horizontal()
                            .id_salt(format!("pivot_{}", pivot.pollutant))
                            .show(ui, |ui| ChartPlotter::draw_year_month_heatmap(ui, pivot));
                    });
                }

                section(ui, "Pollutant relationship", |ui| {
                    ui.horizontal(|ui| {
                        pollutant_combo(ui, "scatter_x", "X:", scatter_x, &report.pollutants);
                        ui.add_space(20.0);
                        pollutant_combo(ui, "scatter_y", "Y:", scatter_y, &report.pollutants);
                    });
                    match (report.series(scatter_x), report.series(scatter_y)) {
                        (Some(x), Some(y)) => {
                            ChartPlotter::draw_scatter(ui, x, y, report.trendline(scatter_x, scatter_y));
                        }
                        _ => {
                            ui.label("Pick two pollutants");
                        }
                    }
                });

                section(ui, "Contribution by mean level", |ui| {
                    ChartPlotter::draw_contribution(ui, &report.contribution);
                });
            });
    }
}

fn section(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .rounding(8.0)
        .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(title).size(16.0).strong());
            ui.add_space(8.0);
            add_contents(ui);
        });
    ui.add_space(SECTION_SPACING);
}

fn pollutant_combo(ui: &mut egui::Ui, id: &str, label: &str, value: &mut String, options: &[String]) {
    ui.label(label);
    ComboBox::from_id_salt(id)
        .width(140.0)
        .selected_text(value.as_str())
        .show_ui(ui, |ui| {
            for option in options {
                ui.selectable_value(value, option.clone(), option);
            }
        });
}
