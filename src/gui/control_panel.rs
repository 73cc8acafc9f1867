//! Control Panel Widget
//! Left side panel with the data source, pollutant selection and date range.

use crate::data::{DateRange, Inspection, PipelineWarning};
use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};
use egui_extras::DatePickerButton;
use std::path::PathBuf;

/// User settings driving one pipeline run
#[derive(Default, Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub candidates: Vec<String>,
    pub selected: Vec<bool>,
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    pub time_column: Option<String>,
    pub summary: String,
    pub status: String,
    pub warnings: Vec<PipelineWarning>,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            candidates: Vec::new(),
            selected: Vec::new(),
            bounds: None,
            time_column: None,
            summary: String::new(),
            status: "Ready".to_string(),
            warnings: Vec::new(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the controls for a freshly loaded file.
    pub fn apply_inspection(&mut self, path: PathBuf, inspection: &Inspection) {
        self.settings.csv_path = Some(path);
        self.candidates = inspection.candidates.clone();
        self.selected = self
            .candidates
            .iter()
            .map(|c| inspection.default_selection.contains(c))
            .collect();
        self.bounds = inspection.date_bounds;
        self.time_column = inspection.time_column.clone();
        self.settings.start = inspection.date_bounds.map(|(start, _)| start);
        self.settings.end = inspection.date_bounds.map(|(_, end)| end);
        self.summary = format!(
            "{} rows, {} columns, time column: {}",
            inspection.row_count,
            inspection.column_count,
            inspection.time_column.as_deref().unwrap_or("none")
        );
        self.warnings = inspection.warnings.clone();
    }

    /// Clear everything derived from a file, keeping the status line.
    pub fn clear_data(&mut self) {
        self.candidates.clear();
        self.selected.clear();
        self.bounds = None;
        self.time_column = None;
        self.settings.start = None;
        self.settings.end = None;
        self.summary.clear();
        self.warnings.clear();
        self.export_enabled = false;
    }

    pub fn selected_pollutants(&self) -> Vec<String> {
        self.candidates
            .iter()
            .zip(self.selected.iter())
            .filter(|(_, &selected)| selected)
            .map(|(col, _)| col.clone())
            .collect()
    }

    /// Range picked in the date widgets, `None` without a time column.
    pub fn date_range(&self) -> Option<DateRange> {
        match (self.settings.start, self.settings.end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }

    /// Explanation shown instead of the date pickers, if any.
    pub fn date_range_note(&self) -> Option<String> {
        match (&self.time_column, self.bounds) {
            (_, Some(_)) => None,
            (Some(column), None) => Some(format!("No valid dates in '{}'", column)),
            (None, None) if self.candidates.is_empty() => None,
            (None, None) => Some("No time column: all rows are used".to_string()),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌫 AQI Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Air-quality dashboard")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
                if !self.summary.is_empty() {
                    ui.label(RichText::new(&self.summary).size(11.0).color(Color32::GRAY));
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Pollutant Section =====
        ui.label(RichText::new("🧪 Pollutants").size(14.0).strong());
        ui.add_space(5.0);

        if self.candidates.is_empty() {
            ui.label(RichText::new("Load a CSV to pick pollutants").size(11.0).color(Color32::GRAY));
        } else {
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .rounding(5.0)
                .inner_margin(5.0)
                .show(ui, |ui| {
                    ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                        for (i, col) in self.candidates.iter().enumerate() {
                            if let Some(flag) = self.selected.get_mut(i) {
                                if ui.checkbox(flag, col).changed() {
                                    action = ControlPanelAction::ParametersChanged;
                                }
                            }
                        }
                    });
                });

            ui.add_space(5.0);
            ui.horizontal(|ui| {
                if ui.small_button("Select All").clicked() {
                    self.selected.iter_mut().for_each(|v| *v = true);
                    action = ControlPanelAction::ParametersChanged;
                }
                if ui.small_button("Clear All").clicked() {
                    self.selected.iter_mut().for_each(|v| *v = false);
                    action = ControlPanelAction::ParametersChanged;
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Date Range Section =====
        ui.label(RichText::new("📅 Date Range").size(14.0).strong());
        ui.add_space(5.0);

        let note = self.date_range_note();
        if let (Some(start), Some(end)) = (self.settings.start.as_mut(), self.settings.end.as_mut()) {
            let label_width = 50.0;
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Start:"));
                if ui.add(DatePickerButton::new(start).id_salt("range_start")).changed() {
                    action = ControlPanelAction::ParametersChanged;
                }
            });
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("End:"));
                if ui.add(DatePickerButton::new(end).id_salt("range_end")).changed() {
                    action = ControlPanelAction::ParametersChanged;
                }
            });
            if let Some((lo, hi)) = self.bounds {
                ui.label(
                    RichText::new(format!("Data covers {} to {}", lo, hi))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                if ui.small_button("Reset to full range").clicked() {
                    self.settings.start = Some(lo);
                    self.settings.end = Some(hi);
                    action = ControlPanelAction::ParametersChanged;
                }
            }
        } else if let Some(note) = note {
            ui.label(RichText::new(note).size(11.0).color(Color32::GRAY));
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG charts").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Ready") || self.status.starts_with("Loaded") {
            Color32::GRAY
        } else {
            Color32::from_rgb(40, 167, 69)
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        for warning in &self.warnings {
            ui.label(
                RichText::new(format!("⚠ {}", warning))
                    .size(11.0)
                    .color(Color32::from_rgb(255, 193, 7)),
            );
        }

        action
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    ParametersChanged,
    ExportCharts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspection() -> Inspection {
        Inspection {
            row_count: 10,
            column_count: 4,
            time_column: Some("Date".to_string()),
            candidates: vec!["PM2.5".into(), "NO2".into(), "CO".into(), "O3".into()],
            default_selection: vec!["PM2.5".into(), "NO2".into(), "CO".into()],
            date_bounds: Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn inspection_preselects_defaults_and_full_range() {
        let mut panel = ControlPanel::new();
        panel.apply_inspection(PathBuf::from("air.csv"), &inspection());

        assert_eq!(panel.selected, vec![true, true, true, false]);
        assert_eq!(panel.selected_pollutants(), vec!["PM2.5", "NO2", "CO"]);
        let range = panel.date_range().unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn time_column_without_valid_dates_is_not_reported_as_missing() {
        let mut panel = ControlPanel::new();
        let mut info = inspection();
        info.date_bounds = None;
        panel.apply_inspection(PathBuf::from("air.csv"), &info);

        assert!(panel.date_range().is_none());
        assert_eq!(panel.date_range_note().as_deref(), Some("No valid dates in 'Date'"));

        info.time_column = None;
        panel.apply_inspection(PathBuf::from("air.csv"), &info);
        assert_eq!(
            panel.date_range_note().as_deref(),
            Some("No time column: all rows are used")
        );
    }

    #[test]
    fn clearing_drops_file_state() {
        let mut panel = ControlPanel::new();
        panel.apply_inspection(PathBuf::from("air.csv"), &inspection());
        panel.export_enabled = true;
        panel.clear_data();

        assert!(panel.selected_pollutants().is_empty());
        assert!(panel.date_range().is_none());
        assert!(!panel.export_enabled);
    }
}
