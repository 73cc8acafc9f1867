//! AQI Explorer Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::AnalysisConfig;
use crate::data::{inspect, prepare, DataLoader, Inspection, PipelineRequest};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::{AnalysisReport, StatsCalculator};
use anyhow::{anyhow, Context};
use egui::SidePanel;
use std::path::{Path, PathBuf};

/// Main application window.
pub struct AqiExplorerApp {
    config: AnalysisConfig,
    loader: DataLoader,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl AqiExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AnalysisConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
        }
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        self.chart_viewer.clear();
        self.control_panel.clear_data();

        match self.open_file(&path) {
            Ok(inspection) => {
                self.control_panel.apply_inspection(path, &inspection);
                self.control_panel.set_status(format!(
                    "Loaded {} rows, {} columns",
                    inspection.row_count, inspection.column_count
                ));
                self.run_pipeline();
            }
            Err(e) => self.show_error(e),
        }
    }

    fn open_file(&mut self, path: &Path) -> anyhow::Result<Inspection> {
        let raw = self
            .loader
            .load_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let inspection = inspect(raw, &self.config).context("Cannot analyse this file")?;
        if let Some(column) = &inspection.time_column {
            log::debug!("Time column: {}", column);
        }
        Ok(inspection)
    }

    /// Re-run the whole preparation chain with the current controls.
    fn run_pipeline(&mut self) {
        match self.analyze_current() {
            Ok(report) => {
                let days = report.daily.first().map_or(0, |s| s.values.len());
                self.control_panel.warnings = report.warnings.clone();
                self.control_panel.export_enabled = true;
                self.control_panel.set_status(format!(
                    "Complete! {} pollutants, {} daily rows",
                    report.pollutants.len(),
                    days
                ));
                self.chart_viewer.set_report(report);
            }
            Err(e) => self.show_error(e),
        }
    }

    fn analyze_current(&self) -> anyhow::Result<AnalysisReport> {
        let bytes = self.loader.get_bytes().context("No data loaded")?;
        let request = PipelineRequest {
            selection: self.control_panel.selected_pollutants(),
            range: self.control_panel.date_range(),
        };
        let prepared = prepare(bytes, &request, &self.config)?;
        let report = StatsCalculator::analyze(&prepared, &self.config)
            .context("Failed to compute statistics")?;
        Ok(report)
    }

    /// Surface one fatal error and clear the charts.
    fn show_error(&mut self, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.control_panel.export_enabled = false;
        self.control_panel.warnings.clear();
        self.control_panel.set_status(format!("Error: {:#}", error));
        self.chart_viewer.set_error(format!("{:#}", error));
    }

    /// Handle PNG export into a user-chosen folder
    fn handle_export_charts(&mut self) {
        if self.chart_viewer.report.is_none() {
            self.control_panel.set_status("No charts to export");
            return;
        }

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        match self.export_to(&dir) {
            Ok(paths) => {
                self.control_panel
                    .set_status(format!("Exported {} charts to {}", paths.len(), dir.display()));
                if let Err(e) = open::that(&dir) {
                    log::warn!("Could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.control_panel.set_status(format!("Error: {:#}", e));
            }
        }
    }

    fn export_to(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let report = self.chart_viewer.report.as_ref().context("No charts to export")?;
        StaticChartRenderer::export_all(
            report,
            dir,
            self.config.export_width,
            self.config.export_height,
            self.chart_viewer.scatter_pair(),
        )
        .map_err(|e| anyhow!("Chart export failed: {}", e))
    }
}

impl eframe::App for AqiExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::ParametersChanged => {
                            if self.loader.has_data() {
                                self.run_pipeline();
                            }
                        }
                        ControlPanelAction::ExportCharts => self.handle_export_charts(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
