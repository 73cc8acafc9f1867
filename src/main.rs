//! AQI Explorer - Air-Quality CSV Explorer & Interactive Dashboard
//!
//! Loads an air-quality CSV, cleans and resamples it to daily means and
//! displays summary statistics and interactive charts.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use config::AnalysisConfig;
use eframe::egui;
use gui::AqiExplorerApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AnalysisConfig::load_or_default();
    log::debug!("Using {:?}", config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("AQI Explorer"),
        ..Default::default()
    };

    eframe::run_native(
        "AQI Explorer",
        options,
        Box::new(|cc| Ok(Box::new(AqiExplorerApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start the dashboard: {e}"))
}
