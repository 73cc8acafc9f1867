//! Charts module - Interactive and static chart rendering

mod plotter;
mod renderer;
mod style;

pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;
