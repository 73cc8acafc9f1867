//! Data module - CSV loading and the preparation pipeline

mod classifier;
mod coercion;
mod error;
mod filter;
mod loader;
mod pipeline;
mod resample;
mod table;
mod temporal;

pub use classifier::ColumnClassifier;
pub use coercion::NumericGate;
pub use error::{PipelineError, PipelineWarning};
pub use filter::{DateRange, RangeFilter};
pub use loader::{DataLoader, LoaderError};
pub use pipeline::{inspect, prepare, Inspection, PipelineRequest, PreparedData};
pub use resample::DailyResampler;
pub use table::{DailyTable, RawTable, TemporalKey, TimeIndexedTable, WorkingTable, MONTH_COL, YEAR_COL};
pub use temporal::TemporalIndexer;
pub(crate) use table::EPOCH_DAYS_FROM_CE;
