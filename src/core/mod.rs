//! Data acquisition and reshaping

pub mod config;
pub mod dataset;
pub mod log;
pub mod metric;
pub mod query;
pub mod table;

// Re-export main types for cleaner imports
pub use dataset::{Dataset, load_dataset};
pub use metric::{FetchDiagnostic, FetchOutcome, MetricProvider, MetricSeries, SeriesRecord};
pub use query::Filter;
pub use table::{MergedTable, MetricTable, merge, normalize};
