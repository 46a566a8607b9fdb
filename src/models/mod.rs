pub mod crop_yield;
pub mod ingestion_log;
pub mod raw;
pub mod stats;
pub mod weather;

pub use crop_yield::YieldRecord;
pub use ingestion_log::{Dataset, IngestionLogEntry};
pub use raw::{RawRow, SourceFile};
pub use stats::StationYearStats;
pub use weather::WeatherRecord;
