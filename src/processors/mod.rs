pub mod aggregator;
pub mod ingestion_log;
pub mod normalizer;
pub mod pipeline;

pub use aggregator::StatsAggregator;
pub use ingestion_log::{FileTimer, IngestionLogRecorder};
pub use normalizer::Normalizer;
pub use pipeline::{CycleStage, Pipeline, PipelineConfig, RefreshReport};
