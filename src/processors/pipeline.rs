use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, IngestionLogEntry};
use crate::processors::{IngestionLogRecorder, Normalizer, StatsAggregator};
use crate::readers::{
    ConcurrentReader, DatasetIngest, DelimitedReader, WEATHER_SCHEMA, YIELD_SCHEMA,
};
use crate::store::Store;
use crate::utils::progress::ProgressReporter;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Position of a refresh cycle. A cycle walks these in order and returns to
/// `Idle`; a failure at any stage halts it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    Dropping,
    Recreating,
    IngestingWeather,
    IngestingYield,
    Aggregating,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleStage::Idle => "idle",
            CycleStage::Dropping => "dropping tables",
            CycleStage::Recreating => "recreating schema",
            CycleStage::IngestingWeather => "ingesting weather",
            CycleStage::IngestingYield => "ingesting yield",
            CycleStage::Aggregating => "aggregating",
        };
        f.write_str(label)
    }
}

fn log_pass<T>(dataset: Dataset, ingest: &DatasetIngest<T>) {
    info!(
        "{} pass: {} records from {} files, {} rows rejected, {} files failed",
        dataset,
        ingest.records.len(),
        ingest.entries.len(),
        ingest.rejected_rows(),
        ingest.failed_files()
    );
}

fn halt(stage: CycleStage, error: ProcessingError) -> ProcessingError {
    ProcessingError::Cycle {
        stage,
        source: Box::new(error),
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub weather_dir: PathBuf,
    pub yield_dir: PathBuf,
    pub file_pattern: String,
    pub max_workers: usize,
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            weather_dir: settings.weather_dir.clone(),
            yield_dir: settings.yield_dir.clone(),
            file_pattern: settings.file_pattern.clone(),
            max_workers: settings.max_workers,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub weather_rows: usize,
    pub yield_rows: usize,
    pub stats_rows: usize,
    pub rejected_rows: usize,
    pub failed_files: usize,
    pub entries: Vec<IngestionLogEntry>,
}

impl RefreshReport {
    pub fn summary(&self) -> String {
        format!(
            "Refresh complete\n\
             Weather rows:   {}\n\
             Yield rows:     {}\n\
             Station-years:  {}\n\
             Rejected rows:  {}\n\
             Files:          {} ({} failed)",
            self.weather_rows,
            self.yield_rows,
            self.stats_rows,
            self.rejected_rows,
            self.entries.len(),
            self.failed_files
        )
    }
}

/// Owns the store connection for the length of a refresh cycle.
pub struct Pipeline {
    store: Store,
    config: PipelineConfig,
    stage: CycleStage,
    recorder: IngestionLogRecorder,
}

impl Pipeline {
    pub fn open(database: &Path, config: PipelineConfig) -> Result<Self> {
        Ok(Self::with_store(Store::open(database)?, config))
    }

    pub fn with_store(store: Store, config: PipelineConfig) -> Self {
        Self {
            store,
            config,
            stage: CycleStage::Idle,
            recorder: IngestionLogRecorder::new(),
        }
    }

    pub fn stage(&self) -> CycleStage {
        self.stage
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Log entries of the latest cycle, including passes whose batch failed
    /// to commit and so never reached `weather_logs`
    pub fn entries(&self) -> &[IngestionLogEntry] {
        self.recorder.entries()
    }

    /// Drop and recreate every table, reload both datasets and rebuild the
    /// station-year statistics.
    ///
    /// Nothing is retried; after a failure the operator re-runs the whole
    /// cycle.
    pub async fn refresh(&mut self, progress: Option<&ProgressReporter>) -> Result<RefreshReport> {
        let result = self.run_cycle(progress).await;
        self.stage = CycleStage::Idle;
        result
    }

    async fn run_cycle(&mut self, progress: Option<&ProgressReporter>) -> Result<RefreshReport> {
        self.recorder = IngestionLogRecorder::new();
        let normalizer = Normalizer::new();
        let reader = ConcurrentReader::new(self.config.max_workers);

        let stage = self.enter(CycleStage::Dropping, progress);
        self.store.drop_tables().map_err(|e| halt(stage, e))?;

        let stage = self.enter(CycleStage::Recreating, progress);
        self.store.create_tables().map_err(|e| halt(stage, e))?;

        let stage = self.enter(CycleStage::IngestingWeather, progress);
        let weather = reader
            .ingest_dir(
                DelimitedReader::new(WEATHER_SCHEMA).with_pattern(&self.config.file_pattern),
                &self.config.weather_dir,
                Dataset::Weather,
                move |row| normalizer.normalize_weather(row),
            )
            .await
            .map_err(|e| halt(stage, e))?;
        log_pass(Dataset::Weather, &weather);
        let entries = self.recorder.record_pass(weather.entries);
        let weather_rows = self
            .store
            .load_batch(&weather.records)
            .map_err(|e| halt(stage, e.into()))?;
        self.store
            .load_batch(entries)
            .map_err(|e| halt(stage, e.into()))?;

        let stage = self.enter(CycleStage::IngestingYield, progress);
        let yields = reader
            .ingest_dir(
                DelimitedReader::new(YIELD_SCHEMA).with_pattern(&self.config.file_pattern),
                &self.config.yield_dir,
                Dataset::Yield,
                move |row| normalizer.normalize_yield(row),
            )
            .await
            .map_err(|e| halt(stage, e))?;
        log_pass(Dataset::Yield, &yields);
        let entries = self.recorder.record_pass(yields.entries);
        let yield_rows = self
            .store
            .load_batch(&yields.records)
            .map_err(|e| halt(stage, e.into()))?;
        self.store
            .load_batch(entries)
            .map_err(|e| halt(stage, e.into()))?;

        let stage = self.enter(CycleStage::Aggregating, progress);
        let stats = StatsAggregator::new()
            .rebuild(&mut self.store)
            .map_err(|e| halt(stage, e))?;

        let failed_files = self.recorder.failures().count();
        let entries = self.recorder.entries().to_vec();
        Ok(RefreshReport {
            weather_rows,
            yield_rows,
            stats_rows: stats.len(),
            rejected_rows: entries.iter().map(|e| e.rows_rejected).sum(),
            failed_files,
            entries,
        })
    }

    fn enter(&mut self, stage: CycleStage, progress: Option<&ProgressReporter>) -> CycleStage {
        info!("Refresh cycle: {}", stage);
        if let Some(p) = progress {
            p.stage(stage);
        }
        self.stage = stage;
        stage
    }

    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}
