use crate::error::Result;
use crate::models::{Dataset, IngestionLogEntry, RawRow, SourceFile};
use crate::processors::ingestion_log::FileTimer;
use crate::readers::DelimitedReader;
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

/// Records and audit line produced by one source file
#[derive(Debug)]
pub struct FileIngest<T> {
    pub entry: IngestionLogEntry,
    pub records: Vec<T>,
}

/// Everything one directory pass produced, in file sequence order
#[derive(Debug)]
pub struct DatasetIngest<T> {
    pub records: Vec<T>,
    pub entries: Vec<IngestionLogEntry>,
}

impl<T> DatasetIngest<T> {
    pub fn rejected_rows(&self) -> usize {
        self.entries.iter().map(|e| e.rows_rejected).sum()
    }

    pub fn failed_files(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failure()).count()
    }
}

pub struct ConcurrentReader {
    max_workers: usize,
}

impl ConcurrentReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Parse and normalize every matching file in `dir` on a bounded worker
    /// pool.
    ///
    /// An unreadable directory fails the pass. A single unreadable file only
    /// produces a failed log entry; bad rows are skipped and counted.
    pub async fn ingest_dir<T, F>(
        &self,
        reader: DelimitedReader,
        dir: &Path,
        dataset: Dataset,
        normalize: F,
    ) -> Result<DatasetIngest<T>>
    where
        T: Send + 'static,
        F: Fn(&RawRow) -> Result<T> + Send + Sync + 'static,
    {
        let files = reader.discover(dir)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()?;

        let per_file = tokio::task::spawn_blocking(move || {
            pool.install(|| {
                files
                    .par_iter()
                    .map(|file| ingest_file(&reader, file, dataset, &normalize))
                    .collect::<Vec<_>>()
            })
        })
        .await?;

        let mut records = Vec::new();
        let mut entries = Vec::with_capacity(per_file.len());
        for file in per_file {
            records.extend(file.records);
            entries.push(file.entry);
        }

        Ok(DatasetIngest { records, entries })
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn ingest_file<T, F>(
    reader: &DelimitedReader,
    file: &SourceFile,
    dataset: Dataset,
    normalize: &F,
) -> FileIngest<T>
where
    F: Fn(&RawRow) -> Result<T>,
{
    let timer = FileTimer::start(file, dataset);

    let parsed = match reader.read_file(file) {
        Ok(parsed) => parsed,
        Err(e) => {
            return FileIngest {
                entry: timer.fail(&e),
                records: Vec::new(),
            }
        }
    };

    let mut records = Vec::with_capacity(parsed.rows.len());
    let mut rejected = 0;
    for row in parsed.rows {
        let (line, result) = match row {
            Ok(raw) => (Some(raw.line), normalize(&raw)),
            Err(e) => (None, Err(e)),
        };

        match result {
            Ok(record) => records.push(record),
            Err(e) if e.is_row_level() => {
                debug!(source = %file.source_id, line = ?line, "Rejected row: {}", e);
                rejected += 1;
            }
            // Not a row problem: the file fails and none of its rows load
            Err(e) => {
                return FileIngest {
                    entry: timer.fail(&e),
                    records: Vec::new(),
                }
            }
        }
    }

    FileIngest {
        entry: timer.succeed(records.len(), rejected),
        records,
    }
}
