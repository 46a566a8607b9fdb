use crate::processors::CycleStage;
use crate::store::Table;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("File discovery error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Malformed row in {source_id} at line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        source_id: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Malformed value for {field}: '{value}'")]
    MalformedValue { field: &'static str, value: String },

    #[error("Invalid date: '{0}' is not a YYYYMMDD calendar date")]
    InvalidDate(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Schema error: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Refresh cycle halted while {stage}: {source}")]
    Cycle {
        stage: CycleStage,
        #[source]
        source: Box<ProcessingError>,
    },

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    /// Errors that reject a single row while the rest of its file keeps loading.
    pub fn is_row_level(&self) -> bool {
        match self {
            ProcessingError::MalformedRow { .. }
            | ProcessingError::MalformedValue { .. }
            | ProcessingError::InvalidDate(_)
            | ProcessingError::Validation(_) => true,
            ProcessingError::Csv(e) => !e.is_io_error(),
            _ => false,
        }
    }
}

/// A batch that could not be committed. The target table is left as it was
/// before the call.
#[derive(Error, Debug)]
#[error(
    "Load into {table} failed{}: {cause}",
    .row.map(|r| format!(" at row {r}")).unwrap_or_default()
)]
pub struct LoadError {
    pub table: Table,
    pub row: Option<usize>,
    #[source]
    pub cause: rusqlite::Error,
}

impl LoadError {
    pub fn new(table: Table, cause: rusqlite::Error) -> Self {
        Self {
            table,
            row: None,
            cause,
        }
    }

    pub fn at_row(table: Table, row: usize, cause: rusqlite::Error) -> Self {
        Self {
            table,
            row: Some(row),
            cause,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.cause.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        )
    }
}
