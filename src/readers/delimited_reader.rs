use crate::error::{ProcessingError, Result};
use crate::models::{RawRow, SourceFile};
use crate::utils::constants::{DEFAULT_FILE_PATTERN, FIELD_DELIMITER};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Column layout of one family of source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub delimiter: u8,
    /// Stamp each row with the file stem (weather files are one station each)
    pub stamp_source: bool,
}

pub const WEATHER_SCHEMA: RecordSchema = RecordSchema {
    name: "weather",
    fields: &["record_date", "max_temp", "min_temp", "precipitation"],
    delimiter: FIELD_DELIMITER,
    stamp_source: true,
};

pub const YIELD_SCHEMA: RecordSchema = RecordSchema {
    name: "yield",
    fields: &["record_year", "total_yield"],
    delimiter: FIELD_DELIMITER,
    stamp_source: false,
};

/// Rows of one file. Row-level failures stay in place so the caller can count
/// them against the file.
#[derive(Debug)]
pub struct ParsedFile {
    pub file: SourceFile,
    pub rows: Vec<Result<RawRow>>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub file: SourceFile,
    pub error: ProcessingError,
}

/// Outcome of parsing a whole directory: every readable file, plus the
/// files that could not be read at all.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub files: Vec<ParsedFile>,
    pub failures: Vec<FileFailure>,
}

impl ParseReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows.len()).sum()
    }
}

pub struct DelimitedReader {
    schema: RecordSchema,
    pattern: String,
}

impl DelimitedReader {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            pattern: DEFAULT_FILE_PATTERN.to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// List the entries in `dir` matching the glob pattern, in path order.
    /// A match that is not a readable file is still listed so that reading it
    /// reports a failure against its source id.
    pub fn discover(&self, dir: &Path) -> Result<Vec<SourceFile>> {
        // Surface an unreadable directory instead of matching nothing
        std::fs::read_dir(dir)?;

        let dir_str = dir.to_str().ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("Non UTF-8 directory path: {:?}", dir))
        })?;
        let pattern = PathBuf::from(glob::Pattern::escape(dir_str)).join(&self.pattern);
        let pattern = pattern.to_str().ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("Non UTF-8 file pattern: {}", self.pattern))
        })?;

        let mut paths = glob::glob(pattern)?.collect::<std::result::Result<Vec<_>, _>>()?;
        paths.sort();

        debug!(
            "Found {} {} files in {}",
            paths.len(),
            self.schema.name,
            dir.display()
        );

        paths
            .into_iter()
            .enumerate()
            .map(|(sequence, path)| {
                let source_id = source_id_from_path(&path)?;
                Ok(SourceFile {
                    sequence,
                    path,
                    source_id,
                })
            })
            .collect()
    }

    /// Parse one file. Only failure to open or read the file is an error;
    /// bad rows are returned in place.
    pub fn read_file(&self, file: &SourceFile) -> Result<ParsedFile> {
        let handle = File::open(&file.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.schema.delimiter)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(handle);

        let mut rows = Vec::new();
        for result in reader.records() {
            match result {
                Ok(record) => {
                    if is_blank(&record) {
                        continue;
                    }
                    let line = record.position().map_or(0, |p| p.line());
                    rows.push(self.bind_row(&record, line, file));
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => rows.push(Err(e.into())),
            }
        }

        Ok(ParsedFile {
            file: file.clone(),
            rows,
        })
    }

    /// Parse every matching file in `dir`. A file that cannot be read is
    /// reported in `failures` and does not stop its siblings.
    pub fn read_dir(&self, dir: &Path) -> Result<ParseReport> {
        let mut report = ParseReport::default();

        for file in self.discover(dir)? {
            match self.read_file(&file) {
                Ok(parsed) => report.files.push(parsed),
                Err(error) => {
                    warn!("Could not read {}: {}", file.path.display(), error);
                    report.failures.push(FileFailure { file, error });
                }
            }
        }

        Ok(report)
    }

    fn bind_row(&self, record: &StringRecord, line: u64, file: &SourceFile) -> Result<RawRow> {
        if record.len() != self.schema.fields.len() {
            return Err(ProcessingError::MalformedRow {
                source_id: file.source_id.clone(),
                line,
                expected: self.schema.fields.len(),
                found: record.len(),
            });
        }

        let fields = self
            .schema
            .fields
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (*name, value.to_string()))
            .collect();

        Ok(RawRow {
            line,
            source_id: self.schema.stamp_source.then(|| file.source_id.clone()),
            fields,
        })
    }
}

/// An empty or whitespace-only line. A line of bare delimiters has several
/// empty fields and is a row like any other.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record[0].is_empty()
}

/// File stem, e.g. `wx_data/USC00110072.txt` -> `USC00110072`
pub fn source_id_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("Invalid file path: {}", path.display()))
        })
}
