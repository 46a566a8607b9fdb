use std::path::PathBuf;

/// A source file selected for ingestion, numbered in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub sequence: usize,
    pub path: PathBuf,
    pub source_id: String,
}

/// One delimited line bound positionally to the schema's field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: u64,
    pub source_id: Option<String>,
    pub fields: Vec<(&'static str, String)>,
}

impl RawRow {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }
}
