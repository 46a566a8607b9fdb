pub mod concurrent_reader;
pub mod delimited_reader;

pub use concurrent_reader::{ConcurrentReader, DatasetIngest, FileIngest};
pub use delimited_reader::{
    DelimitedReader, FileFailure, ParseReport, ParsedFile, RecordSchema, WEATHER_SCHEMA,
    YIELD_SCHEMA,
};
