/// Missing-measurement code used in the weather source files
pub const SENTINEL_MISSING: i32 = -9999;

/// Packed date format YYYYMMDD
pub const PACKED_DATE_LEN: usize = 8;
pub const PACKED_DATE_FORMAT: &str = "%Y%m%d";

/// Source file discovery
pub const DEFAULT_FILE_PATTERN: &str = "*.txt";
pub const FIELD_DELIMITER: u8 = b'\t';

/// Processing defaults
pub const DEFAULT_DATABASE: &str = "agweather.db";
pub const DEFAULT_WEATHER_DIR: &str = "wx_data";
pub const DEFAULT_YIELD_DIR: &str = "yld_data";
pub const CONFIG_BASENAME: &str = "agweather";
pub const ENV_PREFIX: &str = "AGWEATHER";

/// Read API page sizes
pub const DEFAULT_WEATHER_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_YIELD_PAGE_SIZE: u32 = 5;
pub const DEFAULT_STATS_PAGE_SIZE: u32 = 500;
pub const DEFAULT_LOGS_PAGE_SIZE: u32 = 100;
