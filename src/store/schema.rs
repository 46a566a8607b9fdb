use std::fmt;

/// Tables owned by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Weather,
    Yield,
    Logs,
    Stats,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Weather, Table::Yield, Table::Logs, Table::Stats];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Weather => "weather_data",
            Table::Yield => "yield_data",
            Table::Logs => "weather_logs",
            Table::Stats => "weather_stats",
        }
    }

    pub(crate) fn insert_sql(&self) -> &'static str {
        match self {
            Table::Weather => {
                "INSERT INTO weather_data (record_date, max_temp, min_temp, precipitation, station_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            }
            Table::Yield => "INSERT INTO yield_data (record_year, total_yield) VALUES (?1, ?2)",
            Table::Logs => {
                "INSERT INTO weather_logs
                   (sequence, dataset, start_time, end_time, records, rejected, station_id, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            }
            Table::Stats => {
                "INSERT INTO weather_stats
                   (station_id, record_year, avg_min_temp, avg_max_temp, avg_precipitation)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) const DROP_TABLES: &str = r"
DROP TABLE IF EXISTS weather_data;
DROP TABLE IF EXISTS yield_data;
DROP TABLE IF EXISTS weather_logs;
DROP TABLE IF EXISTS weather_stats;
";

pub(crate) const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS weather_data (
  record_date DATE NOT NULL,
  max_temp INTEGER,
  min_temp INTEGER,
  precipitation INTEGER,
  station_id CHAR(11) NOT NULL CHECK (length(station_id) BETWEEN 1 AND 11),
  CONSTRAINT weather_data_pkey PRIMARY KEY (record_date, station_id)
);

CREATE TABLE IF NOT EXISTS yield_data (
  record_year SMALLINT NOT NULL,
  total_yield INTEGER NOT NULL,
  CONSTRAINT yield_data_pkey PRIMARY KEY (record_year)
);

CREATE TABLE IF NOT EXISTS weather_logs (
  sequence INTEGER NOT NULL,
  dataset TEXT NOT NULL CHECK (dataset IN ('weather', 'yield')),
  start_time TIMESTAMP NOT NULL,
  end_time TIMESTAMP NOT NULL,
  records INTEGER NOT NULL,
  rejected INTEGER NOT NULL DEFAULT 0,
  station_id TEXT NOT NULL,
  error TEXT
);

CREATE TABLE IF NOT EXISTS weather_stats (
  station_id CHAR(11) NOT NULL,
  record_year SMALLINT NOT NULL,
  avg_min_temp REAL,
  avg_max_temp REAL,
  avg_precipitation REAL,
  CONSTRAINT weather_stats_pkey PRIMARY KEY (record_year, station_id)
);

CREATE INDEX IF NOT EXISTS idx_weather_data_station_date
  ON weather_data(station_id, record_date);
";

/// Per-station, per-year means. `AVG` skips NULLs, so missing measurements
/// never drag an average towards zero.
pub(crate) const FETCH_STATS: &str = r"
SELECT station_id,
       CAST(strftime('%Y', record_date) AS INTEGER) AS record_year,
       AVG(min_temp) AS avg_min_temp,
       AVG(max_temp) AS avg_max_temp,
       AVG(precipitation) AS avg_precipitation
FROM weather_data
GROUP BY station_id, record_year
ORDER BY station_id, record_year
";
