//! Filtered, paginated reads of the pipeline tables.
//!
//! Filter rules: a blank value counts as absent, every present filter is
//! combined with AND, a malformed date is an error rather than being
//! dropped, and pagination always applies. All values are bound as
//! statement parameters.

use super::Store;
use crate::error::{ProcessingError, Result};
use crate::models::{Dataset, IngestionLogEntry, StationYearStats, WeatherRecord, YieldRecord};
use crate::processors::normalizer::decode_date;
use chrono::NaiveDate;
use rusqlite::params;
use rusqlite::types::Type;

/// 1-based page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Result<Self> {
        if number == 0 {
            return Err(ProcessingError::InvalidFormat(
                "Page numbers start at 1".to_string(),
            ));
        }
        if size == 0 {
            return Err(ProcessingError::InvalidFormat(
                "Page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { number, size })
    }

    pub fn first(size: u32) -> Result<Self> {
        Self::new(1, size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherFilter {
    pub station_id: Option<String>,
    pub date: Option<NaiveDate>,
}

impl WeatherFilter {
    /// Build from raw request values; `date` is packed `YYYYMMDD`
    pub fn parse(station_id: Option<&str>, date: Option<&str>) -> Result<Self> {
        let date = present(date).map(|d| decode_date(&d)).transpose()?;
        Ok(Self {
            station_id: present(station_id),
            date,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YieldFilter {
    pub year: Option<i16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsFilter {
    pub station_id: Option<String>,
    pub year: Option<i16>,
}

impl StatsFilter {
    pub fn parse(station_id: Option<&str>, year: Option<i16>) -> Self {
        Self {
            station_id: present(station_id),
            year,
        }
    }
}

impl Store {
    pub fn weather(&self, filter: &WeatherFilter, page: Page) -> Result<Vec<WeatherRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT record_date, max_temp, min_temp, precipitation, station_id
             FROM weather_data
             WHERE (?1 IS NULL OR station_id = ?1)
               AND (?2 IS NULL OR record_date = ?2)
             ORDER BY station_id, record_date
             LIMIT ?3 OFFSET ?4",
        )?;
        let rows = stmt.query_map(
            params![filter.station_id, filter.date, page.limit(), page.offset()],
            |row| {
                Ok(WeatherRecord {
                    record_date: row.get(0)?,
                    max_temp: row.get(1)?,
                    min_temp: row.get(2)?,
                    precipitation: row.get(3)?,
                    station_id: row.get(4)?,
                })
            },
        )?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn yields(&self, filter: &YieldFilter, page: Page) -> Result<Vec<YieldRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT record_year, total_yield
             FROM yield_data
             WHERE (?1 IS NULL OR record_year = ?1)
             ORDER BY record_year
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![filter.year, page.limit(), page.offset()], |row| {
            Ok(YieldRecord {
                record_year: row.get(0)?,
                total_yield: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn stats(&self, filter: &StatsFilter, page: Page) -> Result<Vec<StationYearStats>> {
        let mut stmt = self.connection().prepare(
            "SELECT station_id, record_year, avg_min_temp, avg_max_temp, avg_precipitation
             FROM weather_stats
             WHERE (?1 IS NULL OR station_id = ?1)
               AND (?2 IS NULL OR record_year = ?2)
             ORDER BY station_id, record_year
             LIMIT ?3 OFFSET ?4",
        )?;
        let rows = stmt.query_map(
            params![filter.station_id, filter.year, page.limit(), page.offset()],
            |row| {
                Ok(StationYearStats {
                    station_id: row.get(0)?,
                    record_year: row.get(1)?,
                    avg_min_temp: row.get(2)?,
                    avg_max_temp: row.get(3)?,
                    avg_precipitation: row.get(4)?,
                })
            },
        )?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn logs(&self, page: Page) -> Result<Vec<IngestionLogEntry>> {
        let mut stmt = self.connection().prepare(
            "SELECT sequence, dataset, start_time, end_time, records, rejected, station_id, error
             FROM weather_logs
             ORDER BY sequence
             LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![page.limit(), page.offset()], |row| {
            let dataset: String = row.get(1)?;
            let dataset = Dataset::parse(&dataset).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    Type::Text,
                    format!("unknown dataset '{}'", dataset).into(),
                )
            })?;
            let sequence: i64 = row.get(0)?;
            let rows_loaded: i64 = row.get(4)?;
            let rows_rejected: i64 = row.get(5)?;

            Ok(IngestionLogEntry {
                sequence: sequence as usize,
                dataset,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                rows_loaded: rows_loaded as usize,
                rows_rejected: rows_rejected as usize,
                source_id: row.get(6)?,
                error: row.get(7)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
