use super::{Store, Table};
use crate::error::LoadError;
use crate::models::{IngestionLogEntry, StationYearStats, WeatherRecord, YieldRecord};
use rusqlite::{params, Statement};
use tracing::{debug, info};

/// A record type with a home table in the store.
pub trait Insertable {
    const TABLE: Table;

    /// Bind this record to the table's prepared INSERT and execute it
    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

impl Insertable for WeatherRecord {
    const TABLE: Table = Table::Weather;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.record_date,
            self.max_temp,
            self.min_temp,
            self.precipitation,
            self.station_id,
        ])
    }
}

impl Insertable for YieldRecord {
    const TABLE: Table = Table::Yield;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.record_year, self.total_yield])
    }
}

impl Insertable for IngestionLogEntry {
    const TABLE: Table = Table::Logs;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.sequence as i64,
            self.dataset.as_str(),
            self.start_time,
            self.end_time,
            self.rows_loaded as i64,
            self.rows_rejected as i64,
            self.source_id,
            self.error,
        ])
    }
}

impl Insertable for StationYearStats {
    const TABLE: Table = Table::Stats;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.station_id,
            self.record_year,
            self.avg_min_temp,
            self.avg_max_temp,
            self.avg_precipitation,
        ])
    }
}

impl Store {
    /// Insert every record in one transaction. Any failing row rolls the
    /// whole batch back, leaving the table as it was.
    pub fn load_batch<R: Insertable>(&mut self, records: &[R]) -> Result<usize, LoadError> {
        self.write_batch(records, false)
    }

    /// Clear the table and insert `records` in the same transaction, so
    /// readers see either the old contents or the new ones
    pub fn replace_batch<R: Insertable>(&mut self, records: &[R]) -> Result<usize, LoadError> {
        self.write_batch(records, true)
    }

    fn write_batch<R: Insertable>(&mut self, records: &[R], clear: bool) -> Result<usize, LoadError> {
        let table = R::TABLE;
        let tx = self
            .connection_mut()
            .transaction()
            .map_err(|e| LoadError::new(table, e))?;

        if clear {
            let removed = tx
                .execute(&format!("DELETE FROM {}", table.name()), [])
                .map_err(|e| LoadError::new(table, e))?;
            debug!("Cleared {} rows from {}", removed, table);
        }

        {
            let mut stmt = tx
                .prepare(table.insert_sql())
                .map_err(|e| LoadError::new(table, e))?;
            for (index, record) in records.iter().enumerate() {
                record
                    .insert(&mut stmt)
                    .map_err(|e| LoadError::at_row(table, index, e))?;
            }
        }

        tx.commit().map_err(|e| LoadError::new(table, e))?;
        info!("Loaded {} rows into {}", records.len(), table);
        Ok(records.len())
    }
}
