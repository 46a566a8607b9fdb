//! SQLite-backed relational store for the four pipeline tables.
//!
//! A [`Store`] wraps one connection. It is opened at the start of a refresh
//! cycle, passed explicitly to every stage that needs it, and closed when the
//! cycle ends.

pub mod loader;
pub mod queries;
pub mod schema;

pub use loader::Insertable;
pub use queries::{Page, StatsFilter, WeatherFilter, YieldFilter};
pub use schema::Table;

use crate::error::{ProcessingError, Result};
use crate::models::StationYearStats;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Open an existing database for queries. A missing file is an error
    /// rather than a new empty database.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!("Opened store read-only at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn drop_tables(&mut self) -> Result<()> {
        self.run_schema_batch(schema::DROP_TABLES)
    }

    pub fn create_tables(&mut self) -> Result<()> {
        self.run_schema_batch(schema::CREATE_TABLES)
    }

    /// Drop every pipeline table and create it again, empty
    pub fn drop_and_recreate_schema(&mut self) -> Result<()> {
        self.drop_tables()?;
        self.create_tables()
    }

    fn run_schema_batch(&mut self, sql: &str) -> Result<()> {
        let tx = self.conn.transaction().map_err(ProcessingError::Schema)?;
        tx.execute_batch(sql).map_err(ProcessingError::Schema)?;
        tx.commit().map_err(ProcessingError::Schema)
    }

    /// Grouped aggregation over the committed weather table, ordered by
    /// station then year
    pub fn fetch_stats(&self) -> Result<Vec<StationYearStats>> {
        let mut stmt = self.conn.prepare(schema::FETCH_STATS)?;
        let rows = stmt.query_map([], |row| {
            Ok(StationYearStats {
                station_id: row.get(0)?,
                record_year: row.get(1)?,
                avg_min_temp: row.get(2)?,
                avg_max_temp: row.get(3)?,
                avg_precipitation: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(&self, table: Table) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ProcessingError::Database(e))
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_all_tables() -> Result<()> {
        let mut store = Store::open_in_memory()?;
        store.drop_and_recreate_schema()?;

        for table in Table::ALL {
            assert_eq!(store.count(table)?, 0, "{} should be empty", table);
        }
        Ok(())
    }

    #[test]
    fn test_read_only_open_requires_existing_database() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("agweather.db");

        assert!(Store::open_read_only(&path).is_err());
        assert!(!path.exists());

        let mut store = Store::open(&path)?;
        store.create_tables()?;
        store.close()?;

        let store = Store::open_read_only(&path)?;
        assert_eq!(store.count(Table::Weather)?, 0);
        assert!(store
            .connection()
            .execute("INSERT INTO yield_data VALUES (1985, 225447)", [])
            .is_err());
        Ok(())
    }

    #[test]
    fn test_missing_table_is_reported() -> Result<()> {
        let store = Store::open_in_memory()?;
        assert!(store.fetch_stats().is_err());
        Ok(())
    }

    #[test]
    fn test_drop_and_recreate_empties_tables() -> Result<()> {
        let mut store = Store::open_in_memory()?;
        store.create_tables()?;
        store
            .connection()
            .execute("INSERT INTO yield_data VALUES (1985, 225447)", [])?;
        assert_eq!(store.count(Table::Yield)?, 1);

        store.drop_and_recreate_schema()?;
        assert_eq!(store.count(Table::Yield)?, 0);
        Ok(())
    }
}
