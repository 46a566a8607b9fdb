use crate::error::Result;
use crate::models::StationYearStats;
use crate::store::Store;
use tracing::info;

/// Rebuilds `weather_stats` from the committed weather table.
pub struct StatsAggregator;

impl StatsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Recompute every station-year and swap it into the derived table.
    ///
    /// Takes the store mutably, so no weather batch can be in flight while
    /// the aggregation reads.
    pub fn rebuild(&self, store: &mut Store) -> Result<Vec<StationYearStats>> {
        let stats = store.fetch_stats()?;
        store.replace_batch(&stats)?;

        info!("Rebuilt {} station-year aggregates", stats.len());
        Ok(stats)
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherRecord;
    use crate::store::Table;
    use chrono::NaiveDate;

    fn record(station: &str, y: i32, m: u32, d: u32, values: [Option<i32>; 3]) -> WeatherRecord {
        WeatherRecord {
            record_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            max_temp: values[0],
            min_temp: values[1],
            precipitation: values[2],
            station_id: station.to_string(),
        }
    }

    fn store_with(records: &[WeatherRecord]) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store.drop_and_recreate_schema().unwrap();
        store.load_batch(records).unwrap();
        store
    }

    #[test]
    fn test_nulls_are_excluded_from_averages() -> Result<()> {
        let mut store = store_with(&[
            record("USC001", 2021, 1, 1, [Some(50), Some(20), None]),
            record("USC001", 2021, 1, 2, [Some(48), Some(18), Some(5)]),
        ]);

        let stats = StatsAggregator::new().rebuild(&mut store)?;

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].key(), ("USC001", 2021));
        assert_eq!(stats[0].avg_precipitation, Some(5.0));
        assert_eq!(stats[0].avg_max_temp, Some(49.0));
        assert_eq!(stats[0].avg_min_temp, Some(19.0));
        Ok(())
    }

    #[test]
    fn test_all_missing_year_has_null_average() -> Result<()> {
        let mut store = store_with(&[record("USC001", 2020, 6, 1, [None, None, None])]);

        let stats = StatsAggregator::new().rebuild(&mut store)?;

        assert_eq!(stats[0].avg_max_temp, None);
        assert_eq!(stats[0].avg_precipitation, None);
        Ok(())
    }

    #[test]
    fn test_output_is_ordered_by_station_then_year() -> Result<()> {
        let mut store = store_with(&[
            record("USC002", 2019, 1, 1, [Some(1), Some(1), Some(1)]),
            record("USC001", 2021, 12, 31, [Some(2), Some(2), Some(2)]),
            record("USC001", 2020, 1, 1, [Some(3), Some(3), Some(3)]),
            record("USC002", 2018, 7, 4, [Some(4), Some(4), Some(4)]),
            record("USC001", 2021, 1, 1, [Some(6), Some(6), Some(6)]),
        ]);

        let stats = StatsAggregator::new().rebuild(&mut store)?;
        let keys: Vec<_> = stats.iter().map(|s| s.key()).collect();

        assert_eq!(
            keys,
            vec![
                ("USC001", 2020),
                ("USC001", 2021),
                ("USC002", 2018),
                ("USC002", 2019)
            ]
        );
        assert_eq!(stats[1].avg_max_temp, Some(4.0));
        assert_eq!(store.count(Table::Stats)?, 4);
        Ok(())
    }

    #[test]
    fn test_rebuild_does_not_accumulate() -> Result<()> {
        let mut store = store_with(&[record("USC001", 2021, 1, 1, [Some(1), Some(1), Some(1)])]);
        let aggregator = StatsAggregator::new();

        let first = aggregator.rebuild(&mut store)?;
        let second = aggregator.rebuild(&mut store)?;

        assert_eq!(first, second);
        assert_eq!(store.count(Table::Stats)?, 1);
        Ok(())
    }
}
