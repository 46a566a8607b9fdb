use agweather::models::{Dataset, StationYearStats, WeatherRecord, YieldRecord};
use agweather::processors::{CycleStage, Pipeline, PipelineConfig};
use agweather::store::{Page, StatsFilter, Store, Table, WeatherFilter, YieldFilter};
use agweather::ProcessingError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    root: TempDir,
    config: PipelineConfig,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let weather_dir = root.path().join("wx_data");
        let yield_dir = root.path().join("yld_data");
        fs::create_dir_all(&weather_dir).unwrap();
        fs::create_dir_all(&yield_dir).unwrap();

        let config = PipelineConfig {
            weather_dir,
            yield_dir,
            file_pattern: "*.txt".to_string(),
            max_workers: 4,
        };
        Self { root, config }
    }

    fn weather_file(&self, name: &str, content: &str) -> &Self {
        fs::write(self.config.weather_dir.join(name), content).unwrap();
        self
    }

    fn yield_file(&self, name: &str, content: &str) -> &Self {
        fs::write(self.config.yield_dir.join(name), content).unwrap();
        self
    }

    fn database(&self) -> PathBuf {
        self.root.path().join("agweather.db")
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn refresh(workspace: &Workspace) -> agweather::Result<()> {
    let mut pipeline = Pipeline::open(&workspace.database(), workspace.config.clone())?;
    pipeline.refresh(None).await?;
    pipeline.close()
}

fn all_stats(path: &Path) -> agweather::Result<Vec<StationYearStats>> {
    Store::open_read_only(path)?.stats(&StatsFilter::default(), Page::first(10_000)?)
}

#[tokio::test]
async fn test_sentinel_precipitation_is_excluded_from_average() -> agweather::Result<()> {
    let workspace = Workspace::new();
    workspace
        .weather_file("USC001.txt", "20210101\t50\t20\t-9999\n20210102\t48\t18\t5\n")
        .yield_file("US_corn_grain_yield.txt", "2021\t300\n");

    refresh(&workspace).await?;

    let store = Store::open(&workspace.database())?;
    let weather = store.weather(&WeatherFilter::default(), Page::first(10)?)?;
    assert_eq!(
        weather,
        vec![
            WeatherRecord {
                record_date: date(2021, 1, 1),
                max_temp: Some(50),
                min_temp: Some(20),
                precipitation: None,
                station_id: "USC001".to_string(),
            },
            WeatherRecord {
                record_date: date(2021, 1, 2),
                max_temp: Some(48),
                min_temp: Some(18),
                precipitation: Some(5),
                station_id: "USC001".to_string(),
            },
        ]
    );

    let stats = store.stats(&StatsFilter::default(), Page::first(10)?)?;
    assert_eq!(
        stats,
        vec![StationYearStats {
            station_id: "USC001".to_string(),
            record_year: 2021,
            avg_min_temp: Some(19.0),
            avg_max_temp: Some(49.0),
            avg_precipitation: Some(5.0),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn test_bad_rows_are_skipped_while_siblings_load() -> agweather::Result<()> {
    let workspace = Workspace::new();
    workspace
        .weather_file(
            "USC002.txt",
            "20210101\t10\t1\t0\n20210230\t11\t2\t0\n20210103\tabc\t3\t0\n20210104\t12\t3\n20210105\t13\t4\t2\n",
        )
        .yield_file("US_corn_grain_yield.txt", "2020\t250\n2021\t300\n");

    refresh(&workspace).await?;

    let store = Store::open(&workspace.database())?;
    assert_eq!(store.count(Table::Weather)?, 2);
    assert_eq!(store.count(Table::Yield)?, 2);

    let logs = store.logs(Page::first(10)?)?;
    assert_eq!(logs.len(), 2);

    let weather_log = &logs[0];
    assert_eq!(weather_log.dataset, Dataset::Weather);
    assert_eq!(weather_log.source_id, "USC002");
    assert_eq!(weather_log.rows_loaded, 2);
    assert_eq!(weather_log.rows_rejected, 3);
    assert!(weather_log.start_time <= weather_log.end_time);
    assert_eq!(weather_log.error, None);

    let yield_log = &logs[1];
    assert_eq!(yield_log.dataset, Dataset::Yield);
    assert_eq!(yield_log.source_id, "US_corn_grain_yield");
    assert_eq!(yield_log.rows_loaded, 2);
    Ok(())
}

#[tokio::test]
async fn test_repeated_refresh_produces_identical_tables() -> agweather::Result<()> {
    let workspace = Workspace::new();
    workspace
        .weather_file("USC001.txt", "20200101\t1\t-5\t3\n20210101\t50\t20\t-9999\n")
        .weather_file("USC003.txt", "20210101\t-9999\t-9999\t-9999\n")
        .yield_file("US_corn_grain_yield.txt", "2021\t300\n");

    refresh(&workspace).await?;
    let first = all_stats(&workspace.database())?;

    refresh(&workspace).await?;
    let second = all_stats(&workspace.database())?;

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);

    // Sorted by station then year, one row per key
    let keys: Vec<_> = first.iter().map(|s| s.key()).collect();
    assert_eq!(
        keys,
        vec![("USC001", 2020), ("USC001", 2021), ("USC003", 2021)]
    );

    // A station-year with nothing but sentinels still gets a row of nulls
    assert_eq!(first[2].avg_max_temp, None);
    assert_eq!(first[2].avg_min_temp, None);
    assert_eq!(first[2].avg_precipitation, None);

    let store = Store::open(&workspace.database())?;
    assert_eq!(store.count(Table::Weather)?, 3);
    assert_eq!(store.count(Table::Logs)?, 3);
    Ok(())
}

#[tokio::test]
async fn test_refresh_replaces_previous_contents() -> agweather::Result<()> {
    let workspace = Workspace::new();
    workspace
        .weather_file("USC001.txt", "20210101\t50\t20\t1\n")
        .yield_file("US_corn_grain_yield.txt", "2021\t300\n");
    refresh(&workspace).await?;

    fs::remove_file(workspace.config.weather_dir.join("USC001.txt"))?;
    workspace.weather_file("USC009.txt", "19990101\t1\t1\t1\n");
    refresh(&workspace).await?;

    let stats = all_stats(&workspace.database())?;
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].key(), ("USC009", 1999));
    Ok(())
}

#[tokio::test]
async fn test_missing_weather_dir_halts_before_any_load() -> agweather::Result<()> {
    let workspace = Workspace::new();
    let mut config = workspace.config.clone();
    config.weather_dir = workspace.root.path().join("nowhere");

    let mut pipeline = Pipeline::open(&workspace.database(), config)?;
    let err = pipeline.refresh(None).await.unwrap_err();

    assert!(matches!(
        err,
        ProcessingError::Cycle {
            stage: CycleStage::IngestingWeather,
            ..
        }
    ));
    assert_eq!(pipeline.store().count(Table::Weather)?, 0);
    assert_eq!(pipeline.store().count(Table::Stats)?, 0);
    Ok(())
}

#[test]
fn test_batch_load_is_all_or_nothing() -> agweather::Result<()> {
    let mut store = Store::open_in_memory()?;
    store.create_tables()?;

    let first = vec![YieldRecord::new(2019, 100)?];
    assert_eq!(store.load_batch(&first).map_err(ProcessingError::from)?, 1);

    let batch = vec![
        YieldRecord::new(2020, 200)?,
        YieldRecord::new(2021, 300)?,
        YieldRecord::new(2020, 999)?,
    ];
    let err = store.load_batch(&batch).unwrap_err();
    assert_eq!(err.table, Table::Yield);
    assert_eq!(err.row, Some(2));
    assert!(err.is_constraint_violation());

    // Only the earlier committed batch remains
    let years: Vec<_> = store
        .yields(&YieldFilter::default(), Page::first(10)?)?
        .into_iter()
        .map(|y| y.record_year)
        .collect();
    assert_eq!(years, vec![2019]);
    Ok(())
}

#[tokio::test]
async fn test_read_api_filters_and_pages() -> agweather::Result<()> {
    let workspace = Workspace::new();
    workspace
        .weather_file("USC001.txt", "20210101\t1\t1\t1\n20210102\t2\t2\t2\n20210103\t3\t3\t3\n")
        .weather_file("USC002.txt", "20210101\t9\t9\t9\n")
        .yield_file(
            "US_corn_grain_yield.txt",
            "2015\t1\n2016\t2\n2017\t3\n2018\t4\n2019\t5\n2020\t6\n2021\t7\n",
        );
    refresh(&workspace).await?;
    let store = Store::open(&workspace.database())?;

    // Blank station counts as absent, the date still applies
    let filter = WeatherFilter::parse(Some("  "), Some("20210101"))?;
    let rows = store.weather(&filter, Page::first(10)?)?;
    assert_eq!(rows.len(), 2);

    // Both filters combine
    let filter = WeatherFilter::parse(Some("USC002"), Some("20210101"))?;
    let rows = store.weather(&filter, Page::first(10)?)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].max_temp, Some(9));

    // A malformed date is refused rather than ignored
    assert!(matches!(
        WeatherFilter::parse(None, Some("2021-01-01")),
        Err(ProcessingError::InvalidDate(_))
    ));

    // Pages are 1-based and ordered
    let page_two = store.weather(
        &WeatherFilter::parse(Some("USC001"), None)?,
        Page::new(2, 2)?,
    )?;
    assert_eq!(page_two.len(), 1);
    assert_eq!(page_two[0].record_date, date(2021, 1, 3));

    let yields = store.yields(&YieldFilter::default(), Page::first(5)?)?;
    assert_eq!(yields.len(), 5);
    assert_eq!(yields[0].record_year, 2015);
    let rest = store.yields(&YieldFilter::default(), Page::new(2, 5)?)?;
    assert_eq!(rest.len(), 2);

    let one_year = store.yields(&YieldFilter { year: Some(2018) }, Page::first(5)?)?;
    assert_eq!(one_year, vec![YieldRecord::new(2018, 4)?]);

    let hostile = WeatherFilter::parse(Some("USC001' OR '1'='1"), None)?;
    assert!(store.weather(&hostile, Page::first(10)?)?.is_empty());

    let stats = store.stats(&StatsFilter::parse(Some("USC002"), Some(2021)), Page::first(10)?)?;
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].avg_max_temp, Some(9.0));
    Ok(())
}
