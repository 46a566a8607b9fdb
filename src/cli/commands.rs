use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::models::RawRow;
use crate::processors::{Normalizer, Pipeline, PipelineConfig};
use crate::readers::{DelimitedReader, ParseReport, WEATHER_SCHEMA, YIELD_SCHEMA};
use crate::store::{Page, StatsFilter, Store, WeatherFilter, YieldFilter};
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use tracing::{debug, error, info, warn};

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?.with_database(cli.database);

    match cli.command {
        Commands::Refresh {
            weather_dir,
            yield_dir,
            file_pattern,
            max_workers,
        } => {
            let settings =
                settings.with_sources(weather_dir, yield_dir, file_pattern, max_workers)?;
            refresh(&settings, cli.quiet).await?;
        }

        Commands::Validate {
            weather_dir,
            yield_dir,
            file_pattern,
        } => {
            let settings = settings.with_sources(weather_dir, yield_dir, file_pattern, None)?;
            validate(&settings)?;
        }

        Commands::Weather {
            station_id,
            date,
            page,
            limit,
        } => {
            let filter = WeatherFilter::parse(station_id.as_deref(), date.as_deref())?;
            let page = Page::new(page, limit.unwrap_or(settings.paging.weather_limit))?;
            let store = Store::open_read_only(&settings.database)?;
            print_json(&store.weather(&filter, page)?)?;
        }

        Commands::Yield { year, page, limit } => {
            let filter = YieldFilter { year };
            let page = Page::new(page, limit.unwrap_or(settings.paging.yield_limit))?;
            let store = Store::open_read_only(&settings.database)?;
            print_json(&store.yields(&filter, page)?)?;
        }

        Commands::Stats {
            station_id,
            year,
            page,
            limit,
        } => {
            let filter = StatsFilter::parse(station_id.as_deref(), year);
            let page = Page::new(page, limit.unwrap_or(settings.paging.stats_limit))?;
            let store = Store::open_read_only(&settings.database)?;
            print_json(&store.stats(&filter, page)?)?;
        }

        Commands::Logs { page, limit } => {
            let store = Store::open_read_only(&settings.database)?;
            print_json(&store.logs(Page::new(page, limit)?)?)?;
        }
    }

    Ok(())
}

async fn refresh(settings: &Settings, quiet: bool) -> Result<()> {
    info!("Database: {}", settings.database.display());
    info!("Weather directory: {}", settings.weather_dir.display());
    info!("Yield directory: {}", settings.yield_dir.display());
    debug!(
        "File pattern: {}, workers: {}",
        settings.file_pattern, settings.max_workers
    );

    let progress = ProgressReporter::new_spinner("Starting refresh cycle...", quiet);
    let mut pipeline = Pipeline::open(&settings.database, PipelineConfig::from(settings))?;

    let outcome = pipeline.refresh(Some(&progress)).await;
    match &outcome {
        Ok(report) => {
            progress.finish_with_message("Refresh complete");
            println!("\n{}", report.summary());
            for entry in report.entries.iter().filter(|e| e.is_failure()) {
                println!("  {}", entry.summary());
            }
        }
        Err(e) => {
            progress.abandon_with_message("Refresh halted");
            error!("{}", e);
            for entry in pipeline.entries() {
                println!("  {}", entry.summary());
            }
        }
    }

    if let Err(e) = pipeline.close() {
        warn!("Failed to close database: {}", e);
    }
    outcome.map(|_| ())
}

#[derive(Debug, Default)]
struct ValidationSummary {
    files: usize,
    rows: usize,
    valid: usize,
    rejected: usize,
    issues: Vec<String>,
}

impl ValidationSummary {
    fn from_report<T>(report: &ParseReport, normalize: impl Fn(&RawRow) -> Result<T>) -> Self {
        let mut summary = Self {
            files: report.files.len() + report.failures.len(),
            rows: report.total_rows(),
            ..Self::default()
        };

        for failure in &report.failures {
            summary
                .issues
                .push(format!("{}: {}", failure.file.source_id, failure.error));
        }

        for parsed in &report.files {
            for row in &parsed.rows {
                let issue = match row {
                    Ok(raw) => normalize(raw).err().map(|e| e.to_string()),
                    Err(e) => Some(e.to_string()),
                };
                match issue {
                    None => summary.valid += 1,
                    Some(issue) => {
                        summary.rejected += 1;
                        summary
                            .issues
                            .push(format!("{}: {}", parsed.file.source_id, issue));
                    }
                }
            }
        }

        summary
    }

    fn print(&self, label: &str) {
        println!(
            "{}: {} files, {} rows, {} valid, {} rejected",
            label, self.files, self.rows, self.valid, self.rejected
        );
    }
}

fn validate(settings: &Settings) -> Result<()> {
    let normalizer = Normalizer::new();

    let weather = DelimitedReader::new(WEATHER_SCHEMA)
        .with_pattern(&settings.file_pattern)
        .read_dir(&settings.weather_dir)?;
    let weather = ValidationSummary::from_report(&weather, |row| normalizer.normalize_weather(row));

    let yields = DelimitedReader::new(YIELD_SCHEMA)
        .with_pattern(&settings.file_pattern)
        .read_dir(&settings.yield_dir)?;
    let yields = ValidationSummary::from_report(&yields, |row| normalizer.normalize_yield(row));

    weather.print("Weather");
    yields.print("Yield");

    let issues: Vec<_> = weather.issues.iter().chain(yields.issues.iter()).collect();
    if issues.is_empty() {
        println!("✅ All files passed validation checks");
    } else {
        println!("⚠️  Found {} validation issues", issues.len());
        for issue in issues.iter().take(20) {
            println!("  {}", issue);
        }
        if issues.len() > 20 {
            println!("  ... and {} more", issues.len() - 20);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Structured logging to stderr. `RUST_LOG` takes precedence over the flags.
fn setup_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("agweather={}", log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init();

    debug!("Logging initialized at level: {}", log_level);
}
