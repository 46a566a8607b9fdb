use crate::utils::constants::DEFAULT_LOGS_PAGE_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agweather")]
#[command(about = "Load station weather and crop-yield files into SQLite and query them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Settings file [default: ./agweather.{toml,ini,json,yaml}]")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "SQLite database path")]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drop and recreate all tables, reload weather and yield files, rebuild stats
    Refresh {
        #[arg(short, long, help = "Directory of per-station weather files")]
        weather_dir: Option<PathBuf>,

        #[arg(short, long, help = "Directory of yield files")]
        yield_dir: Option<PathBuf>,

        #[arg(long, help = "Glob pattern for source files, e.g. '*.txt'")]
        file_pattern: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Parse and normalize source files without touching the database
    Validate {
        #[arg(short, long)]
        weather_dir: Option<PathBuf>,

        #[arg(short, long)]
        yield_dir: Option<PathBuf>,

        #[arg(long)]
        file_pattern: Option<String>,
    },

    /// Query daily weather records
    Weather {
        #[arg(short, long)]
        station_id: Option<String>,

        #[arg(short, long, help = "Date as YYYYMMDD")]
        date: Option<String>,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, help = "Page size [default: paging.weather_limit]")]
        limit: Option<u32>,
    },

    /// Query yearly crop yield
    Yield {
        #[arg(short = 'Y', long)]
        year: Option<i16>,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, help = "Page size [default: paging.yield_limit]")]
        limit: Option<u32>,
    },

    /// Query per-station yearly statistics
    Stats {
        #[arg(short, long)]
        station_id: Option<String>,

        #[arg(short = 'Y', long)]
        year: Option<i16>,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, help = "Page size [default: paging.stats_limit]")]
        limit: Option<u32>,
    },

    /// Show the ingestion audit log of the last refresh
    Logs {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short, long, default_value_t = DEFAULT_LOGS_PAGE_SIZE)]
        limit: u32,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Refresh { .. } => "refresh",
            Commands::Validate { .. } => "validate",
            Commands::Weather { .. } => "weather",
            Commands::Yield { .. } => "yield",
            Commands::Stats { .. } => "stats",
            Commands::Logs { .. } => "logs",
        }
    }
}
