use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const DEFAULT_DB_PATH: &str = "data/niche_database.json";
pub const DEFAULT_REGION: &str = "US";

/// Score added when a category or subcategory name appears in the corpus.
pub const EXACT_TERM_WEIGHT: u32 = 5;

/// Score added per fallback keyword hit when no exact term matched.
pub const KEYWORD_WEIGHT: u32 = 1;

/// Raw score that maps to full confidence. Confidence is `min(score / this, 1.0)`.
pub const CONFIDENCE_SCALE: f64 = 10.0;

/// CPM assigned to content that neither pass could classify.
pub const UNKNOWN_CPM: f64 = 5.0;

pub const UNKNOWN_CATEGORY: &str = "unknown";
pub const GENERAL_SUBCATEGORY: &str = "general";

/// Records last seen before `as_of - RECENCY_WINDOW_DAYS` drop out of the
/// top-niche query, and only CPM entries inside the window count toward `avg_cpm`.
pub const RECENCY_WINDOW_DAYS: i64 = 7;

/// Trend label thresholds.
pub mod trend_thresholds {
    /// Number of most recent distinct dates compared (first vs last).
    pub const WINDOW_DATES: usize = 7;
    /// Percent change above which the trend is `up`.
    pub const UP_PCT: f64 = 5.0;
    /// Percent change below which the trend is `down`.
    pub const DOWN_PCT: f64 = -5.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: PathBuf,
    pub api_port: u16,
    /// Optional JSON taxonomy overriding the built-in one (TAXONOMY_PATH)
    pub taxonomy_path: Option<PathBuf>,
    /// Trending catalog ingested at startup when the database is stale (CATALOG_PATH)
    pub catalog_path: Option<PathBuf>,
    /// Region code recorded with each snapshot (REGION_CODE)
    pub region_code: String,
    /// Default `count` for the top-niche query (TOP_NICHES_COUNT)
    pub top_niches_count: usize,
    /// Default `min_videos` for the top-niche query (MIN_VIDEOS). Not enforced as a filter.
    pub min_videos: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("NICHE_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
                .into(),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            taxonomy_path: optional_path("TAXONOMY_PATH"),
            catalog_path: optional_path("CATALOG_PATH"),
            region_code: std::env::var("REGION_CODE")
                .map(|s| s.trim().to_uppercase())
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            top_niches_count: std::env::var("TOP_NICHES_COUNT")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<usize>()
                .unwrap_or(10),
            min_videos: std::env::var("MIN_VIDEOS")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<u64>()
                .unwrap_or(3),
        })
    }
}

fn optional_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
