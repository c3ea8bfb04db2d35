use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use niche_scanner::api::{router, ApiState, HealthState};
use niche_scanner::catalog::load_catalog;
use niche_scanner::config::Config;
use niche_scanner::error::{AppError, Result};
use niche_scanner::types::TopNiche;
use niche_scanner::{top_niches, CategoryTaxonomy, NicheRefresher, NicheStore};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Taxonomy ---
    let taxonomy = match &cfg.taxonomy_path {
        Some(path) => CategoryTaxonomy::from_file(path)?,
        None => {
            info!("TAXONOMY_PATH not set, using built-in categories");
            CategoryTaxonomy::default()
        }
    };
    let refresher = NicheRefresher::new(Arc::new(taxonomy));

    // --- Niche database ---
    let mut store = NicheStore::load(cfg.db_path.clone())?;
    info!(
        "Niche database ready at {} ({} niches)",
        cfg.db_path.display(),
        store.database().niches.len()
    );

    // --- Startup refresh from a catalog file ---
    let health = Arc::new(HealthState::new());
    let today = Utc::now().date_naive();
    match &cfg.catalog_path {
        Some(path) => {
            let result = refresher.refresh_if_stale(&mut store, &cfg.region_code, today, || {
                load_catalog(path)
            });
            match result {
                Ok(Some(report)) => {
                    health.record_refresh(true, now_secs());
                    info!(
                        "Startup refresh: {} items, {} niches for {}",
                        report.total_items_analyzed,
                        report.niches.len(),
                        report.region_code,
                    );
                }
                Ok(None) => info!("Niche database is fresh for {today}; skipping startup refresh"),
                Err(AppError::EmptyCatalog(region)) => {
                    health.record_refresh(false, now_secs());
                    warn!("Catalog at {} has no items for {region}", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        None => {
            if refresher.is_stale(&store, today) {
                warn!("Niche database is stale and CATALOG_PATH is not set. POST a catalog to /refresh to update it.");
            }
        }
    }

    log_top_niches(&top_niches(
        store.database(),
        cfg.top_niches_count,
        cfg.min_videos,
        today,
    ));

    // --- HTTP API server ---
    let api_state = ApiState {
        store: Arc::new(Mutex::new(store)),
        refresher,
        health,
        region_code: cfg.region_code.clone(),
        top_niches_count: cfg.top_niches_count,
        min_videos: cfg.min_videos,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_top_niches(top: &[TopNiche]) {
    if top.is_empty() {
        info!("No niches seen in the last week");
        return;
    }
    for (rank, niche) in top.iter().enumerate() {
        info!(
            event = "TOP_NICHE",
            rank = rank + 1,
            key = %niche.key,
            avg_cpm = niche.avg_cpm,
            trend = %niche.trend,
            "#{} {} | avg CPM: ${:.2} | trend: {} | last seen: {}",
            rank + 1,
            niche.key,
            niche.avg_cpm,
            niche.trend,
            niche.last_seen,
        );
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
