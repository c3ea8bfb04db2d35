use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::health::HealthState;
use crate::catalog::parse_catalog;
use crate::error::{AppError, Result};
use crate::ideas::generate_topic_ideas;
use crate::niche_refresh::NicheRefresher;
use crate::scorer::top_niches;
use crate::state::NicheStore;
use crate::types::{NicheRecord, NicheSummary, TopNiche, TrendingReport};

/// Upper bound on `count` for the ideas endpoint.
const MAX_IDEAS: usize = 50;
const DEFAULT_IDEAS: usize = 5;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Mutex<NicheStore>>,
    pub refresher: NicheRefresher,
    pub health: Arc<HealthState>,
    pub region_code: String,
    pub top_niches_count: usize,
    pub min_videos: u64,
}

impl ApiState {
    fn store(&self) -> MutexGuard<'_, NicheStore> {
        lock_store(&self.store)
    }
}

/// Lock the store, taking it back if a previous holder panicked.
fn lock_store(store: &Mutex<NicheStore>) -> MutexGuard<'_, NicheStore> {
    store.lock().unwrap_or_else(|poisoned| {
        warn!("Niche store lock was poisoned; recovering");
        store.clear_poison();
        PoisonError::into_inner(poisoned)
    })
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/niches/top", get(get_top_niches))
        .route("/niches/:key", get(get_niche))
        .route("/snapshots/:date", get(get_snapshot))
        .route("/staleness", get(get_staleness))
        .route("/refresh", post(post_refresh))
        .route("/ideas", get(get_ideas))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TopNichesQuery {
    pub count: Option<usize>,
    pub min_videos: Option<u64>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct StalenessQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct RefreshQuery {
    pub region: Option<String>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct IdeasQuery {
    pub category: String,
    pub count: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub niches: usize,
    pub last_updated: DateTime<Utc>,
    pub refresh_count: u64,
    pub refresh_failures: u64,
    pub last_refresh_at_secs: u64,
    pub last_refresh_ok: bool,
}

#[derive(Serialize)]
pub struct StalenessResponse {
    pub as_of: NaiveDate,
    pub stale: bool,
}

#[derive(Serialize)]
pub struct IdeasResponse {
    pub category: String,
    pub ideas: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>> {
    let store = state.store();
    let db = store.database();
    Ok(Json(HealthResponse {
        status: "ok",
        niches: db.niches.len(),
        last_updated: db.last_updated,
        refresh_count: state.health.refresh_count(),
        refresh_failures: state.health.refresh_failures(),
        last_refresh_at_secs: state.health.last_refresh_at_secs(),
        last_refresh_ok: state.health.last_refresh_ok(),
    }))
}

async fn get_top_niches(
    State(state): State<ApiState>,
    Query(params): Query<TopNichesQuery>,
) -> Result<Json<Vec<TopNiche>>> {
    let count = params.count.unwrap_or(state.top_niches_count);
    let min_videos = params.min_videos.unwrap_or(state.min_videos);
    let as_of = params.as_of.unwrap_or_else(today);

    let store = state.store();
    Ok(Json(top_niches(store.database(), count, min_videos, as_of)))
}

async fn get_niche(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Json<NicheRecord>> {
    let store = state.store();
    store
        .database()
        .niche(&key)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("niche {key}")))
}

async fn get_snapshot(
    State(state): State<ApiState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<BTreeMap<String, Vec<NicheSummary>>>> {
    let store = state.store();
    store
        .database()
        .snapshot(date)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("snapshot {date}")))
}

async fn get_staleness(
    State(state): State<ApiState>,
    Query(params): Query<StalenessQuery>,
) -> Result<Json<StalenessResponse>> {
    let as_of = params.as_of.unwrap_or_else(today);
    let store = state.store();
    Ok(Json(StalenessResponse {
        as_of,
        stale: state.refresher.is_stale(&store, as_of),
    }))
}

async fn post_refresh(
    State(state): State<ApiState>,
    Query(params): Query<RefreshQuery>,
    body: String,
) -> Result<Json<TrendingReport>> {
    let region = params
        .region
        .map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| state.region_code.clone());
    let as_of = params.as_of.unwrap_or_else(today);

    // Saving rewrites the whole database file, so the refresh runs on the
    // blocking pool.
    let result = match parse_catalog(&body) {
        Ok(items) => {
            let store = Arc::clone(&state.store);
            let refresher = state.refresher.clone();
            let task_region = region.clone();
            tokio::task::spawn_blocking(move || {
                let mut store = lock_store(&store);
                refresher.refresh(&mut store, &items, &task_region, as_of)
            })
            .await
            .map_err(|e| AppError::Task(format!("refresh task: {e}")))
            .and_then(|r| r)
        }
        Err(e) => Err(e),
    };

    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    state.health.record_refresh(result.is_ok(), now_secs);
    if let Err(e) = &result {
        warn!(region = %region, "Refresh failed: {e}");
    }

    result.map(Json)
}

async fn get_ideas(Query(params): Query<IdeasQuery>) -> Result<Json<IdeasResponse>> {
    let count = params.count.unwrap_or(DEFAULT_IDEAS);
    if count > MAX_IDEAS {
        return Err(AppError::InvalidArgument(format!(
            "count must be at most {MAX_IDEAS}"
        )));
    }
    let category = params.category.trim().to_lowercase();
    let ideas = generate_topic_ideas(&category, count)?;
    Ok(Json(IdeasResponse { category, ideas }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::taxonomy::CategoryTaxonomy;

    fn setup() -> (Router, ApiState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = NicheStore::load(dir.path().join("niche_database.json")).unwrap();
        let state = ApiState {
            store: Arc::new(Mutex::new(store)),
            refresher: NicheRefresher::new(Arc::new(CategoryTaxonomy::default())),
            health: Arc::new(HealthState::new()),
            region_code: "US".to_string(),
            top_niches_count: 10,
            min_videos: 3,
        };
        (router(state.clone()), state, dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    fn refresh_request(uri: &str, catalog: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(catalog.to_string()))
            .unwrap()
    }

    fn catalog() -> Value {
        json!({"items": [
            {"id": "1", "snippet": {"title": "Investing for beginners", "description": "stocks"},
             "statistics": {"viewCount": "1000", "likeCount": "100", "commentCount": "0"}},
            {"id": "2", "snippet": {"title": "Fitness routine"},
             "statistics": {"viewCount": "500", "likeCount": "5"}}
        ]})
    }

    #[tokio::test]
    async fn refresh_then_query() {
        let (app, state, _dir) = setup();

        let (status, report) =
            send(&app, refresh_request("/refresh?region=gb&as_of=2025-06-01", catalog())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["region_code"], "GB");
        assert_eq!(report["total_items_analyzed"], 2);
        assert_eq!(report["niches"][0]["category"], "finance");
        assert_eq!(state.health.refresh_count(), 1);
        assert!(state.health.last_refresh_ok());

        let (status, top) = get(&app, "/niches/top?as_of=2025-06-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(top[0]["key"], "finance_investing");
        assert_eq!(top[0]["avg_cpm"], 18.0);
        assert_eq!(top[0]["trend"], "stable");
        assert_eq!(top[1]["key"], "health_fitness");

        let (_, top) = get(&app, "/niches/top?as_of=2025-06-01&count=1").await;
        assert_eq!(top.as_array().unwrap().len(), 1);

        let (status, record) = get(&app, "/niches/finance_investing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["first_seen"], "2025-06-01");
        assert_eq!(record["historical_cpm"]["2025-06-01"], 18.0);

        let (status, snapshot) = get(&app, "/snapshots/2025-06-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["GB"].as_array().unwrap().len(), 2);

        let (_, staleness) = get(&app, "/staleness?as_of=2025-06-02").await;
        assert_eq!(staleness["stale"], false);
        let (_, staleness) = get(&app, "/staleness?as_of=2025-06-03").await;
        assert_eq!(staleness["stale"], true);

        let (status, health) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["niches"], 2);
        assert_eq!(health["refresh_count"], 1);
    }

    #[tokio::test]
    async fn refresh_survives_huge_view_counts() {
        let (app, _state, _dir) = setup();
        let catalog = json!([
            {"id": "a", "snippet": {"title": "Fitness"}, "statistics": {"viewCount": "18446744073709551615"}},
            {"id": "b", "snippet": {"title": "Fitness"}, "statistics": {"viewCount": "1"}}
        ]);

        let (status, report) = send(&app, refresh_request("/refresh", catalog)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["niches"][0]["total_views"], u64::MAX);

        assert_eq!(get(&app, "/health").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn poisoned_store_lock_is_recovered() {
        let (app, state, _dir) = setup();
        let store = Arc::clone(&state.store);
        let _ = std::thread::spawn(move || {
            let _guard = store.lock().unwrap();
            panic!("holder panicked");
        })
        .join();
        assert!(state.store.is_poisoned());

        let (status, health) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");
        assert!(!state.store.is_poisoned());

        let (status, _) = send(&app, refresh_request("/refresh", catalog())).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_catalog_is_unprocessable() {
        let (app, state, _dir) = setup();
        let (status, _) = send(&app, refresh_request("/refresh", json!({"items": []}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.health.refresh_failures(), 1);
        assert!(!state.health.last_refresh_ok());
    }

    #[tokio::test]
    async fn malformed_catalog_is_bad_request() {
        let (app, _state, _dir) = setup();
        let request = Request::builder()
            .method("POST")
            .uri("/refresh")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_niche_and_snapshot_are_not_found() {
        let (app, _state, _dir) = setup();
        assert_eq!(get(&app, "/niches/finance_investing").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/snapshots/2025-06-01").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_store_has_no_top_niches() {
        let (app, _state, _dir) = setup();
        let (status, top) = get(&app, "/niches/top").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(top, json!([]));
    }

    #[tokio::test]
    async fn ideas_endpoint() {
        let (app, _state, _dir) = setup();

        let (status, body) = get(&app, "/ideas?category=Finance&count=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "finance");
        assert_eq!(body["ideas"].as_array().unwrap().len(), 3);

        assert_eq!(get(&app, "/ideas?category=gardening").await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            get(&app, "/ideas?category=finance&count=500").await.0,
            StatusCode::BAD_REQUEST
        );
    }
}
