use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::scorer::{is_stale, rank, summarize};
use crate::state::NicheStore;
use crate::taxonomy::CategoryTaxonomy;
use crate::types::{ContentItem, TrendingReport};

/// Runs classify → summarize → rank → persist cycles against a [`NicheStore`].
///
/// Nothing here runs on a timer. Callers check [`NicheRefresher::is_stale`]
/// and decide whether a refresh is worth its cost before reading.
#[derive(Clone)]
pub struct NicheRefresher {
    taxonomy: Arc<CategoryTaxonomy>,
}

impl NicheRefresher {
    pub fn new(taxonomy: Arc<CategoryTaxonomy>) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    pub fn is_stale(&self, store: &NicheStore, as_of: NaiveDate) -> bool {
        is_stale(store.database(), as_of)
    }

    /// Classify `items`, store the day's summaries for `region` and return the
    /// ranked report. An empty catalog is an error and leaves the store untouched.
    pub fn refresh(
        &self,
        store: &mut NicheStore,
        items: &[ContentItem],
        region: &str,
        as_of: NaiveDate,
    ) -> Result<TrendingReport> {
        if items.is_empty() {
            warn!(region, "No trending content supplied; skipping refresh");
            return Err(AppError::EmptyCatalog(region.to_string()));
        }

        let summaries = summarize(items, &self.taxonomy);
        let ranked = rank(&summaries, summaries.len());
        store.update(&ranked, region, as_of)?;

        info!(
            region,
            date = %as_of,
            items = items.len(),
            niches = ranked.len(),
            top = %ranked.first().map(|s| s.key()).unwrap_or_default(),
            "Niche refresh complete: {} items into {} niches",
            items.len(),
            ranked.len(),
        );

        Ok(TrendingReport {
            date: Utc::now(),
            region_code: region.to_string(),
            total_items_analyzed: items.len(),
            niches: ranked,
        })
    }

    /// Refresh only when the store is stale, pulling items from `source`.
    ///
    /// `source` is not called for a fresh store. Its errors are returned as-is;
    /// retrying is the source's business. Returns the report when a refresh ran.
    pub fn refresh_if_stale<F>(
        &self,
        store: &mut NicheStore,
        region: &str,
        as_of: NaiveDate,
        source: F,
    ) -> Result<Option<TrendingReport>>
    where
        F: FnOnce() -> Result<Vec<ContentItem>>,
    {
        if !self.is_stale(store, as_of) {
            return Ok(None);
        }
        let items = source()?;
        self.refresh(store, &items, region, as_of).map(Some)
    }
}
