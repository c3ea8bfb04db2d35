use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Builds the `category_subcategory` identifier of a niche.
pub fn niche_key(category: &str, subcategory: &str) -> String {
    format!("{category}_{subcategory}")
}

// ---------------------------------------------------------------------------
// Content items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

impl Engagement {
    /// `(likes + comments) / views`, or 0 when there are no views.
    pub fn rate(&self) -> f64 {
        if self.view_count == 0 {
            return 0.0;
        }
        self.like_count.saturating_add(self.comment_count) as f64 / self.view_count as f64
    }
}

/// One trending video as handed over by the catalog source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub platform_category_id: String,
    /// Provenance label carried into summaries (the channel name on YouTube).
    pub channel_title: String,
    pub published_at: Option<String>,
    pub engagement: Engagement,
}

impl ContentItem {
    pub fn engagement_rate(&self) -> f64 {
        self.engagement.rate()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheClassification {
    pub category: String,
    pub subcategory: String,
    /// Linear in the raw score, clamped to [0, 1]. Not a probability.
    pub confidence: f64,
    pub estimated_cpm: f64,
}

impl NicheClassification {
    pub fn key(&self) -> String {
        niche_key(&self.category, &self.subcategory)
    }
}

// ---------------------------------------------------------------------------
// Daily niche summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
    pub title: String,
    pub source_label: String,
}

/// Aggregate of every item classified into one niche on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheSummary {
    pub category: String,
    pub subcategory: String,
    pub video_count: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub avg_views: f64,
    pub avg_engagement_rate: f64,
    pub estimated_cpm: f64,
    pub videos: Vec<VideoRef>,
}

impl NicheSummary {
    /// Empty summary for a niche. Rejects a CPM that is not strictly positive.
    pub fn new(category: &str, subcategory: &str, estimated_cpm: f64) -> Result<Self> {
        if !(estimated_cpm.is_finite() && estimated_cpm > 0.0) {
            return Err(AppError::InvalidArgument(format!(
                "niche {} has non-positive CPM {estimated_cpm}",
                niche_key(category, subcategory)
            )));
        }
        Ok(Self::empty(category, subcategory, estimated_cpm))
    }

    /// Bucket opened by a classification. Classifier CPMs come from a validated
    /// taxonomy or the unknown floor, so no check is needed.
    pub(crate) fn from_classification(c: &NicheClassification) -> Self {
        Self::empty(&c.category, &c.subcategory, c.estimated_cpm)
    }

    fn empty(category: &str, subcategory: &str, estimated_cpm: f64) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            video_count: 0,
            total_views: 0,
            total_likes: 0,
            total_comments: 0,
            avg_views: 0.0,
            avg_engagement_rate: 0.0,
            estimated_cpm,
            videos: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        niche_key(&self.category, &self.subcategory)
    }

    /// Fold one item into the running totals. Averages are left for `finalize`.
    pub fn push(&mut self, item: &ContentItem) {
        self.video_count += 1;
        self.total_views = self.total_views.saturating_add(item.engagement.view_count);
        self.total_likes = self.total_likes.saturating_add(item.engagement.like_count);
        self.total_comments = self.total_comments.saturating_add(item.engagement.comment_count);
        self.videos.push(VideoRef {
            id: item.id.clone(),
            title: item.title.clone(),
            source_label: item.channel_title.clone(),
        });
    }

    /// Derive the averages once every item has been pushed.
    pub fn finalize(&mut self) {
        if self.video_count > 0 {
            self.avg_views = self.total_views as f64 / self.video_count as f64;
        }
        self.avg_engagement_rate = if self.total_views > 0 {
            self.total_likes.saturating_add(self.total_comments) as f64 / self.total_views as f64
        } else {
            0.0
        };
    }
}

// ---------------------------------------------------------------------------
// Persisted niche record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheRecord {
    pub category: String,
    pub subcategory: String,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    /// date → CPM. One entry per day the niche appeared; same-day writes overwrite.
    pub historical_cpm: BTreeMap<NaiveDate, f64>,
    /// date → average engagement rate.
    pub historical_engagement: BTreeMap<NaiveDate, f64>,
    pub trend: Trend,
}

impl NicheRecord {
    pub fn new(category: &str, subcategory: &str, seen: NaiveDate) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            first_seen: seen,
            last_seen: seen,
            historical_cpm: BTreeMap::new(),
            historical_engagement: BTreeMap::new(),
            trend: Trend::Stable,
        }
    }

    pub fn key(&self) -> String {
        niche_key(&self.category, &self.subcategory)
    }
}

// ---------------------------------------------------------------------------
// Query and refresh outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNiche {
    pub key: String,
    pub category: String,
    pub subcategory: String,
    pub avg_cpm: f64,
    pub trend: Trend,
    pub last_seen: NaiveDate,
}

/// Result of one classify → summarize → persist cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingReport {
    pub date: DateTime<Utc>,
    pub region_code: String,
    pub total_items_analyzed: usize,
    /// Summaries ranked by estimated CPM, highest first.
    pub niches: Vec<NicheSummary>,
}
