use chrono::{Duration, NaiveDate};

use crate::config::RECENCY_WINDOW_DAYS;
use crate::state::NicheDatabase;
use crate::types::TopNiche;

/// True when there is no snapshot for `as_of` nor for the day before.
///
/// Callers decide whether a stale database warrants a refresh before querying.
pub fn is_stale(db: &NicheDatabase, as_of: NaiveDate) -> bool {
    let yesterday = as_of - Duration::days(1);
    !db.has_snapshot(as_of) && !db.has_snapshot(yesterday)
}

/// Niches seen within the recency window, highest average CPM first.
///
/// `avg_cpm` averages the CPM entries dated on or after `as_of - 7 days`
/// (0 if none). Records last seen before that cutoff are dropped. Equal
/// averages keep niche-key order.
///
/// `min_videos` is accepted but does not filter anything.
pub fn top_niches(db: &NicheDatabase, count: usize, min_videos: u64, as_of: NaiveDate) -> Vec<TopNiche> {
    // TODO: filter on per-niche video counts once the intended meaning of min_videos is settled.
    let _ = min_videos;
    let cutoff = as_of - Duration::days(RECENCY_WINDOW_DAYS);

    let mut ranked: Vec<TopNiche> = db
        .niches
        .iter()
        .filter(|(_, record)| record.last_seen >= cutoff)
        .map(|(key, record)| {
            let recent: Vec<f64> = record
                .historical_cpm
                .range(cutoff..)
                .map(|(_, &cpm)| cpm)
                .collect();
            let avg_cpm = if recent.is_empty() {
                0.0
            } else {
                recent.iter().sum::<f64>() / recent.len() as f64
            };

            TopNiche {
                key: key.clone(),
                category: record.category.clone(),
                subcategory: record.subcategory.clone(),
                avg_cpm,
                trend: record.trend,
                last_seen: record.last_seen,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.avg_cpm.total_cmp(&a.avg_cpm));
    ranked.truncate(count);
    ranked
}
