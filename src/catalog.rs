//! Trending-content catalog parsing.
//!
//! Accepts the item shape of a YouTube `videos.list` response, either as the
//! full response (`{"items": [...]}`) or as a bare array of items. Statistics
//! may be integers or numeric strings; anything missing or unparseable reads
//! as 0. Items without an id are skipped.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::types::{ContentItem, Engagement};

static SKIPPED_ITEMS: AtomicU64 = AtomicU64::new(0);

/// Parse a catalog document into content items.
pub fn parse_catalog(json: &str) -> Result<Vec<ContentItem>> {
    let doc: Value = serde_json::from_str(json)?;
    let items = match &doc {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::InvalidArgument(
                    "catalog object has no items array".to_string(),
                ))
            }
        },
        _ => {
            return Err(AppError::InvalidArgument(
                "catalog must be an array or an object with an items array".to_string(),
            ))
        }
    };

    let parsed: Vec<ContentItem> = items.iter().filter_map(parse_video_item).collect();
    let skipped = items.len() - parsed.len();
    if skipped > 0 {
        let total = SKIPPED_ITEMS.fetch_add(skipped as u64, Ordering::Relaxed) + skipped as u64;
        warn!(skipped, total_skipped = total, "Skipped catalog items without an id");
    }
    debug!(items = parsed.len(), "Parsed catalog");
    Ok(parsed)
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<ContentItem>> {
    let contents = std::fs::read_to_string(path)?;
    let items = parse_catalog(&contents)?;
    info!(path = %path.display(), items = items.len(), "Loaded trending catalog");
    Ok(items)
}

/// Convert one raw item. Returns None only when the item has no usable id.
pub fn parse_video_item(v: &Value) -> Option<ContentItem> {
    let id = match v.get("id")? {
        Value::String(s) => s.clone(),
        // search.list results wrap the id: {"kind": ..., "videoId": ...}
        Value::Object(obj) => obj.get("videoId")?.as_str()?.to_string(),
        _ => return None,
    };
    if id.is_empty() {
        return None;
    }

    // Each snippet field is read on its own so one bad field keeps the rest.
    let snippet = v.get("snippet");
    let text = |key: &str| {
        snippet
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let tags = snippet
        .and_then(|s| s.get("tags"))
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let published_at = snippet
        .and_then(|s| s.get("publishedAt"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let stats = v.get("statistics");
    let engagement = Engagement {
        view_count: parse_count(stats.and_then(|s| s.get("viewCount"))),
        like_count: parse_count(stats.and_then(|s| s.get("likeCount"))),
        comment_count: parse_count(stats.and_then(|s| s.get("commentCount"))),
    };

    Some(ContentItem {
        id,
        title: text("title"),
        description: text("description"),
        tags,
        platform_category_id: text("categoryId"),
        channel_title: text("channelTitle"),
        published_at,
        engagement,
    })
}

/// Integer, float or numeric string → count. Negative or garbage → 0.
fn parse_count(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_videos_list_response() {
        let doc = json!({
            "kind": "youtube#videoListResponse",
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "Top 10 Investing Tips",
                    "description": "Grow your money",
                    "tags": ["finance", "stocks"],
                    "categoryId": "27",
                    "channelTitle": "Money Channel",
                    "publishedAt": "2025-01-01T12:00:00Z"
                },
                "statistics": {"viewCount": "1000", "likeCount": "50", "commentCount": "5"}
            }]
        });

        let items = parse_catalog(&doc.to_string()).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "abc123");
        assert_eq!(item.tags, ["finance", "stocks"]);
        assert_eq!(item.platform_category_id, "27");
        assert_eq!(item.channel_title, "Money Channel");
        assert_eq!(item.published_at.as_deref(), Some("2025-01-01T12:00:00Z"));
        assert_eq!(item.engagement, Engagement { view_count: 1000, like_count: 50, comment_count: 5 });
    }

    #[test]
    fn accepts_bare_array_and_integer_counts() {
        let doc = json!([
            {"id": "a", "statistics": {"viewCount": 10, "likeCount": 2}},
            {"id": {"kind": "youtube#video", "videoId": "b"}}
        ]);
        let items = parse_catalog(&doc.to_string()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].engagement.view_count, 10);
        assert_eq!(items[0].engagement.like_count, 2);
        assert_eq!(items[0].engagement.comment_count, 0);
        assert_eq!(items[1].id, "b");
        assert_eq!(items[1].title, "");
    }

    #[test]
    fn skips_items_without_id() {
        let doc = json!({"items": [{"snippet": {"title": "x"}}, {"id": ""}, {"id": "ok"}]});
        let items = parse_catalog(&doc.to_string()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "ok");
    }

    #[test]
    fn bad_counts_read_as_zero() {
        assert_eq!(parse_count(Some(&json!("n/a"))), 0);
        assert_eq!(parse_count(Some(&json!(-5))), 0);
        assert_eq!(parse_count(Some(&json!(12.9))), 12);
        assert_eq!(parse_count(Some(&json!(" 42 "))), 42);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn rejects_non_catalog_documents() {
        assert!(matches!(parse_catalog("42"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_catalog(r#"{"kind": "x"}"#), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_catalog("{oops"), Err(AppError::Json(_))));
    }

    #[test]
    fn bad_snippet_fields_do_not_drop_good_ones() {
        let doc = json!([{
            "id": "a",
            "snippet": {
                "title": "Cryptocurrency explained",
                "description": null,
                "tags": ["bitcoin", 7, "ETH"],
                "categoryId": 27,
                "channelTitle": "Coins"
            }
        }]);
        let items = parse_catalog(&doc.to_string()).unwrap();
        let item = &items[0];
        assert_eq!(item.title, "Cryptocurrency explained");
        assert_eq!(item.description, "");
        assert_eq!(item.tags, ["bitcoin", "ETH"]);
        assert_eq!(item.platform_category_id, "");
        assert_eq!(item.channel_title, "Coins");
        assert!(item.published_at.is_none());

        let taxonomy = crate::taxonomy::CategoryTaxonomy::default();
        assert_eq!(crate::classifier::classify(item, &taxonomy).key(), "finance_cryptocurrency");
    }

    #[test]
    fn malformed_snippet_falls_back_to_defaults() {
        let doc = json!([{"id": "a", "snippet": {"title": 5, "tags": "not-a-list"}}, {"id": "b", "snippet": 3}]);
        let items = parse_catalog(&doc.to_string()).unwrap();
        assert_eq!(items[0].title, "");
        assert!(items[0].tags.is_empty());
        assert_eq!(items[1].title, "");
    }
}
