use std::collections::HashMap;

use tracing::debug;

use crate::classifier::classify;
use crate::taxonomy::CategoryTaxonomy;
use crate::types::{ContentItem, NicheSummary};

/// Classify every item and fold the results into one summary per niche.
///
/// Summaries come back in the order their niche first appeared in `items`.
/// A summary's `estimated_cpm` is the CPM of the classification that opened
/// it; the taxonomy gives every niche a single CPM, so later items agree.
pub fn summarize(items: &[ContentItem], taxonomy: &CategoryTaxonomy) -> Vec<NicheSummary> {
    let mut summaries: Vec<NicheSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let classification = classify(item, taxonomy);
        debug!(
            item_id = %item.id,
            category = %classification.category,
            subcategory = %classification.subcategory,
            confidence = classification.confidence,
            "classified item"
        );

        let slot = *index.entry(classification.key()).or_insert_with(|| {
            summaries.push(NicheSummary::from_classification(&classification));
            summaries.len() - 1
        });
        summaries[slot].push(item);
    }

    // Averages only after every item is in, so empty buckets never divide.
    for summary in &mut summaries {
        summary.finalize();
    }

    summaries
}

/// Highest estimated CPM first, keeping input order among equal CPMs.
pub fn rank(summaries: &[NicheSummary], top_n: usize) -> Vec<NicheSummary> {
    let mut ranked = summaries.to_vec();
    // sort_by is stable.
    ranked.sort_by(|a, b| b.estimated_cpm.total_cmp(&a.estimated_cpm));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Engagement;

    fn item(id: &str, title: &str, views: u64, likes: u64, comments: u64) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: title.to_string(),
            channel_title: format!("channel-{id}"),
            engagement: Engagement { view_count: views, like_count: likes, comment_count: comments },
            ..Default::default()
        }
    }

    #[test]
    fn groups_items_by_niche_in_first_seen_order() {
        let taxonomy = CategoryTaxonomy::default();
        let items = vec![
            item("1", "Fitness routine", 1000, 50, 10),
            item("2", "Investing 101", 2000, 100, 20),
            item("3", "Fitness for beginners", 3000, 150, 30),
            item("4", "Cute dogs", 0, 0, 0),
        ];

        let summaries = summarize(&items, &taxonomy);
        let keys: Vec<_> = summaries.iter().map(|s| s.key()).collect();
        assert_eq!(keys, ["health_fitness", "finance_investing", "unknown_general"]);

        let fitness = &summaries[0];
        assert_eq!(fitness.video_count, 2);
        assert_eq!(fitness.total_views, 4000);
        assert_eq!(fitness.total_likes, 200);
        assert_eq!(fitness.total_comments, 40);
        assert!((fitness.avg_views - 2000.0).abs() < 1e-9);
        assert!((fitness.avg_engagement_rate - 0.06).abs() < 1e-12);
        assert_eq!(fitness.estimated_cpm, 12.0);
        let ids: Vec<_> = fitness.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(fitness.videos[1].source_label, "channel-3");

        let unknown = &summaries[2];
        assert_eq!(unknown.estimated_cpm, 5.0);
        assert_eq!(unknown.avg_engagement_rate, 0.0);
    }

    #[test]
    fn empty_input_yields_no_summaries() {
        assert!(summarize(&[], &CategoryTaxonomy::default()).is_empty());
    }

    #[test]
    fn rank_sorts_by_cpm_descending_and_truncates() {
        let taxonomy = CategoryTaxonomy::default();
        let items = vec![
            item("1", "Fitness", 10, 0, 0),        // 12.0
            item("2", "Cryptocurrency", 10, 0, 0), // 20.0
            item("3", "Education", 10, 0, 0),      // 10.0
        ];
        let ranked = rank(&summarize(&items, &taxonomy), 2);
        let cpms: Vec<_> = ranked.iter().map(|s| s.estimated_cpm).collect();
        assert_eq!(cpms, [20.0, 12.0]);
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let a = NicheSummary::new("business", "marketing", 16.0).unwrap();
        let b = NicheSummary::new("finance", "personal_finance", 16.0).unwrap();
        let c = NicheSummary::new("technology", "saas", 16.0).unwrap();
        let top = NicheSummary::new("finance", "cryptocurrency", 20.0).unwrap();

        let ranked = rank(&[a, b, top, c], 10);
        let keys: Vec<_> = ranked.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            [
                "finance_cryptocurrency",
                "business_marketing",
                "finance_personal_finance",
                "technology_saas"
            ]
        );
    }

    #[test]
    fn rank_zero_is_empty() {
        let a = NicheSummary::new("business", "marketing", 16.0).unwrap();
        assert!(rank(&[a], 0).is_empty());
    }
}
