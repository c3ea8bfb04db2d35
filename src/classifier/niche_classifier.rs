use crate::config::{
    CONFIDENCE_SCALE, EXACT_TERM_WEIGHT, GENERAL_SUBCATEGORY, KEYWORD_WEIGHT, UNKNOWN_CATEGORY,
    UNKNOWN_CPM,
};
use crate::taxonomy::CategoryTaxonomy;
use crate::types::{ContentItem, NicheClassification};

/// Classify an item into a niche of `taxonomy`.
///
/// Matching is plain substring containment on the lowercased
/// `title + description + tags` corpus, so a term also matches inside longer
/// words. Pass 1 scores category names and subcategory names (underscores read
/// as spaces); only if nothing matched does pass 2 score the fallback keywords.
/// Score ties go to the category or subcategory declared first.
pub fn classify(item: &ContentItem, taxonomy: &CategoryTaxonomy) -> NicheClassification {
    let corpus = build_corpus(item);
    let categories = taxonomy.categories();

    let mut category_scores = vec![0u32; categories.len()];
    let mut subcategory_scores: Vec<Vec<u32>> = Vec::with_capacity(categories.len());

    for (i, cat) in categories.iter().enumerate() {
        if corpus.contains(cat.name.as_str()) {
            category_scores[i] += EXACT_TERM_WEIGHT;
        }

        let mut subs = vec![0u32; cat.subcategories.len()];
        for (j, sub) in cat.subcategories.iter().enumerate() {
            if corpus.contains(sub.name.replace('_', " ").as_str()) {
                subs[j] = EXACT_TERM_WEIGHT;
                category_scores[i] += EXACT_TERM_WEIGHT;
            }
        }
        subcategory_scores.push(subs);
    }

    let mut winner = first_max(&category_scores);

    if winner.map_or(true, |(_, score)| score == 0) {
        for (i, cat) in categories.iter().enumerate() {
            let hits = cat
                .keywords
                .iter()
                .filter(|k| corpus.contains(k.as_str()))
                .count() as u32;
            category_scores[i] += hits * KEYWORD_WEIGHT;
        }
        winner = first_max(&category_scores);
    }

    let Some((idx, score)) = winner.filter(|&(_, score)| score > 0) else {
        return NicheClassification {
            category: UNKNOWN_CATEGORY.to_string(),
            subcategory: GENERAL_SUBCATEGORY.to_string(),
            confidence: 0.0,
            estimated_cpm: UNKNOWN_CPM,
        };
    };

    let cat = &categories[idx];
    let confidence = (score as f64 / CONFIDENCE_SCALE).min(1.0);

    match first_max(&subcategory_scores[idx]).filter(|&(_, s)| s > 0) {
        Some((sub_idx, _)) => {
            let sub = &cat.subcategories[sub_idx];
            NicheClassification {
                category: cat.name.clone(),
                subcategory: sub.name.clone(),
                confidence,
                estimated_cpm: sub.cpm,
            }
        }
        None => NicheClassification {
            category: cat.name.clone(),
            subcategory: GENERAL_SUBCATEGORY.to_string(),
            confidence,
            estimated_cpm: cat.base_cpm,
        },
    }
}

fn build_corpus(item: &ContentItem) -> String {
    let tags = item
        .tags
        .iter()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    [item.title.to_lowercase(), item.description.to_lowercase(), tags].join(" ")
}

/// Index and value of the highest score; the earliest index wins a tie.
fn first_max(scores: &[u32]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best
}
