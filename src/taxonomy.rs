//! Category → CPM configuration used by the classifier.
//!
//! The taxonomy is built once at startup and passed by reference to everything
//! that needs it. Category and subcategory order is preserved from the source
//! definition because the classifier breaks score ties by declaration order.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    /// Snake-case name; underscores read as spaces when matching.
    pub name: String,
    pub cpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    pub base_cpm: f64,
    pub subcategories: Vec<Subcategory>,
    /// Generic words scored only when no category or subcategory name matched.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryDef {
    pub fn subcategory_cpm(&self, name: &str) -> Option<f64> {
        self.subcategories.iter().find(|s| s.name == name).map(|s| s.cpm)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTaxonomy {
    categories: Vec<CategoryDef>,
}

impl CategoryTaxonomy {
    /// Validate and normalize a list of categories.
    ///
    /// Names and keywords are lowercased. Every CPM must be finite and strictly
    /// positive, and names must be unique (subcategories within their category).
    pub fn new(categories: Vec<CategoryDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(categories.len());

        for mut cat in categories {
            cat.name = cat.name.trim().to_lowercase();
            if cat.name.is_empty() {
                return Err(AppError::InvalidTaxonomy("empty category name".to_string()));
            }
            if !seen.insert(cat.name.clone()) {
                return Err(AppError::InvalidTaxonomy(format!("duplicate category {}", cat.name)));
            }
            check_cpm(&cat.name, cat.base_cpm)?;

            let mut sub_seen = HashSet::new();
            for sub in &mut cat.subcategories {
                sub.name = sub.name.trim().to_lowercase();
                let label = format!("{}_{}", cat.name, sub.name);
                if sub.name.is_empty() {
                    return Err(AppError::InvalidTaxonomy(format!(
                        "empty subcategory name in {}",
                        cat.name
                    )));
                }
                if !sub_seen.insert(sub.name.clone()) {
                    return Err(AppError::InvalidTaxonomy(format!("duplicate subcategory {label}")));
                }
                check_cpm(&label, sub.cpm)?;
            }

            cat.keywords = cat
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.trim().is_empty())
                .collect();
            normalized.push(cat);
        }

        Ok(Self { categories: normalized })
    }

    /// Parse a JSON array of category definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let categories: Vec<CategoryDef> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let taxonomy = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            categories = taxonomy.categories.len(),
            "Loaded taxonomy from file"
        );
        Ok(taxonomy)
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> &[CategoryDef] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&CategoryDef> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn base_cpm(&self, category: &str) -> Option<f64> {
        self.category(category).map(|c| c.base_cpm)
    }

    pub fn subcategory_cpm(&self, category: &str, subcategory: &str) -> Option<f64> {
        self.category(category)?.subcategory_cpm(subcategory)
    }
}

impl Default for CategoryTaxonomy {
    /// Built-in high-CPM categories.
    fn default() -> Self {
        Self {
            categories: vec![
                def(
                    "finance",
                    15.0,
                    &[
                        ("investing", 18.0),
                        ("cryptocurrency", 20.0),
                        ("personal_finance", 16.0),
                        ("stock_market", 17.0),
                        ("real_estate", 16.5),
                    ],
                    &["money", "invest", "stock", "crypto", "financial", "budget", "wealth"],
                ),
                def(
                    "technology",
                    12.0,
                    &[
                        ("software_reviews", 13.0),
                        ("gadget_reviews", 14.0),
                        ("programming", 12.5),
                        ("ai_machine_learning", 15.0),
                        ("saas", 16.0),
                    ],
                    &["tech", "software", "hardware", "gadget", "computer", "phone", "digital"],
                ),
                def(
                    "health",
                    11.0,
                    &[
                        ("fitness", 12.0),
                        ("nutrition", 13.0),
                        ("mental_health", 11.5),
                        ("medical_information", 14.0),
                        ("supplements", 13.5),
                    ],
                    &["health", "fitness", "workout", "diet", "nutrition", "exercise", "wellness"],
                ),
                def(
                    "business",
                    14.0,
                    &[
                        ("entrepreneurship", 15.0),
                        ("marketing", 16.0),
                        ("ecommerce", 14.5),
                        ("b2b", 17.0),
                        ("productivity", 13.0),
                    ],
                    &["business", "entrepreneur", "startup", "marketing", "company", "industry"],
                ),
                def(
                    "education",
                    10.0,
                    &[
                        ("online_courses", 12.0),
                        ("language_learning", 11.0),
                        ("academic_subjects", 10.5),
                        ("professional_certifications", 13.0),
                        ("career_development", 12.5),
                    ],
                    &["learn", "course", "education", "tutorial", "guide", "how to", "lesson"],
                ),
            ],
        }
    }
}

fn def(name: &str, base_cpm: f64, subs: &[(&str, f64)], keywords: &[&str]) -> CategoryDef {
    CategoryDef {
        name: name.to_string(),
        base_cpm,
        subcategories: subs
            .iter()
            .map(|&(name, cpm)| Subcategory { name: name.to_string(), cpm })
            .collect(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn check_cpm(label: &str, cpm: f64) -> Result<()> {
    if cpm.is_finite() && cpm > 0.0 {
        Ok(())
    } else {
        Err(AppError::InvalidTaxonomy(format!("{label} has non-positive CPM {cpm}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_taxonomy_passes_validation() {
        let builtin = CategoryTaxonomy::default();
        let revalidated = CategoryTaxonomy::new(builtin.categories().to_vec()).unwrap();
        assert_eq!(builtin, revalidated);
        assert_eq!(builtin.base_cpm("finance"), Some(15.0));
        assert_eq!(builtin.subcategory_cpm("technology", "saas"), Some(16.0));
        assert_eq!(builtin.subcategory_cpm("technology", "investing"), None);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let names: Vec<_> = CategoryTaxonomy::default()
            .categories()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["finance", "technology", "health", "business", "education"]);
    }

    #[test]
    fn rejects_non_positive_cpm() {
        let json = r#"[{"name": "finance", "base_cpm": 15.0,
            "subcategories": [{"name": "investing", "cpm": 0.0}]}]"#;
        assert!(matches!(
            CategoryTaxonomy::from_json(json),
            Err(AppError::InvalidTaxonomy(_))
        ));

        let json = r#"[{"name": "finance", "base_cpm": -2, "subcategories": []}]"#;
        assert!(CategoryTaxonomy::from_json(json).is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"[
            {"name": "finance", "base_cpm": 15.0, "subcategories": []},
            {"name": "Finance", "base_cpm": 12.0, "subcategories": []}
        ]"#;
        assert!(CategoryTaxonomy::from_json(json).is_err());
    }

    #[test]
    fn json_names_are_lowercased_and_keywords_default_empty() {
        let json = r#"[{"name": " Gaming ", "base_cpm": 4.5,
            "subcategories": [{"name": "Speed_Runs", "cpm": 5.0}]}]"#;
        let taxonomy = CategoryTaxonomy::from_json(json).unwrap();
        let gaming = taxonomy.category("gaming").unwrap();
        assert!(gaming.keywords.is_empty());
        assert_eq!(gaming.subcategory_cpm("speed_runs"), Some(5.0));
    }
}
