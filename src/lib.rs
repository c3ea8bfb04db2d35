//! Niche scoring and trend tracking for trending video content.
//!
//! Content items are classified into a category taxonomy, folded into
//! per-niche daily summaries and persisted to a JSON niche database that
//! tracks CPM history and trend labels per niche.

pub mod api;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ideas;
pub mod niche_refresh;
pub mod scorer;
pub mod state;
pub mod taxonomy;
pub mod types;

pub use classifier::classify;
pub use error::{AppError, Result};
pub use niche_refresh::NicheRefresher;
pub use scorer::{compute_trend, is_stale, rank, summarize, top_niches};
pub use state::{NicheDatabase, NicheStore};
pub use taxonomy::CategoryTaxonomy;
