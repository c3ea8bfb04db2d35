pub mod niche_ranker;
pub mod top_niches;
pub mod trend_calculator;

pub use niche_ranker::{rank, summarize};
pub use top_niches::{is_stale, top_niches};
pub use trend_calculator::compute_trend;
