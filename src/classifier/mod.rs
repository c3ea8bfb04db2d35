pub mod niche_classifier;

pub use niche_classifier::classify;
