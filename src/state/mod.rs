pub mod niche_db;

pub use niche_db::{NicheDatabase, NicheStore};
