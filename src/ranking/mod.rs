pub mod engine;

pub use engine::{age_on, position_of, rank, RankedEntry, RankingView, SENIOR_AGE};
