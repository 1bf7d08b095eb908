pub mod config;
pub mod engine;
pub mod validation;

pub use config::ExamConfig;
pub use engine::{recalculate_all, score, ScoreResult};
pub use validation::validate_exam;
