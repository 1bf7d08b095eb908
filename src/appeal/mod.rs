pub mod resolver;

pub use resolver::{resolve, Resolution, Verdict};
