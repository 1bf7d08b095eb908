pub mod appeal;
pub mod config;
pub mod output;
pub mod ranking;
pub mod scoring;
pub mod state;
