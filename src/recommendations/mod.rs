//! Ranked study recommendations built from the concept graph, review
//! cards and session history

pub mod engine;
pub mod generators;
pub mod models;
pub mod preferences;
pub mod ranking;

pub use engine::{generate, RecommendationEngine};
pub use models::*;
pub use preferences::infer_preferences;
