//! Adaptive learning state: a consolidated concept graph, spaced
//! repetition review cards, and ranked study recommendations.

pub mod config;
pub mod flashcards;
pub mod graph;
pub mod recommendations;
pub mod sessions;
pub mod storage;

pub use config::EngineConfig;
