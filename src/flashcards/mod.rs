//! Review cards and spaced repetition for Scholar
//!
//! This module provides:
//! - Review card models (SM-2 state plus append-only review history)
//! - SM-2 spaced repetition algorithm
//! - Review queue ordering, batch review and statistics
//! - JSON card storage

pub mod algorithm;
pub mod models;
pub mod queue;
pub mod storage;

pub use algorithm::{memory_strength, process_review, process_review_at};
pub use models::*;
pub use queue::*;
pub use storage::{FlashcardStorage, FlashcardStorageError};
