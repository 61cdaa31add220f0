//! Concept graph consolidation for Scholar
//!
//! This module provides:
//! - Concept/link models and the tutor response shape
//! - Multi-strategy concept dedup (id, normalized name, fuzzy name)
//! - Link filtering and tree validation
//! - Structural analysis used by the recommendation engine

pub mod analysis;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod validate;

pub use analysis::GraphAnalysis;
pub use merge::{
    merge_concepts, merge_links, remap_links, ConceptMerge, Consolidation, Consolidator,
};
pub use models::*;
pub use validate::validate_tree;
