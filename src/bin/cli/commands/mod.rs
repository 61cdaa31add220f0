pub mod cards;
pub mod graph;
pub mod recommend;
pub mod sessions;
