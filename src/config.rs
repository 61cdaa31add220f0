//! Engine configuration, loaded from a TOML file

use std::fs;
use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::Priority;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration for the learning engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Fixed UTC offset for a learner; out-of-range values fall back to UTC
pub fn fixed_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Graph consolidation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Name similarity a fuzzy match must exceed
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Upper bound on enumerated root-to-leaf learning paths
    #[serde(default = "default_max_chains")]
    pub max_chains: usize,
}

fn default_fuzzy_threshold() -> f64 {
    0.8
}

fn default_max_chains() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            max_chains: default_max_chains(),
        }
    }
}

/// Review scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Most cards batched into one review recommendation
    #[serde(default = "default_due_batch_size")]
    pub due_batch_size: usize,
    /// Priority given to new cards when none is specified
    #[serde(default)]
    pub default_priority: Priority,
}

fn default_due_batch_size() -> usize {
    10
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            due_batch_size: default_due_batch_size(),
            default_priority: Priority::default(),
        }
    }
}

/// Recommendation ranking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
    #[serde(default = "default_min_confidence_threshold")]
    pub min_confidence_threshold: f64,
    /// 0 disables diversification
    #[serde(default = "default_diversity_factor")]
    pub diversity_factor: f64,
    #[serde(default = "default_enable_rest_breaks")]
    pub enable_rest_breaks: bool,
    /// Learner's offset from UTC, used for time-of-day and day boundaries
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_max_recommendations() -> usize {
    5
}

fn default_min_confidence_threshold() -> f64 {
    0.3
}

fn default_diversity_factor() -> f64 {
    0.3
}

fn default_enable_rest_breaks() -> bool {
    true
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            max_recommendations: default_max_recommendations(),
            min_confidence_threshold: default_min_confidence_threshold(),
            diversity_factor: default_diversity_factor(),
            enable_rest_breaks: default_enable_rest_breaks(),
            utc_offset_minutes: 0,
        }
    }
}
