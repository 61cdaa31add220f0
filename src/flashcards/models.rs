//! Data models for the review scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default SM-2 ease factor for new cards
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Importance of a card or recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Priority {
    /// Sort weight: high=3, medium=2, low=1
    pub fn weight(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// A question/answer card under spaced repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub session_id: String,
    /// Weak reference to a concept in the graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    /// SM-2 ease factor, never below 1.3
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    /// Current interval in days
    #[serde(default)]
    pub interval: u32,
    /// Consecutive successful reviews
    #[serde(default)]
    pub repetitions: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review_date: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_review_date: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Append-only log of every review
    #[serde(default)]
    pub review_history: Vec<ReviewRecord>,
}

fn default_ease_factor() -> f64 {
    DEFAULT_EASE_FACTOR
}

impl ReviewCard {
    /// New card, due immediately
    pub fn new(question: String, answer: String, session_id: String) -> Self {
        Self::new_at(question, answer, session_id, Utc::now())
    }

    pub fn new_at(
        question: String,
        answer: String,
        session_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question,
            answer,
            session_id,
            concept_id: None,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            next_review_date: now,
            last_review_date: None,
            created_date: now,
            priority: Priority::default(),
            tags: Vec::new(),
            review_history: Vec::new(),
        }
    }

    /// Check if the card is due for review
    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }

    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }

    /// Never reviewed
    pub fn is_new(&self) -> bool {
        self.review_history.is_empty()
    }
}

/// A record of a single review attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    /// Quality rating (1-5)
    /// 1 = incorrect, but recognized
    /// 2 = incorrect, but easy to recall
    /// 3 = correct with serious difficulty
    /// 4 = correct after hesitation
    /// 5 = perfect response
    pub quality: u8,
    /// Milliseconds spent answering
    pub time_taken: u64,
}

/// One rating in a batch review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRating {
    pub card_id: String,
    pub quality: u8,
    #[serde(default)]
    pub time_taken: u64,
}

/// Statistics over a set of cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub new_cards: usize,
    /// Reviewed, fewer than three successful repetitions
    pub learning_cards: usize,
    /// Three or more successful repetitions
    pub mature_cards: usize,
    pub due_cards: usize,
    pub reviews_today: usize,
    pub correct_today: usize,
    pub average_ease_factor: f64,
    /// Share of all reviews rated 3 or better
    pub retention_rate: f64,
    /// Consecutive days, ending today or yesterday, with at least one review
    pub streak_days: u32,
}
