use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::{ConceptNode, MasteryLevel};

/// A tutoring session with its messages and the concepts it touched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    /// Snapshot of the session's concept graph nodes
    #[serde(default)]
    pub concepts: Vec<ConceptNode>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last modification, used for streaks and recency
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl LearningSession {
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            messages: Vec::new(),
            concepts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Topic key: lowercased first word of the title
    pub fn topic_key(&self) -> Option<String> {
        self.title
            .split_whitespace()
            .next()
            .map(|word| word.to_lowercase())
    }

    /// Minutes between the first and last message
    pub fn message_span_minutes(&self) -> f64 {
        let first = self.messages.iter().map(|m| m.timestamp).min();
        let last = self.messages.iter().map(|m| m.timestamp).max();
        match (first, last) {
            (Some(first), Some(last)) => (last - first).num_seconds() as f64 / 60.0,
            _ => 0.0,
        }
    }

    /// Share of the session's concepts at Expert level, if it has any
    pub fn expert_ratio(&self) -> Option<f64> {
        if self.concepts.is_empty() {
            return None;
        }
        let experts = self
            .concepts
            .iter()
            .filter(|c| c.mastery == MasteryLevel::Expert)
            .count();
        Some(experts as f64 / self.concepts.len() as f64)
    }

    /// Timestamp of the most recent activity
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.messages
            .iter()
            .map(|m| m.timestamp)
            .max()
            .map_or(self.updated_at, |t| t.max(self.updated_at))
    }
}

/// A lightweight summary for listing sessions without loading all messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub concept_count: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<&LearningSession> for SessionSummary {
    fn from(session: &LearningSession) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            message_count: session.messages.len(),
            concept_count: session.concepts.len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// A single message in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl SessionMessage {
    pub fn new(
        role: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp,
        }
    }
}
