//! Data models for study recommendations

use serde::{Deserialize, Serialize};

pub use crate::flashcards::Priority;

/// Kind of suggested next action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    NextToLearn,
    WeakPoints,
    RelatedTopics,
    DueForReview,
    RestBreak,
}

impl RecommendationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NextToLearn => "next_to_learn",
            Self::WeakPoints => "weak_points",
            Self::RelatedTopics => "related_topics",
            Self::DueForReview => "due_for_review",
            Self::RestBreak => "rest_break",
        }
    }
}

/// A suggested next action. Rebuilt on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    pub description: String,
    pub reason: String,
    pub priority: Priority,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub concepts: Vec<String>,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_cards: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisite_concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_questions: Vec<String>,
}

impl Recommendation {
    pub fn new(
        kind: RecommendationType,
        key: &str,
        title: String,
        description: String,
        reason: String,
        priority: Priority,
        confidence_score: f64,
    ) -> Self {
        Self {
            id: format!("{}-{}", kind.as_str(), key),
            kind,
            title,
            description,
            reason,
            priority,
            estimated_time: None,
            concepts: Vec::new(),
            confidence_score: confidence_score.clamp(0.0, 1.0),
            related_cards: Vec::new(),
            prerequisite_concepts: Vec::new(),
            suggested_questions: Vec::new(),
        }
    }

    pub fn with_time(mut self, minutes: u32) -> Self {
        self.estimated_time = Some(minutes);
        self
    }

    pub fn with_concepts(mut self, concepts: Vec<String>) -> Self {
        self.concepts = concepts;
        self
    }
}

/// Part of the day, in histogram order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    /// Bucket for a local hour: 5-11 morning, 12-16 afternoon,
    /// 17-20 evening, otherwise night
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// How worn out the learner probably is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Signals derived from session history for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPreferences {
    pub preferred_time: Option<TimeOfDay>,
    /// Minutes
    pub average_session_length: f64,
    pub strong_topics: Vec<String>,
    pub weak_topics: Vec<String>,
    /// Consecutive days with a session
    pub streak: u32,
    pub fatigue: FatigueLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(3), TimeOfDay::Night);
    }

    #[test]
    fn test_recommendation_serializes_type_field() {
        let rec = Recommendation::new(
            RecommendationType::RestBreak,
            "now",
            "Take a break".into(),
            "Step away".into(),
            "Long session".into(),
            Priority::High,
            1.4,
        );

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "rest_break");
        assert_eq!(json["id"], "rest_break-now");
        assert_eq!(json["confidenceScore"], 1.0);
        assert!(json.get("relatedCards").is_none());
    }
}
