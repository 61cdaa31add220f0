use chrono::{DateTime, Timelike, Utc};

use super::generators::{generate_all, GenerationContext};
use super::models::{Recommendation, TimeOfDay};
use super::preferences::infer_preferences;
use super::ranking::rank;
use crate::config::{fixed_offset, EngineConfig, RecommendationConfig};
use crate::flashcards::ReviewCard;
use crate::graph::{ConceptLink, ConceptNode, GraphAnalysis};
use crate::sessions::LearningSession;

/// Builds ranked "what next" suggestions from the graph, cards and
/// session history. Holds no state between calls.
pub struct RecommendationEngine {
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn generate(
        &self,
        concepts: &[ConceptNode],
        links: &[ConceptLink],
        cards: &[ReviewCard],
        session_id: Option<&str>,
        sessions: &[LearningSession],
    ) -> Vec<Recommendation> {
        self.generate_at(concepts, links, cards, session_id, sessions, Utc::now())
    }

    /// Same as [`generate`](Self::generate) with an explicit clock
    pub fn generate_at(
        &self,
        concepts: &[ConceptNode],
        links: &[ConceptLink],
        cards: &[ReviewCard],
        session_id: Option<&str>,
        sessions: &[LearningSession],
        now: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let settings = &self.config.recommendations;

        let analysis = GraphAnalysis::analyze(concepts, links, self.config.graph.max_chains);
        let preferences = infer_preferences(sessions, session_id, now, settings.utc_offset_minutes);
        let local_hour = now.with_timezone(&fixed_offset(settings.utc_offset_minutes)).hour();

        let ctx = GenerationContext {
            concepts,
            links,
            cards,
            analysis: &analysis,
            preferences: &preferences,
            due_batch_size: self.config.review.due_batch_size,
            enable_rest_breaks: settings.enable_rest_breaks,
            time_of_day: TimeOfDay::from_hour(local_hour),
            now,
        };

        let candidates = generate_all(&ctx);
        let candidate_count = candidates.len();
        let ranked = rank(candidates, settings);

        log::debug!(
            "Ranked {} candidate(s) down to {} (roots: {}, streak: {}, fatigue: {:?})",
            candidate_count,
            ranked.len(),
            analysis.roots.len(),
            preferences.streak,
            preferences.fatigue
        );

        ranked
    }
}

/// Generate recommendations with default graph and review settings
pub fn generate(
    concepts: &[ConceptNode],
    links: &[ConceptLink],
    cards: &[ReviewCard],
    session_id: Option<&str>,
    sessions: &[LearningSession],
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    let engine = RecommendationEngine::new(EngineConfig {
        recommendations: config.clone(),
        ..Default::default()
    });
    engine.generate(concepts, links, cards, session_id, sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MasteryLevel;
    use crate::recommendations::{Priority, RecommendationType};
    use crate::sessions::SessionMessage;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 14, 0, 0).unwrap()
    }

    fn graph() -> (Vec<ConceptNode>, Vec<ConceptLink>) {
        (
            vec![
                ConceptNode::new("html", "HTML", MasteryLevel::Expert),
                ConceptNode::new("css", "CSS", MasteryLevel::Novice),
                ConceptNode::new("js", "JavaScript", MasteryLevel::Unknown),
                ConceptNode::new("dom", "DOM", MasteryLevel::Unknown),
                ConceptNode::new("react", "React", MasteryLevel::Unknown),
            ],
            vec![
                ConceptLink::new("html", "css", "styled by"),
                ConceptLink::new("html", "js", "scripted by"),
                ConceptLink::new("js", "dom", "manipulates"),
                ConceptLink::new("dom", "react", "abstracted by"),
            ],
        )
    }

    fn due_card(id: &str) -> ReviewCard {
        let mut card = ReviewCard::new_at(
            format!("Question {}", id),
            "answer".into(),
            "s1".into(),
            now() - Duration::days(3),
        );
        card.id = id.to_string();
        card
    }

    #[test]
    fn test_empty_input_gives_no_recommendations() {
        let engine = RecommendationEngine::new(EngineConfig::default());
        assert!(engine.generate_at(&[], &[], &[], None, &[], now()).is_empty());
    }

    #[test]
    fn test_output_is_bounded_and_ranked() {
        let (concepts, links) = graph();
        let cards: Vec<ReviewCard> = (0..15).map(|i| due_card(&i.to_string())).collect();
        let engine = RecommendationEngine::new(EngineConfig::default());

        let recs = engine.generate_at(&concepts, &links, &cards, None, &[], now());
        assert_eq!(recs.len(), 5);
        assert!(recs
            .windows(2)
            .all(|w| w[0].priority.weight() >= w[1].priority.weight()));
        assert!(recs.iter().all(|r| r.confidence_score >= 0.3));

        let review = recs
            .iter()
            .find(|r| r.kind == RecommendationType::DueForReview)
            .unwrap();
        assert_eq!(review.related_cards.len(), 10);
        // Unreviewed cards sit exactly at strength 40
        assert_eq!(review.priority, Priority::Medium);
    }

    #[test]
    fn test_rest_break_for_active_session() {
        let mut session = LearningSession::new("Web basics".to_string());
        session.id = "live".to_string();
        session.messages = (0..24)
            .map(|i| SessionMessage::new("user", "q", now() - Duration::minutes(90 - i)))
            .collect();
        session.updated_at = now() - Duration::minutes(3);

        let engine = RecommendationEngine::new(EngineConfig::default());
        let recs = engine.generate_at(&[], &[], &[], Some("live"), &[session.clone()], now());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationType::RestBreak);
        assert_eq!(recs[0].priority, Priority::High);

        let mut config = EngineConfig::default();
        config.recommendations.enable_rest_breaks = false;
        let engine = RecommendationEngine::new(config);
        assert!(engine
            .generate_at(&[], &[], &[], Some("live"), &[session], now())
            .is_empty());
    }

    #[test]
    fn test_identical_inputs_give_identical_output() {
        let (concepts, links) = graph();
        let cards = vec![due_card("a"), due_card("b")];
        let engine = RecommendationEngine::new(EngineConfig::default());

        let first = engine.generate_at(&concepts, &links, &cards, None, &[], now());
        let second = engine.generate_at(&concepts, &links, &cards, None, &[], now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_free_function_respects_max() {
        let (concepts, links) = graph();
        let config = RecommendationConfig {
            max_recommendations: 2,
            ..Default::default()
        };

        let recs = generate(&concepts, &links, &[], None, &[], &config);
        assert!(recs.len() <= 2);
        assert!(!recs.is_empty());
    }
}
