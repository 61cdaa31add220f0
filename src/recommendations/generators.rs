//! The five recommendation generators.
//!
//! Each generator is independent and yields an empty list when its
//! preconditions are not met.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::models::{
    FatigueLevel, LearningPreferences, Priority, Recommendation, RecommendationType, TimeOfDay,
};
use crate::flashcards::{get_due_cards_at, memory_strength, ReviewCard};
use crate::graph::{ConceptLink, ConceptNode, GraphAnalysis, MasteryLevel};

const MAX_NEXT_TO_LEARN: usize = 3;
const MAX_DEEPEN: usize = 2;
const MAX_WEAK_POINTS: usize = 3;
const MAX_RELATED_SOURCES: usize = 2;
const MAX_RELATED_PER_SOURCE: usize = 2;
/// Cards below this strength make a review batch urgent
const WEAK_MEMORY_STRENGTH: f64 = 40.0;

/// Everything the generators read for one request
pub struct GenerationContext<'a> {
    pub concepts: &'a [ConceptNode],
    pub links: &'a [ConceptLink],
    pub cards: &'a [ReviewCard],
    pub analysis: &'a GraphAnalysis,
    pub preferences: &'a LearningPreferences,
    pub due_batch_size: usize,
    pub enable_rest_breaks: bool,
    /// Local part of the day the request was made in
    pub time_of_day: TimeOfDay,
    pub now: DateTime<Utc>,
}

impl<'a> GenerationContext<'a> {
    fn concept(&self, id: &str) -> Option<&'a ConceptNode> {
        self.concepts.iter().find(|c| c.id == id)
    }

    fn name_of(&self, id: &str) -> String {
        self.concept(id).map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    fn prerequisites(&self, id: &str) -> Vec<String> {
        self.links
            .iter()
            .filter(|l| l.target == id && self.concept(&l.source).is_some())
            .map(|l| l.source.clone())
            .collect()
    }

    fn session_minutes(&self) -> u32 {
        let average = self.preferences.average_session_length;
        if average > 0.0 {
            (average.round() as u32).clamp(10, 30)
        } else {
            15
        }
    }
}

/// Run every generator in a fixed order
pub fn generate_all(ctx: &GenerationContext) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    recommendations.extend(next_to_learn(ctx));
    recommendations.extend(weak_points(ctx));
    recommendations.extend(related_topics(ctx));
    recommendations.extend(due_for_review(ctx));
    recommendations.extend(rest_break(ctx));
    recommendations
}

/// Estimated difficulty in [0, 1] from mastery and graph depth
pub fn estimate_difficulty(mastery: MasteryLevel, depth: usize) -> f64 {
    let mastery_adjustment = match mastery {
        MasteryLevel::Unknown => 0.3,
        MasteryLevel::Novice => 0.1,
        MasteryLevel::Competent => -0.1,
        MasteryLevel::Expert => -0.3,
    };
    let depth_adjustment = (depth as f64 * 0.1).min(0.3);
    (0.5 + mastery_adjustment + depth_adjustment).clamp(0.0, 1.0)
}

fn matches_topic(name: &str, topics: &[String]) -> bool {
    let name = name.to_lowercase();
    topics.iter().any(|topic| name.contains(topic.as_str()))
}

/// Shallow unmastered concepts first, otherwise Competent ones to deepen
pub fn next_to_learn(ctx: &GenerationContext) -> Vec<Recommendation> {
    let mut foundational: Vec<&ConceptNode> = ctx
        .concepts
        .iter()
        .filter(|c| c.mastery.is_unmastered() && ctx.analysis.depth_of(&c.id) <= 1)
        .collect();
    foundational.sort_by_key(|c| (ctx.analysis.depth_of(&c.id), c.mastery));

    if !foundational.is_empty() {
        return foundational
            .into_iter()
            .take(MAX_NEXT_TO_LEARN)
            .map(|concept| learn_recommendation(ctx, concept))
            .collect();
    }

    let mut competent: Vec<&ConceptNode> = ctx
        .concepts
        .iter()
        .filter(|c| c.mastery == MasteryLevel::Competent)
        .collect();
    competent.sort_by_key(|c| ctx.analysis.depth_of(&c.id));

    competent
        .into_iter()
        .take(MAX_DEEPEN)
        .map(|concept| deepen_recommendation(ctx, concept))
        .collect()
}

fn difficulty_priority(difficulty: f64) -> Priority {
    if difficulty > 0.6 {
        Priority::Medium
    } else {
        Priority::High
    }
}

fn learn_recommendation(ctx: &GenerationContext, concept: &ConceptNode) -> Recommendation {
    let difficulty = estimate_difficulty(concept.mastery, ctx.analysis.depth_of(&concept.id));

    let reason = match ctx.analysis.chain_containing(&concept.id) {
        Some(chain) if chain.len() > 1 => {
            let path: Vec<String> = chain.iter().map(|id| ctx.name_of(id)).collect();
            format!("Early step on the learning path {}", path.join(" → "))
        }
        _ => "Foundational concept that later topics can build on".to_string(),
    };
    let description = concept
        .description
        .clone()
        .unwrap_or_else(|| format!("Build a foundation in {}", concept.name));

    let mut rec = Recommendation::new(
        RecommendationType::NextToLearn,
        &concept.id,
        format!("Learn {}", concept.name),
        description,
        reason,
        difficulty_priority(difficulty),
        0.9 - 0.3 * difficulty,
    )
    .with_time(ctx.session_minutes())
    .with_concepts(vec![concept.id.clone()]);
    rec.prerequisite_concepts = ctx.prerequisites(&concept.id);
    rec.suggested_questions = vec![format!("What is {} and why does it matter?", concept.name)];
    rec
}

fn deepen_recommendation(ctx: &GenerationContext, concept: &ConceptNode) -> Recommendation {
    let difficulty = estimate_difficulty(concept.mastery, ctx.analysis.depth_of(&concept.id));
    let mut confidence = 0.7 - 0.2 * difficulty;
    if matches_topic(&concept.name, &ctx.preferences.strong_topics) {
        confidence += 0.1;
    }

    let mut rec = Recommendation::new(
        RecommendationType::NextToLearn,
        &concept.id,
        format!("Deepen {}", concept.name),
        format!("Move from competent to expert in {}", concept.name),
        "All foundational concepts are covered".to_string(),
        difficulty_priority(difficulty),
        confidence,
    )
    .with_time(20)
    .with_concepts(vec![concept.id.clone()]);
    rec.suggested_questions = vec![format!("What are the edge cases of {}?", concept.name)];
    rec
}

/// Unmastered concepts, Novice before Unknown, with their review cards
pub fn weak_points(ctx: &GenerationContext) -> Vec<Recommendation> {
    let mut weak: Vec<&ConceptNode> = ctx
        .concepts
        .iter()
        .filter(|c| c.mastery.is_unmastered())
        .collect();
    weak.sort_by(|a, b| b.mastery.cmp(&a.mastery));

    weak.into_iter()
        .take(MAX_WEAK_POINTS)
        .map(|concept| {
            let mut confidence = 0.75;
            if matches_topic(&concept.name, &ctx.preferences.weak_topics) {
                confidence += 0.1;
            }

            let mut related = related_cards(ctx, concept);
            related.sort_by_key(|card| !card.is_due_at(ctx.now));
            let reason = format!("Current mastery is {}", concept.mastery);

            if related.is_empty() {
                return Recommendation::new(
                    RecommendationType::WeakPoints,
                    &concept.id,
                    format!("Review {}", concept.name),
                    format!("Revisit the fundamentals of {}", concept.name),
                    reason,
                    Priority::High,
                    confidence,
                )
                .with_time(20)
                .with_concepts(vec![concept.id.clone()]);
            }

            let mut rec = Recommendation::new(
                RecommendationType::WeakPoints,
                &concept.id,
                format!("Practice {}", concept.name),
                format!("Work through {} review card(s) on {}", related.len(), concept.name),
                reason,
                Priority::High,
                confidence,
            )
            .with_time(10 * related.len() as u32)
            .with_concepts(vec![concept.id.clone()]);
            rec.related_cards = related.iter().map(|c| c.id.clone()).collect();
            rec.suggested_questions = related.iter().take(3).map(|c| c.question.clone()).collect();
            rec
        })
        .collect()
}

/// Cards linked to a concept by id or mentioning its name
fn related_cards<'a>(ctx: &GenerationContext<'a>, concept: &ConceptNode) -> Vec<&'a ReviewCard> {
    let name = concept.name.trim().to_lowercase();
    ctx.cards
        .iter()
        .filter(|card| {
            card.concept_id.as_deref() == Some(concept.id.as_str())
                || (!name.is_empty() && card.question.to_lowercase().contains(&name))
        })
        .collect()
}

/// Unmastered neighbors of mastered concepts
pub fn related_topics(ctx: &GenerationContext) -> Vec<Recommendation> {
    let mut proposed: HashSet<&str> = HashSet::new();
    let mut recommendations = Vec::new();
    let mut sources = 0;

    for known in ctx.concepts.iter().filter(|c| c.mastery.is_mastered()) {
        if sources == MAX_RELATED_SOURCES {
            break;
        }

        let mut added = 0;
        for link in ctx.links {
            if added == MAX_RELATED_PER_SOURCE {
                break;
            }
            let other = if link.source == known.id {
                &link.target
            } else if link.target == known.id {
                &link.source
            } else {
                continue;
            };
            let Some(neighbor) = ctx.concept(other) else {
                continue;
            };
            if !neighbor.mastery.is_unmastered() || !proposed.insert(neighbor.id.as_str()) {
                continue;
            }

            let reason = if link.relationship.trim().is_empty() {
                format!("Connected to {}", known.name)
            } else {
                format!("Connected to {} ({})", known.name, link.relationship)
            };
            let mut confidence = 0.6;
            if matches_topic(&known.name, &ctx.preferences.strong_topics) {
                confidence += 0.1;
            }

            let mut rec = Recommendation::new(
                RecommendationType::RelatedTopics,
                &format!("{}-{}", known.id, neighbor.id),
                format!("Explore {}", neighbor.name),
                format!("Extends what you already know about {}", known.name),
                reason,
                Priority::Low,
                confidence,
            )
            .with_time(15)
            .with_concepts(vec![neighbor.id.clone(), known.id.clone()]);
            rec.prerequisite_concepts = vec![known.id.clone()];
            recommendations.push(rec);
            added += 1;
        }

        if added > 0 {
            sources += 1;
        }
    }

    recommendations
}

/// One batched recommendation over the cards currently due
pub fn due_for_review(ctx: &GenerationContext) -> Vec<Recommendation> {
    let mut due = get_due_cards_at(ctx.cards, ctx.now);
    if due.is_empty() || ctx.due_batch_size == 0 {
        return Vec::new();
    }

    due.sort_by(|a, b| {
        b.priority
            .weight()
            .cmp(&a.priority.weight())
            .then_with(|| memory_strength(a).total_cmp(&memory_strength(b)))
    });
    due.truncate(ctx.due_batch_size);

    let priority = if due.iter().any(|c| memory_strength(c) < WEAK_MEMORY_STRENGTH) {
        Priority::High
    } else {
        Priority::Medium
    };
    let mut confidence = 0.9;
    if ctx.preferences.preferred_time == Some(ctx.time_of_day) {
        confidence += 0.05;
    }
    let reason = match ctx.preferences.streak {
        0 => "Reviewing on schedule keeps these cards from being forgotten".to_string(),
        days => format!("Keep your {}-day streak going", days),
    };

    let mut concepts: Vec<String> = Vec::new();
    for concept_id in due.iter().filter_map(|c| c.concept_id.as_ref()) {
        if !concepts.contains(concept_id) {
            concepts.push(concept_id.clone());
        }
    }

    let mut rec = Recommendation::new(
        RecommendationType::DueForReview,
        "batch",
        format!("Review {} due card(s)", due.len()),
        "Spaced repetition cards scheduled for today".to_string(),
        reason,
        priority,
        confidence,
    )
    .with_time((2 * due.len() as u32).max(5))
    .with_concepts(concepts);
    rec.related_cards = due.iter().map(|c| c.id.clone()).collect();
    rec.suggested_questions = due.iter().take(3).map(|c| c.question.clone()).collect();

    vec![rec]
}

/// A pause suggestion when the learner seems tired
pub fn rest_break(ctx: &GenerationContext) -> Vec<Recommendation> {
    if !ctx.enable_rest_breaks {
        return Vec::new();
    }

    let (priority, minutes, confidence, reason) = match ctx.preferences.fatigue {
        FatigueLevel::High => (Priority::High, 15, 0.9, "Long or very active session"),
        FatigueLevel::Medium => (Priority::Low, 5, 0.7, "Steady activity for a while"),
        FatigueLevel::Low => return Vec::new(),
    };

    vec![Recommendation::new(
        RecommendationType::RestBreak,
        "now",
        format!("Take a {}-minute break", minutes),
        "Step away from the screen for a few minutes".to_string(),
        reason.to_string(),
        priority,
        confidence,
    )
    .with_time(minutes)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap()
    }

    fn node(id: &str, name: &str, mastery: MasteryLevel) -> ConceptNode {
        ConceptNode::new(id, name, mastery)
    }

    fn card(id: &str, question: &str, concept_id: Option<&str>, due_in_days: i64) -> ReviewCard {
        let mut card = ReviewCard::new_at(
            question.into(),
            "answer".into(),
            "s1".into(),
            now() - Duration::days(10),
        );
        card.id = id.to_string();
        card.concept_id = concept_id.map(str::to_string);
        card.next_review_date = now() + Duration::days(due_in_days);
        card
    }

    struct Fixture {
        concepts: Vec<ConceptNode>,
        links: Vec<ConceptLink>,
        cards: Vec<ReviewCard>,
        analysis: GraphAnalysis,
        preferences: LearningPreferences,
    }

    impl Fixture {
        fn new(
            concepts: Vec<ConceptNode>,
            links: Vec<ConceptLink>,
            cards: Vec<ReviewCard>,
        ) -> Self {
            let analysis = GraphAnalysis::analyze(&concepts, &links, 64);
            Self {
                concepts,
                links,
                cards,
                analysis,
                preferences: LearningPreferences::default(),
            }
        }

        fn ctx(&self) -> GenerationContext<'_> {
            GenerationContext {
                concepts: &self.concepts,
                links: &self.links,
                cards: &self.cards,
                analysis: &self.analysis,
                preferences: &self.preferences,
                due_batch_size: 10,
                enable_rest_breaks: true,
                time_of_day: TimeOfDay::Evening,
                now: now(),
            }
        }
    }

    #[test]
    fn test_estimate_difficulty() {
        assert_eq!(estimate_difficulty(MasteryLevel::Novice, 0), 0.6);
        assert!((estimate_difficulty(MasteryLevel::Unknown, 5) - 1.0).abs() < 1e-9);
        assert!((estimate_difficulty(MasteryLevel::Expert, 0) - 0.2).abs() < 1e-9);
        assert!((estimate_difficulty(MasteryLevel::Competent, 2) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_next_to_learn_prefers_shallow_unmastered() {
        let fixture = Fixture::new(
            vec![
                node("vars", "Variables", MasteryLevel::Novice),
                node("loops", "Loops", MasteryLevel::Unknown),
                node("closures", "Closures", MasteryLevel::Unknown),
                node("types", "Types", MasteryLevel::Expert),
            ],
            vec![
                ConceptLink::new("vars", "loops", "prerequisite"),
                ConceptLink::new("loops", "closures", "prerequisite"),
            ],
            vec![],
        );

        let recs = next_to_learn(&fixture.ctx());
        let ids: Vec<&str> = recs.iter().map(|r| r.concepts[0].as_str()).collect();
        assert_eq!(ids, vec!["vars", "loops"]);

        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].reason.contains("Variables → Loops → Closures"));
        assert_eq!(recs[1].priority, Priority::Medium);
        assert_eq!(recs[1].prerequisite_concepts, vec!["vars"]);
        assert!(recs.iter().all(|r| r.kind == RecommendationType::NextToLearn));
    }

    #[test]
    fn test_next_to_learn_falls_back_to_deepen() {
        let fixture = Fixture::new(
            vec![
                node("a", "Ownership", MasteryLevel::Competent),
                node("b", "Borrowing", MasteryLevel::Competent),
                node("c", "Lifetimes", MasteryLevel::Competent),
                node("d", "Traits", MasteryLevel::Expert),
            ],
            vec![],
            vec![],
        );

        let recs = next_to_learn(&fixture.ctx());
        assert_eq!(recs.len(), 2);
        assert!(recs[0].title.starts_with("Deepen"));
        assert_eq!(recs[0].estimated_time, Some(20));
    }

    #[test]
    fn test_weak_points_pairs_cards() {
        let fixture = Fixture::new(
            vec![
                node("u", "Monads", MasteryLevel::Unknown),
                node("n", "Functors", MasteryLevel::Novice),
            ],
            vec![],
            vec![
                card("k1", "Explain functors in Haskell", None, -1),
                card("k2", "Functor laws", Some("n"), 3),
            ],
        );

        let recs = weak_points(&fixture.ctx());
        assert_eq!(recs.len(), 2);

        // Novice before Unknown
        assert_eq!(recs[0].concepts, vec!["n"]);
        assert_eq!(recs[0].related_cards, vec!["k1", "k2"]);
        assert_eq!(recs[0].estimated_time, Some(20));
        assert!(recs[0].title.starts_with("Practice"));

        assert!(recs[1].title.starts_with("Review"));
        assert_eq!(recs[1].estimated_time, Some(20));
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn test_related_topics_limits_and_labels() {
        let fixture = Fixture::new(
            vec![
                node("m", "Algebra", MasteryLevel::Expert),
                node("x", "Matrices", MasteryLevel::Unknown),
                node("y", "Vectors", MasteryLevel::Novice),
                node("z", "Groups", MasteryLevel::Unknown),
                node("k", "Arithmetic", MasteryLevel::Competent),
            ],
            vec![
                ConceptLink::new("m", "x", "generalizes to"),
                ConceptLink::new("y", "m", "uses"),
                ConceptLink::new("m", "z", "leads to"),
                ConceptLink::new("k", "m", "prerequisite"),
                ConceptLink::new("k", "x", "supports"),
            ],
            vec![],
        );

        let recs = related_topics(&fixture.ctx());
        let ids: Vec<&str> = recs.iter().map(|r| r.concepts[0].as_str()).collect();
        // Two neighbors for Algebra; Matrices is not proposed twice
        assert_eq!(ids, vec!["x", "y"]);
        assert!(recs[0].reason.contains("generalizes to"));
        assert!(recs.iter().all(|r| r.priority == Priority::Low));
    }

    #[test]
    fn test_due_for_review_batches() {
        let mut urgent = card("a", "Q1", Some("c1"), -2);
        urgent.priority = Priority::High;
        urgent.ease_factor = 1.5;
        let mut strong = card("b", "Q2", Some("c1"), -1);
        strong.repetitions = 3;
        strong.ease_factor = 2.5;
        let later = card("c", "Q3", None, 4);

        let mut fixture = Fixture::new(vec![], vec![], vec![strong, urgent, later]);
        fixture.preferences.streak = 4;

        let recs = due_for_review(&fixture.ctx());
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.related_cards, vec!["a", "b"]);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.estimated_time, Some(5));
        assert_eq!(rec.concepts, vec!["c1"]);
        assert!(rec.reason.contains("4-day"));
    }

    #[test]
    fn test_due_for_review_medium_when_cards_are_strong() {
        let mut strong = card("b", "Q2", None, -1);
        strong.repetitions = 3;
        strong.ease_factor = 2.5;
        let fixture = Fixture::new(vec![], vec![], vec![strong]);

        let recs = due_for_review(&fixture.ctx());
        assert_eq!(recs[0].priority, Priority::Medium);

        let none_due = Fixture::new(vec![], vec![], vec![card("x", "Q", None, 2)]);
        assert!(due_for_review(&none_due.ctx()).is_empty());
    }

    #[test]
    fn test_rest_break_by_fatigue() {
        let mut fixture = Fixture::new(vec![], vec![], vec![]);
        assert!(rest_break(&fixture.ctx()).is_empty());

        fixture.preferences.fatigue = FatigueLevel::Medium;
        let recs = rest_break(&fixture.ctx());
        assert_eq!(recs[0].priority, Priority::Low);
        assert_eq!(recs[0].estimated_time, Some(5));

        fixture.preferences.fatigue = FatigueLevel::High;
        let recs = rest_break(&fixture.ctx());
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].estimated_time, Some(15));

        let mut ctx = fixture.ctx();
        ctx.enable_rest_breaks = false;
        assert!(rest_break(&ctx).is_empty());
    }

    #[test]
    fn test_generators_on_empty_input() {
        let fixture = Fixture::new(vec![], vec![], vec![]);
        assert!(generate_all(&fixture.ctx()).is_empty());
    }
}
