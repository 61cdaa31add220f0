//! Review queue operations over a caller-held card list

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::algorithm::{memory_strength, process_review_at};
use super::models::{CardRating, Priority, ReviewCard, ReviewStats};
use crate::config::fixed_offset;
use crate::graph::ConceptNode;

/// Create a new card, due immediately
pub fn create_card(
    question: String,
    answer: String,
    session_id: String,
    concept_id: Option<String>,
    priority: Option<Priority>,
    tags: Option<Vec<String>>,
) -> ReviewCard {
    let mut card = ReviewCard::new(question, answer, session_id);
    card.concept_id = concept_id;
    if let Some(p) = priority {
        card.priority = p;
    }
    if let Some(t) = tags {
        card.tags = t;
    }
    card
}

/// Cards whose next review is at or before now
pub fn get_due_cards(cards: &[ReviewCard]) -> Vec<ReviewCard> {
    get_due_cards_at(cards, Utc::now())
}

pub fn get_due_cards_at(cards: &[ReviewCard], now: DateTime<Utc>) -> Vec<ReviewCard> {
    cards.iter().filter(|c| c.is_due_at(now)).cloned().collect()
}

/// Queue ordering: due before not due, then higher priority, then weaker
/// memory first
pub fn compare_for_review(a: &ReviewCard, b: &ReviewCard, now: DateTime<Utc>) -> Ordering {
    b.is_due_at(now)
        .cmp(&a.is_due_at(now))
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| memory_strength(a).total_cmp(&memory_strength(b)))
}

/// Sort a review queue in place
pub fn sort_review_queue(cards: &mut [ReviewCard]) {
    let now = Utc::now();
    cards.sort_by(|a, b| compare_for_review(a, b, now));
}

pub fn sort_review_queue_at(cards: &mut [ReviewCard], now: DateTime<Utc>) {
    cards.sort_by(|a, b| compare_for_review(a, b, now));
}

/// Apply a batch of ratings. Cards without a rating pass through unchanged,
/// ratings for unknown cards are ignored.
pub fn batch_review(cards: &[ReviewCard], ratings: &[CardRating]) -> Vec<ReviewCard> {
    batch_review_at(cards, ratings, Utc::now())
}

pub fn batch_review_at(
    cards: &[ReviewCard],
    ratings: &[CardRating],
    now: DateTime<Utc>,
) -> Vec<ReviewCard> {
    let by_card: HashMap<&str, &CardRating> =
        ratings.iter().map(|r| (r.card_id.as_str(), r)).collect();

    cards
        .iter()
        .map(|card| match by_card.get(card.id.as_str()) {
            Some(rating) => process_review_at(card, rating.quality, rating.time_taken, now),
            None => card.clone(),
        })
        .collect()
}

/// Extract one card per described concept that has no card yet
pub fn cards_from_concepts(
    concepts: &[ConceptNode],
    existing: &[ReviewCard],
    session_id: &str,
) -> Vec<ReviewCard> {
    let covered: HashSet<&str> = existing
        .iter()
        .filter_map(|c| c.concept_id.as_deref())
        .collect();

    concepts
        .iter()
        .filter(|c| !covered.contains(c.id.as_str()))
        .filter_map(|concept| {
            let description = concept.description.as_deref()?.trim();
            if description.is_empty() {
                return None;
            }
            let priority = if concept.mastery.is_unmastered() {
                Priority::High
            } else {
                Priority::Medium
            };
            Some(create_card(
                format!("What is {}?", concept.name),
                description.to_string(),
                session_id.to_string(),
                Some(concept.id.clone()),
                Some(priority),
                None,
            ))
        })
        .collect()
}

/// Compute review statistics
pub fn review_stats(cards: &[ReviewCard], utc_offset_minutes: i32) -> ReviewStats {
    review_stats_at(cards, utc_offset_minutes, Utc::now())
}

pub fn review_stats_at(
    cards: &[ReviewCard],
    utc_offset_minutes: i32,
    now: DateTime<Utc>,
) -> ReviewStats {
    let offset = fixed_offset(utc_offset_minutes);
    let local_day = |t: DateTime<Utc>| t.with_timezone(&offset).date_naive();
    let today = local_day(now);

    let mut stats = ReviewStats {
        total_cards: cards.len(),
        ..Default::default()
    };

    let mut review_days: HashSet<NaiveDate> = HashSet::new();
    let mut total_reviews = 0usize;
    let mut passed_reviews = 0usize;

    for card in cards {
        if card.is_new() {
            stats.new_cards += 1;
        } else if card.repetitions >= 3 {
            stats.mature_cards += 1;
        } else {
            stats.learning_cards += 1;
        }

        if card.is_due_at(now) {
            stats.due_cards += 1;
        }

        for record in &card.review_history {
            let day = local_day(record.date);
            review_days.insert(day);
            total_reviews += 1;
            if record.quality >= 3 {
                passed_reviews += 1;
            }
            if day == today {
                stats.reviews_today += 1;
                if record.quality >= 3 {
                    stats.correct_today += 1;
                }
            }
        }
    }

    if !cards.is_empty() {
        stats.average_ease_factor =
            cards.iter().map(|c| c.ease_factor).sum::<f64>() / cards.len() as f64;
    }
    if total_reviews > 0 {
        stats.retention_rate = passed_reviews as f64 / total_reviews as f64;
    }
    stats.streak_days = review_streak(&review_days, today);

    stats
}

/// Consecutive review days ending today, or yesterday if today has none yet
fn review_streak(days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut check_date = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&check_date) {
        streak += 1;
        check_date = check_date - Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MasteryLevel;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn card(id: &str, due_in_days: i64, priority: Priority) -> ReviewCard {
        let mut card = ReviewCard::new_at(format!("Q {}", id), "A".into(), "s1".into(), now());
        card.id = id.to_string();
        card.next_review_date = now() + Duration::days(due_in_days);
        card.priority = priority;
        card
    }

    #[test]
    fn test_due_filtering() {
        let cards = vec![
            card("past", -2, Priority::Low),
            card("now", 0, Priority::Low),
            card("future", 3, Priority::High),
        ];

        let due: Vec<String> = get_due_cards_at(&cards, now()).into_iter().map(|c| c.id).collect();
        assert_eq!(due, vec!["past", "now"]);
    }

    #[test]
    fn test_queue_order() {
        let mut weak = card("weak", -1, Priority::Medium);
        weak.ease_factor = 1.3;
        let mut strong = card("strong", -1, Priority::Medium);
        strong.repetitions = 3;

        let mut cards = vec![
            card("later", 5, Priority::High),
            strong,
            card("urgent", -1, Priority::High),
            weak,
        ];
        sort_review_queue_at(&mut cards, now());

        let order: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["urgent", "weak", "strong", "later"]);
    }

    #[test]
    fn test_batch_review_passes_unrated_cards_through() {
        let cards = vec![card("a", 0, Priority::Medium), card("b", 0, Priority::Medium)];
        let ratings = vec![
            CardRating { card_id: "a".into(), quality: 5, time_taken: 900 },
            CardRating { card_id: "ghost".into(), quality: 1, time_taken: 100 },
        ];

        let reviewed = batch_review_at(&cards, &ratings, now());

        assert_eq!(reviewed.len(), 2);
        assert_eq!(reviewed[0].repetitions, 1);
        assert_eq!(reviewed[0].review_history.len(), 1);
        assert_eq!(reviewed[1], cards[1]);
    }

    #[test]
    fn test_cards_from_concepts_skips_covered_and_undescribed() {
        let mut described = ConceptNode::new("c1", "Borrowing", MasteryLevel::Novice);
        described.description = Some("Temporary access without ownership".into());
        let mut covered = ConceptNode::new("c2", "Traits", MasteryLevel::Expert);
        covered.description = Some("Shared behaviour".into());
        let bare = ConceptNode::new("c3", "Macros", MasteryLevel::Unknown);

        let mut existing = card("x", 0, Priority::Low);
        existing.concept_id = Some("c2".into());

        let cards = cards_from_concepts(&[described, covered, bare], &[existing], "s9");

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "What is Borrowing?");
        assert_eq!(cards[0].concept_id.as_deref(), Some("c1"));
        assert_eq!(cards[0].priority, Priority::High);
        assert_eq!(cards[0].session_id, "s9");
    }

    #[test]
    fn test_review_stats() {
        let fresh = card("fresh", 0, Priority::Medium);

        let mut learning = card("learning", 1, Priority::Medium);
        learning = process_review_at(&learning, 4, 0, now() - Duration::days(1));
        learning = process_review_at(&learning, 2, 0, now());

        let mut mature = card("mature", 10, Priority::Medium);
        for day in (0..3).rev() {
            mature = process_review_at(&mature, 5, 0, now() - Duration::days(day));
        }

        let stats = review_stats_at(&[fresh, learning, mature], 0, now());

        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.new_cards, 1);
        assert_eq!(stats.learning_cards, 1);
        assert_eq!(stats.mature_cards, 1);
        assert_eq!(stats.due_cards, 1);
        assert_eq!(stats.reviews_today, 2);
        assert_eq!(stats.correct_today, 1);
        assert_eq!(stats.streak_days, 3);
        assert!((stats.retention_rate - 4.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_review_stats_empty() {
        let stats = review_stats_at(&[], 0, now());
        assert_eq!(stats, ReviewStats::default());
    }
}
