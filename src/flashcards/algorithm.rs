//! SM-2 Spaced Repetition Algorithm
//!
//! Variant of the SuperMemo 2 algorithm used to schedule card reviews.
//!
//! Quality ratings (1-5):
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation
//!
//! Ratings below 3 reset the card, a rating of 3 only adjusts the ease
//! factor, and ratings of 4 and 5 advance the schedule.

use chrono::{DateTime, Duration, Utc};

use super::models::{ReviewCard, ReviewRecord};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval a review can schedule (100 years)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Apply one review to a card, returning the updated copy
pub fn process_review(card: &ReviewCard, quality: u8, time_taken_ms: u64) -> ReviewCard {
    process_review_at(card, quality, time_taken_ms, Utc::now())
}

/// Apply one review at a given instant
pub fn process_review_at(
    card: &ReviewCard,
    quality: u8,
    time_taken_ms: u64,
    now: DateTime<Utc>,
) -> ReviewCard {
    // Clamp quality to valid range
    let quality = quality.clamp(1, 5);
    let mut updated = card.clone();

    // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
    let penalty = (5 - quality) as f64;
    updated.ease_factor =
        (card.ease_factor + (0.1 - penalty * (0.08 + penalty * 0.02))).max(MIN_EASE_FACTOR);

    if quality < 3 {
        // Forgotten: start over
        updated.repetitions = 0;
        updated.interval = 1;
    } else if quality >= 4 {
        updated.repetitions = card.repetitions.saturating_add(1);
        updated.interval = match updated.repetitions {
            1 => 1,
            2 => 6,
            // Uses the ease factor from before this review
            _ => ((card.interval as f64 * card.ease_factor).round() as u32)
                .clamp(1, MAX_INTERVAL_DAYS),
        };
    }

    // Imported cards may carry any interval, so the date add can still overflow
    updated.next_review_date = now
        .checked_add_signed(Duration::days(updated.interval as i64))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    updated.last_review_date = Some(now);
    updated.review_history.push(ReviewRecord {
        date: now,
        quality,
        time_taken: time_taken_ms,
    });

    updated
}

/// Display metric in [0, 100] combining repetitions and ease factor.
/// Not used for scheduling.
pub fn memory_strength(card: &ReviewCard) -> f64 {
    let repetition_score = (card.repetitions as f64 * 20.0).min(60.0);
    let ease_score = (card.ease_factor - MIN_EASE_FACTOR) / 1.2 * 40.0;
    (repetition_score + ease_score).clamp(0.0, 100.0)
}

/// Calculate the preview intervals for each UI rating
/// Used to show users what interval each rating would give
pub fn preview_intervals(card: &ReviewCard) -> [u32; 4] {
    // Returns intervals for ratings: Again (1), Hard (2), Good (3), Easy (4)
    let now = Utc::now();
    [1, 2, 3, 4]
        .map(|rating| process_review_at(card, ui_rating_to_quality(rating), 0, now).interval)
}

/// Map UI rating (1-4: Again, Hard, Good, Easy) to SM-2 quality (1-5)
pub fn ui_rating_to_quality(rating: u8) -> u8 {
    match rating {
        1 => 1, // Again -> quality 1 (incorrect but recognized)
        2 => 3, // Hard -> quality 3 (correct with difficulty)
        3 => 4, // Good -> quality 4 (correct with hesitation)
        4 => 5, // Easy -> quality 5 (perfect)
        _ => 3,
    }
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
