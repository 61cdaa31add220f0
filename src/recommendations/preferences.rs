//! Learner preference inference from session history

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Timelike, Utc};

use super::models::{FatigueLevel, LearningPreferences, TimeOfDay};
use crate::config::fixed_offset;
use crate::sessions::LearningSession;

/// Shortest session length counted, in minutes
const MIN_SESSION_MINUTES: f64 = 5.0;
/// Expert share at or above which a session counts as strong
const STRONG_RATIO: f64 = 0.6;
/// Expert share at or below which a session counts as weak
const WEAK_RATIO: f64 = 0.3;

/// Derive preferences for one recommendation request
pub fn infer_preferences(
    sessions: &[LearningSession],
    active_session_id: Option<&str>,
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> LearningPreferences {
    let active = active_session_id.and_then(|id| sessions.iter().find(|s| s.id == id));
    let (strong_topics, weak_topics) = topic_strengths(sessions);

    LearningPreferences {
        preferred_time: preferred_time(sessions, utc_offset_minutes),
        average_session_length: average_session_length(sessions),
        strong_topics,
        weak_topics,
        streak: session_streak(sessions, now),
        fatigue: active.map_or(FatigueLevel::Low, |session| fatigue_level(session, now)),
    }
}

/// Consecutive days with activity, walking sessions newest first.
/// Each day's expected timestamp must be within 24h of the session's.
pub fn session_streak(sessions: &[LearningSession], now: DateTime<Utc>) -> u32 {
    let mut updated: Vec<DateTime<Utc>> = sessions.iter().map(|s| s.updated_at).collect();
    updated.sort_by(|a, b| b.cmp(a));

    let day = Duration::days(1);
    let mut streak: u32 = 0;

    for timestamp in updated {
        let expected = now - Duration::days(streak as i64);
        let gap = expected - timestamp;
        if gap < Duration::zero() {
            // Same day as one already counted
            continue;
        }
        if gap < day {
            streak += 1;
        } else {
            break;
        }
    }

    streak
}

/// Mean of per-session message spans, each at least five minutes
pub fn average_session_length(sessions: &[LearningSession]) -> f64 {
    if sessions.is_empty() {
        return 0.0;
    }
    let total: f64 = sessions
        .iter()
        .map(|s| s.message_span_minutes().max(MIN_SESSION_MINUTES))
        .sum();
    total / sessions.len() as f64
}

/// Majority vote over session start times. Ties go to the earlier bucket
/// in morning, afternoon, evening, night order.
pub fn preferred_time(sessions: &[LearningSession], utc_offset_minutes: i32) -> Option<TimeOfDay> {
    let offset = fixed_offset(utc_offset_minutes);
    let mut histogram: Vec<(TimeOfDay, usize)> = TimeOfDay::ALL.iter().map(|t| (*t, 0)).collect();

    for session in sessions {
        let bucket = TimeOfDay::from_hour(session.created_at.with_timezone(&offset).hour());
        if let Some(entry) = histogram.iter_mut().find(|(t, _)| *t == bucket) {
            entry.1 += 1;
        }
    }

    histogram
        .into_iter()
        .fold(None, |best: Option<(TimeOfDay, usize)>, (bucket, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ if count > 0 => Some((bucket, count)),
            _ => best,
        })
        .map(|(bucket, _)| bucket)
}

/// Fatigue from message volume in the last two hours and time since the
/// session was last active
pub fn fatigue_level(session: &LearningSession, now: DateTime<Utc>) -> FatigueLevel {
    let window_start = now - Duration::hours(2);
    let recent_messages = session
        .messages
        .iter()
        .filter(|m| m.timestamp >= window_start && m.timestamp <= now)
        .count();
    let since_last_activity = now - session.last_activity();

    if recent_messages > 20 || since_last_activity < Duration::minutes(10) {
        FatigueLevel::High
    } else if recent_messages > 10 || since_last_activity < Duration::minutes(30) {
        FatigueLevel::Medium
    } else {
        FatigueLevel::Low
    }
}

/// Topics studied in at least two sessions, split into strong and weak.
///
/// A topic is strong when most of its sessions are at least 60% Expert,
/// weak when most are at most 30% Expert.
pub fn topic_strengths(sessions: &[LearningSession]) -> (Vec<String>, Vec<String>) {
    let mut by_topic: BTreeMap<String, Vec<&LearningSession>> = BTreeMap::new();
    for session in sessions {
        if let Some(key) = session.topic_key() {
            by_topic.entry(key).or_default().push(session);
        }
    }

    let mut strong = Vec::new();
    let mut weak = Vec::new();

    for (topic, group) in by_topic {
        if group.len() < 2 {
            continue;
        }
        let ratios: Vec<f64> = group.iter().filter_map(|s| s.expert_ratio()).collect();
        if ratios.is_empty() {
            continue;
        }

        if share_where(&ratios, |r| r >= STRONG_RATIO) > 0.5 {
            strong.push(topic);
        } else if share_where(&ratios, |r| r <= WEAK_RATIO) > 0.5 {
            weak.push(topic);
        }
    }

    (strong, weak)
}

fn share_where(ratios: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    ratios.iter().filter(|r| pred(**r)).count() as f64 / ratios.len() as f64
}
