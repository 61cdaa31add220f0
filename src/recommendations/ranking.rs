//! Filtering, diversification and final ordering of candidates

use std::cmp::Ordering;
use std::collections::VecDeque;

use super::models::{Recommendation, RecommendationType};
use crate::config::RecommendationConfig;

/// Higher priority first, then higher confidence
pub fn compare_recommendations(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| b.confidence_score.total_cmp(&a.confidence_score))
}

/// Drop low-confidence candidates, interleave types, sort and truncate
pub fn rank(
    mut candidates: Vec<Recommendation>,
    config: &RecommendationConfig,
) -> Vec<Recommendation> {
    let before = candidates.len();
    candidates.retain(|r| r.confidence_score >= config.min_confidence_threshold);
    if candidates.len() < before {
        log::debug!(
            "Dropped {} recommendation(s) below confidence {}",
            before - candidates.len(),
            config.min_confidence_threshold
        );
    }

    if config.diversity_factor > 0.0 {
        candidates = diversify(candidates, config.max_recommendations, config.diversity_factor);
    }

    candidates.sort_by(compare_recommendations);
    candidates.truncate(config.max_recommendations);
    candidates
}

/// Round-robin across type buckets, in order of each type's first
/// appearance, capping how many of one type can survive.
///
/// The cap is `max_recommendations * (1 - diversity_factor)` rounded up,
/// never below one.
pub fn diversify(
    candidates: Vec<Recommendation>,
    max_recommendations: usize,
    diversity_factor: f64,
) -> Vec<Recommendation> {
    let mut buckets: Vec<(RecommendationType, Vec<Recommendation>)> = Vec::new();
    for rec in candidates {
        match buckets.iter_mut().find(|(kind, _)| *kind == rec.kind) {
            Some((_, bucket)) => bucket.push(rec),
            None => buckets.push((rec.kind, vec![rec])),
        }
    }

    let factor = diversity_factor.clamp(0.0, 1.0);
    let per_type_cap = ((max_recommendations as f64 * (1.0 - factor)).ceil() as usize).max(1);

    let mut queues: Vec<VecDeque<Recommendation>> = buckets
        .into_iter()
        .map(|(_, mut bucket)| {
            bucket.sort_by(compare_recommendations);
            bucket.truncate(per_type_cap);
            VecDeque::from(bucket)
        })
        .collect();

    let mut interleaved = Vec::new();
    while queues.iter().any(|q| !q.is_empty()) {
        for queue in queues.iter_mut() {
            if let Some(rec) = queue.pop_front() {
                interleaved.push(rec);
            }
        }
    }
    interleaved
}
