//! Consolidation of tutor-model graph fragments into the canonical graph
//!
//! The tutor model returns a full incremental graph on every turn, so the
//! same concept shows up again and again with small naming differences.
//! Incoming nodes are matched in order of authority:
//! 1. exact id
//! 2. normalized name
//! 3. fuzzy name similarity above the configured threshold
//!
//! and inserted as new only when nothing matches.

use std::collections::{HashMap, HashSet};

use super::models::{ConceptLink, ConceptNode, ConceptPatch, KnowledgeGraph, TutorResponse};
use super::normalize::{name_similarity, normalize_name};
use super::validate::validate_tree;
use crate::config::GraphConfig;

/// Result of a concept merge
#[derive(Debug, Clone, Default)]
pub struct ConceptMerge {
    pub concepts: Vec<ConceptNode>,
    /// Incoming ids that were folded into a node with a different id
    pub aliases: HashMap<String, String>,
}

/// Outcome of consolidating one tutor turn
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub graph: KnowledgeGraph,
    pub aliases: HashMap<String, String>,
    pub is_valid_tree: bool,
}

/// Graph consolidator with a tunable fuzzy-match threshold
#[derive(Debug, Clone)]
pub struct Consolidator {
    fuzzy_threshold: f64,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new(&GraphConfig::default())
    }
}

impl Consolidator {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            fuzzy_threshold: config.fuzzy_threshold,
        }
    }

    /// Merge incoming concept patches into the existing set
    pub fn merge_concepts(
        &self,
        existing: &[ConceptNode],
        incoming: &[ConceptPatch],
    ) -> ConceptMerge {
        let mut concepts: Vec<ConceptNode> = existing.to_vec();
        let mut keys: Vec<String> = concepts.iter().map(|c| normalize_name(&c.name)).collect();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut aliases = HashMap::new();

        for (idx, concept) in concepts.iter().enumerate() {
            by_id.entry(concept.id.clone()).or_insert(idx);
            if !keys[idx].is_empty() {
                by_name.entry(keys[idx].clone()).or_insert(idx);
            }
        }

        for patch in incoming {
            if let Some(&idx) = by_id.get(&patch.id) {
                concepts[idx].apply(patch);
                reindex_name(&concepts, &mut keys, &mut by_name, idx);
                continue;
            }

            let key = patch.name.as_deref().map(normalize_name).unwrap_or_default();

            let matched = if key.is_empty() {
                None
            } else {
                by_name
                    .get(&key)
                    .copied()
                    .or_else(|| self.best_fuzzy_match(&key, &keys))
            };

            if let Some(idx) = matched {
                log::debug!(
                    "Merged incoming concept {} ({:?}) into {} ({})",
                    patch.id,
                    patch.name,
                    concepts[idx].id,
                    concepts[idx].name
                );
                if !patch.id.is_empty() {
                    aliases.insert(patch.id.clone(), concepts[idx].id.clone());
                    by_id.insert(patch.id.clone(), idx);
                }
                concepts[idx].apply(patch);
                reindex_name(&concepts, &mut keys, &mut by_name, idx);
                continue;
            }

            if patch.id.trim().is_empty() {
                log::debug!("Skipping incoming concept without id: {:?}", patch.name);
                continue;
            }

            let idx = concepts.len();
            concepts.push(ConceptNode::from_patch(patch));
            keys.push(key.clone());
            by_id.insert(patch.id.clone(), idx);
            if !key.is_empty() {
                by_name.entry(key).or_insert(idx);
            }
        }

        ConceptMerge { concepts, aliases }
    }

    /// Highest-scoring existing node strictly above the threshold.
    /// Ties go to the earliest node.
    fn best_fuzzy_match(&self, key: &str, keys: &[String]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in keys.iter().enumerate() {
            let score = name_similarity(key, candidate);
            if score > self.fuzzy_threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Consolidate a whole tutor turn into the graph.
    ///
    /// Incoming link endpoints are rewritten through the alias map before
    /// filtering, so links pointing at a folded duplicate survive.
    pub fn consolidate(&self, graph: &KnowledgeGraph, response: &TutorResponse) -> Consolidation {
        let ConceptMerge { concepts, aliases } =
            self.merge_concepts(&graph.concepts, &response.updated_concepts);
        let incoming_links = remap_links(&response.updated_links, &aliases);
        let links = merge_links(&graph.links, &incoming_links, &concepts);
        let is_valid_tree = validate_tree(&concepts, &links);

        log::info!(
            "Consolidated turn: {} concepts ({} incoming), {} links ({} incoming)",
            concepts.len(),
            response.updated_concepts.len(),
            links.len(),
            response.updated_links.len()
        );

        Consolidation {
            graph: KnowledgeGraph { concepts, links },
            aliases,
            is_valid_tree,
        }
    }
}

impl KnowledgeGraph {
    /// Consolidate a tutor turn using the default fuzzy threshold
    pub fn consolidate(&self, response: &TutorResponse) -> Consolidation {
        Consolidator::default().consolidate(self, response)
    }
}

fn reindex_name(
    concepts: &[ConceptNode],
    keys: &mut [String],
    by_name: &mut HashMap<String, usize>,
    idx: usize,
) {
    let key = normalize_name(&concepts[idx].name);
    if !key.is_empty() {
        by_name.entry(key.clone()).or_insert(idx);
    }
    keys[idx] = key;
}

/// Merge incoming concepts using the default threshold
pub fn merge_concepts(existing: &[ConceptNode], incoming: &[ConceptPatch]) -> Vec<ConceptNode> {
    Consolidator::default().merge_concepts(existing, incoming).concepts
}

/// Merge link sets against the merged concept set.
///
/// Links with a missing endpoint, self-loops and reverse-direction
/// duplicates of an already kept link are dropped. Existing links are
/// considered before incoming ones.
pub fn merge_links(
    existing: &[ConceptLink],
    incoming: &[ConceptLink],
    concepts: &[ConceptNode],
) -> Vec<ConceptLink> {
    let ids: HashSet<&str> = concepts.iter().map(|c| c.id.as_str()).collect();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut merged = Vec::new();

    for link in existing.iter().chain(incoming) {
        let (source, target) = (link.source.as_str(), link.target.as_str());

        if !ids.contains(source) || !ids.contains(target) {
            log::debug!("Dropping link with dangling endpoint: {} -> {}", source, target);
            continue;
        }
        if source == target {
            log::debug!("Dropping self-loop on {}", source);
            continue;
        }
        if seen.contains(&(target, source)) {
            log::debug!("Dropping reverse duplicate link: {} -> {}", source, target);
            continue;
        }
        if seen.insert((source, target)) {
            merged.push(link.clone());
        }
    }

    merged
}

/// Rewrite link endpoints through an alias map
pub fn remap_links(links: &[ConceptLink], aliases: &HashMap<String, String>) -> Vec<ConceptLink> {
    let resolve = |id: &String| aliases.get(id).cloned().unwrap_or_else(|| id.clone());
    links
        .iter()
        .map(|link| ConceptLink {
            source: resolve(&link.source),
            target: resolve(&link.target),
            relationship: link.relationship.clone(),
        })
        .collect()
}
