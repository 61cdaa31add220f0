//! Structural validation of the concept graph

use std::collections::HashMap;

use super::models::{ConceptLink, ConceptNode, KnowledgeGraph};

impl KnowledgeGraph {
    /// See [`validate_tree`]
    pub fn validate(&self) -> bool {
        validate_tree(&self.concepts, &self.links)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet
    White,
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

/// Check that every link references known concepts and that the graph has
/// no directed cycle.
///
/// Problems are logged and reported through the return value only.
pub fn validate_tree(concepts: &[ConceptNode], links: &[ConceptLink]) -> bool {
    let index: HashMap<&str, usize> = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); concepts.len()];
    let mut in_degree = vec![0usize; concepts.len()];

    for link in links {
        let (Some(&source), Some(&target)) =
            (index.get(link.source.as_str()), index.get(link.target.as_str()))
        else {
            log::warn!(
                "Invalid graph: link {} -> {} references a missing concept",
                link.source,
                link.target
            );
            return false;
        };
        children[source].push(target);
        in_degree[target] += 1;
    }

    let roots: Vec<usize> = (0..concepts.len()).filter(|&i| in_degree[i] == 0).collect();
    if roots.is_empty() && !concepts.is_empty() {
        log::warn!(
            "Graph with {} concepts has no root; every concept has an incoming link",
            concepts.len()
        );
    }

    let mut colors = vec![Color::White; concepts.len()];

    // Roots first, then anything a root cannot reach (rootless cycles)
    for start in roots.into_iter().chain(0..concepts.len()) {
        if colors[start] != Color::White {
            continue;
        }
        if let Some(node) = find_cycle_from(start, &children, &mut colors) {
            log::warn!(
                "Invalid graph: cycle detected through concept {} ({})",
                concepts[node].id,
                concepts[node].name
            );
            return false;
        }
    }

    true
}

/// Iterative DFS. Returns the node closing a cycle, if any.
fn find_cycle_from(start: usize, children: &[Vec<usize>], colors: &mut [Color]) -> Option<usize> {
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    colors[start] = Color::Gray;

    while let Some(&(node, next)) = stack.last() {
        match children[node].get(next) {
            Some(&child) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match colors[child] {
                    Color::White => {
                        colors[child] = Color::Gray;
                        stack.push((child, 0));
                    }
                    Color::Gray => return Some(child),
                    Color::Black => {}
                }
            }
            None => {
                colors[node] = Color::Black;
                stack.pop();
            }
        }
    }

    None
}
