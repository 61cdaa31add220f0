//! Structural analysis of the concept graph: degrees, roots, leaves,
//! depths, learning paths and clusters.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::models::{ConceptLink, ConceptNode};

/// Topology summary of a concept graph
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAnalysis {
    pub in_degree: HashMap<String, usize>,
    pub out_degree: HashMap<String, usize>,
    /// No incoming links, at least one outgoing
    pub roots: Vec<String>,
    /// No outgoing links, at least one incoming
    pub leaves: Vec<String>,
    /// Shortest distance from any root
    pub depth: HashMap<String, usize>,
    /// Root-to-leaf paths
    pub chains: Vec<Vec<String>>,
    /// Connected components, ignoring link direction
    pub clusters: Vec<Vec<String>>,
}

impl GraphAnalysis {
    /// Analyze a graph. Links with an unknown endpoint are ignored and at
    /// most `max_chains` learning paths are enumerated.
    pub fn analyze(concepts: &[ConceptNode], links: &[ConceptLink], max_chains: usize) -> Self {
        let known: HashSet<&str> = concepts.iter().map(|c| c.id.as_str()).collect();
        let links: Vec<&ConceptLink> = links
            .iter()
            .filter(|l| known.contains(l.source.as_str()) && known.contains(l.target.as_str()))
            .collect();

        let mut in_degree: HashMap<String, usize> =
            concepts.iter().map(|c| (c.id.clone(), 0)).collect();
        let mut out_degree = in_degree.clone();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut undirected: HashMap<&str, Vec<&str>> = HashMap::new();

        for link in &links {
            *out_degree.entry(link.source.clone()).or_default() += 1;
            *in_degree.entry(link.target.clone()).or_default() += 1;
            let (source, target) = (link.source.as_str(), link.target.as_str());
            children.entry(source).or_default().push(target);
            undirected.entry(source).or_default().push(target);
            undirected.entry(target).or_default().push(source);
        }

        let degree = |map: &HashMap<String, usize>, id: &str| map.get(id).copied().unwrap_or(0);

        let roots: Vec<String> = concepts
            .iter()
            .filter(|c| degree(&in_degree, &c.id) == 0 && degree(&out_degree, &c.id) > 0)
            .map(|c| c.id.clone())
            .collect();
        let leaves: Vec<String> = concepts
            .iter()
            .filter(|c| degree(&out_degree, &c.id) == 0 && degree(&in_degree, &c.id) > 0)
            .map(|c| c.id.clone())
            .collect();

        let depth = root_depths(&roots, &children);
        let chains = enumerate_chains(&roots, &children, max_chains);
        let clusters = connected_clusters(concepts, &undirected);

        Self {
            in_degree,
            out_degree,
            roots,
            leaves,
            depth,
            chains,
            clusters,
        }
    }

    /// Depth of a concept; concepts no root reaches count as foundational
    pub fn depth_of(&self, id: &str) -> usize {
        self.depth.get(id).copied().unwrap_or(0)
    }

    /// First learning path passing through a concept
    pub fn chain_containing(&self, id: &str) -> Option<&[String]> {
        self.chains
            .iter()
            .find(|chain| chain.iter().any(|c| c == id))
            .map(Vec::as_slice)
    }

    /// Size of the cluster a concept belongs to
    pub fn cluster_size(&self, id: &str) -> usize {
        self.clusters
            .iter()
            .find(|cluster| cluster.iter().any(|c| c == id))
            .map_or(0, Vec::len)
    }
}

/// BFS from every root, keeping the smallest depth seen for each node
fn root_depths(roots: &[String], children: &HashMap<&str, Vec<&str>>) -> HashMap<String, usize> {
    let mut depth: HashMap<String, usize> = HashMap::new();

    for root in roots {
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((root.as_str(), 0));

        while let Some((node, d)) = queue.pop_front() {
            match depth.get(node) {
                Some(&known) if known <= d => continue,
                _ => {
                    depth.insert(node.to_string(), d);
                }
            }
            for &child in children.get(node).into_iter().flatten() {
                queue.push_back((child, d + 1));
            }
        }
    }

    depth
}

fn enumerate_chains(
    roots: &[String],
    children: &HashMap<&str, Vec<&str>>,
    max_chains: usize,
) -> Vec<Vec<String>> {
    let mut chains = Vec::new();
    for root in roots {
        let mut path = vec![root.as_str()];
        walk_chains(&mut path, children, max_chains, &mut chains);
        if chains.len() >= max_chains {
            log::debug!("Learning path enumeration stopped at {} chains", max_chains);
            break;
        }
    }
    chains
}

fn walk_chains<'a>(
    path: &mut Vec<&'a str>,
    children: &HashMap<&'a str, Vec<&'a str>>,
    max_chains: usize,
    chains: &mut Vec<Vec<String>>,
) {
    if chains.len() >= max_chains {
        return;
    }
    let Some(&node) = path.last() else {
        return;
    };

    let next: Vec<&str> = children
        .get(node)
        .into_iter()
        .flatten()
        .copied()
        .filter(|child| !path.contains(child))
        .collect();

    if next.is_empty() {
        chains.push(path.iter().map(|s| s.to_string()).collect());
        return;
    }

    for child in next {
        path.push(child);
        walk_chains(path, children, max_chains, chains);
        path.pop();
    }
}

fn connected_clusters(
    concepts: &[ConceptNode],
    undirected: &HashMap<&str, Vec<&str>>,
) -> Vec<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut clusters = Vec::new();

    for concept in concepts {
        if !visited.insert(concept.id.as_str()) {
            continue;
        }
        let mut cluster = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([concept.id.as_str()]);

        while let Some(node) = queue.pop_front() {
            cluster.push(node.to_string());
            for &neighbor in undirected.get(node).into_iter().flatten() {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        clusters.push(cluster);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::MasteryLevel;

    fn graph() -> (Vec<ConceptNode>, Vec<ConceptLink>) {
        let concepts = ["basics", "vars", "funcs", "closures", "islands"]
            .iter()
            .map(|id| ConceptNode::new(*id, *id, MasteryLevel::Unknown))
            .collect();
        let links = vec![
            ConceptLink::new("basics", "vars", "prerequisite"),
            ConceptLink::new("basics", "funcs", "prerequisite"),
            ConceptLink::new("funcs", "closures", "extends"),
            ConceptLink::new("vars", "closures", "captured by"),
        ];
        (concepts, links)
    }

    #[test]
    fn test_roots_leaves_and_depths() {
        let (concepts, links) = graph();
        let analysis = GraphAnalysis::analyze(&concepts, &links, 100);

        assert_eq!(analysis.roots, vec!["basics"]);
        assert_eq!(analysis.leaves, vec!["closures"]);
        assert_eq!(analysis.depth_of("basics"), 0);
        assert_eq!(analysis.depth_of("funcs"), 1);
        assert_eq!(analysis.depth_of("closures"), 2);
        assert_eq!(analysis.depth.get("islands"), None);
        assert_eq!(analysis.depth_of("islands"), 0);
    }

    #[test]
    fn test_chains_enumerate_every_path() {
        let (concepts, links) = graph();
        let analysis = GraphAnalysis::analyze(&concepts, &links, 100);

        assert_eq!(
            analysis.chains,
            vec![
                vec!["basics", "vars", "closures"],
                vec!["basics", "funcs", "closures"],
            ]
        );
        assert_eq!(analysis.chain_containing("funcs").map(<[String]>::len), Some(3));
    }

    #[test]
    fn test_chain_enumeration_is_bounded() {
        let (concepts, links) = graph();
        let analysis = GraphAnalysis::analyze(&concepts, &links, 1);
        assert_eq!(analysis.chains.len(), 1);
    }

    #[test]
    fn test_clusters_ignore_direction() {
        let (concepts, links) = graph();
        let analysis = GraphAnalysis::analyze(&concepts, &links, 100);

        assert_eq!(analysis.clusters.len(), 2);
        assert_eq!(analysis.cluster_size("closures"), 4);
        assert_eq!(analysis.cluster_size("islands"), 1);
    }

    #[test]
    fn test_cycles_do_not_hang_analysis() {
        let concepts: Vec<ConceptNode> = ["r", "a", "b"]
            .iter()
            .map(|id| ConceptNode::new(*id, *id, MasteryLevel::Unknown))
            .collect();
        let links = vec![
            ConceptLink::new("r", "a", ""),
            ConceptLink::new("a", "b", ""),
            ConceptLink::new("b", "a", ""),
        ];

        let analysis = GraphAnalysis::analyze(&concepts, &links, 100);
        assert_eq!(analysis.depth_of("b"), 2);
        assert_eq!(analysis.chains, vec![vec!["r", "a", "b"]]);
    }
}
