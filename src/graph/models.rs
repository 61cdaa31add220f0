//! Data models for the concept graph

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Ordinal proficiency of the learner on a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MasteryLevel {
    #[serde(alias = "unknown")]
    Unknown,
    #[serde(alias = "novice")]
    Novice,
    #[serde(alias = "competent")]
    Competent,
    #[serde(alias = "expert")]
    Expert,
}

impl Default for MasteryLevel {
    fn default() -> Self {
        Self::Unknown
    }
}

impl MasteryLevel {
    /// Competent or Expert
    pub fn is_mastered(self) -> bool {
        matches!(self, Self::Competent | Self::Expert)
    }

    /// Unknown or Novice
    pub fn is_unmastered(self) -> bool {
        !self.is_mastered()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Novice => "Novice",
            Self::Competent => "Competent",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasteryLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "novice" => Ok(Self::Novice),
            "competent" => Ok(Self::Competent),
            "expert" => Ok(Self::Expert),
            other => Err(format!("unknown mastery level: {}", other)),
        }
    }
}

/// A concept in the learner's knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mastery: MasteryLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConceptNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mastery: MasteryLevel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mastery,
            description: None,
        }
    }

    /// Build a fresh node from a patch that matched nothing.
    /// A patch without a name falls back to its id as display name.
    pub fn from_patch(patch: &ConceptPatch) -> Self {
        Self {
            id: patch.id.clone(),
            name: patch.name.clone().unwrap_or_else(|| patch.id.clone()),
            mastery: patch.mastery.unwrap_or_default(),
            description: patch.description.clone(),
        }
    }

    /// Overwrite fields present in the patch, keeping the id
    pub fn apply(&mut self, patch: &ConceptPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(mastery) = patch.mastery {
            self.mastery = mastery;
        }
        if let Some(ref description) = patch.description {
            self.description = Some(description.clone());
        }
    }
}

/// An incoming concept update from the tutor model.
///
/// Every field other than `id` may be absent; empty or whitespace-only
/// strings and unrecognised mastery labels deserialize as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptPatch {
    #[serde(default)]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_mastery", skip_serializing_if = "Option::is_none")]
    pub mastery: Option<MasteryLevel>,
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

impl ConceptPatch {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            mastery: None,
            description: None,
        }
    }

    pub fn with_mastery(mut self, mastery: MasteryLevel) -> Self {
        self.mastery = Some(mastery);
        self
    }
}

impl From<&ConceptNode> for ConceptPatch {
    fn from(node: &ConceptNode) -> Self {
        Self {
            id: node.id.clone(),
            name: Some(node.name.clone()),
            mastery: Some(node.mastery),
            description: node.description.clone(),
        }
    }
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn lenient_mastery<'de, D>(deserializer: D) -> Result<Option<MasteryLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse().ok()))
}

/// Directed edge between two concept ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptLink {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub relationship: String,
}

impl ConceptLink {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship: relationship.into(),
        }
    }
}

/// The graph-bearing part of a tutor model turn. Other fields of the
/// response (reply text, summaries) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorResponse {
    #[serde(default)]
    pub updated_concepts: Vec<ConceptPatch>,
    #[serde(default)]
    pub updated_links: Vec<ConceptLink>,
}

/// The canonical concept/link pair held by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub concepts: Vec<ConceptNode>,
    #[serde(default)]
    pub links: Vec<ConceptLink>,
}

impl KnowledgeGraph {
    pub fn new(concepts: Vec<ConceptNode>, links: Vec<ConceptLink>) -> Self {
        Self { concepts, links }
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn concept(&self, id: &str) -> Option<&ConceptNode> {
        self.concepts.iter().find(|c| c.id == id)
    }

    /// Concepts adjacent to `id` in either direction, with the connecting link
    pub fn neighbors<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = (&'a ConceptNode, &'a ConceptLink)> + 'a {
        self.links.iter().filter_map(move |link| {
            let other = if link.source == id {
                &link.target
            } else if link.target == id {
                &link.source
            } else {
                return None;
            };
            self.concept(other).map(|node| (node, link))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_treats_empty_strings_as_absent() {
        let json = r#"{"id":"c1","name":"  ","mastery":"","description":""}"#;
        let patch: ConceptPatch = serde_json::from_str(json).unwrap();

        assert_eq!(patch.id, "c1");
        assert!(patch.name.is_none());
        assert!(patch.mastery.is_none());
        assert!(patch.description.is_none());
    }

    #[test]
    fn test_patch_parses_mastery_case_insensitively() {
        let json = r#"{"id":"c1","name":"Rust","mastery":"competent"}"#;
        let patch: ConceptPatch = serde_json::from_str(json).unwrap();
        assert_eq!(patch.mastery, Some(MasteryLevel::Competent));
    }

    #[test]
    fn test_apply_keeps_prior_values_for_missing_fields() {
        let mut node = ConceptNode::new("c1", "Ownership", MasteryLevel::Novice);
        node.description = Some("Who frees memory".to_string());

        node.apply(&ConceptPatch {
            id: "c1".to_string(),
            mastery: Some(MasteryLevel::Competent),
            ..Default::default()
        });

        assert_eq!(node.name, "Ownership");
        assert_eq!(node.mastery, MasteryLevel::Competent);
        assert_eq!(node.description.as_deref(), Some("Who frees memory"));
    }

    #[test]
    fn test_tutor_response_ignores_extra_fields() {
        let json = r#"{
            "reply": "Great question!",
            "updatedConcepts": [{"id": "c1", "name": "Closures", "mastery": "Novice"}],
            "updatedLinks": [{"source": "c0", "target": "c1", "relationship": "uses"}]
        }"#;
        let response: TutorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.updated_concepts.len(), 1);
        assert_eq!(response.updated_links[0].relationship, "uses");
    }

    #[test]
    fn test_neighbors_follow_both_directions() {
        let graph = KnowledgeGraph::new(
            vec![
                ConceptNode::new("a", "A", MasteryLevel::Expert),
                ConceptNode::new("b", "B", MasteryLevel::Unknown),
                ConceptNode::new("c", "C", MasteryLevel::Unknown),
            ],
            vec![ConceptLink::new("a", "b", "leads to"), ConceptLink::new("c", "a", "part of")],
        );

        let ids: Vec<&str> = graph.neighbors("a").map(|(n, _)| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
