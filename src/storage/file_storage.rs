use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::graph::{ConceptLink, ConceptNode, KnowledgeGraph};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// JSON file store for the canonical concept graph.
///
/// ```text
/// {base}/
/// ├── concepts.json
/// └── links.json
/// ```
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("scholar"))
            .ok_or(StorageError::DataDirNotFound)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Initialize storage directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        Ok(())
    }

    fn concepts_path(&self) -> PathBuf {
        self.base_path.join("concepts.json")
    }

    fn links_path(&self) -> PathBuf {
        self.base_path.join("links.json")
    }

    // ===== Graph Operations =====

    pub fn load_concepts(&self) -> Result<Vec<ConceptNode>> {
        read_json_array(&self.concepts_path())
    }

    pub fn load_links(&self) -> Result<Vec<ConceptLink>> {
        read_json_array(&self.links_path())
    }

    /// Load the stored graph; missing files load as empty
    pub fn load_graph(&self) -> Result<KnowledgeGraph> {
        Ok(KnowledgeGraph {
            concepts: self.load_concepts()?,
            links: self.load_links()?,
        })
    }

    /// Replace the stored graph
    pub fn save_graph(&self, graph: &KnowledgeGraph) -> Result<()> {
        self.init()?;
        write_json_atomic(&self.concepts_path(), &graph.concepts)?;
        write_json_atomic(&self.links_path(), &graph.links)?;
        log::debug!(
            "Saved graph with {} concepts and {} links to {:?}",
            graph.concepts.len(),
            graph.links.len(),
            self.base_path
        );
        Ok(())
    }
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write to a .tmp sibling then rename over the target
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
