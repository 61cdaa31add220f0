use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use scholar_lib::config::EngineConfig;
use scholar_lib::flashcards::{FlashcardStorage, ReviewCard};
use scholar_lib::graph::KnowledgeGraph;
use scholar_lib::sessions::{LearningSession, SessionStorage};
use scholar_lib::storage::FileStorage;

/// Shared application state for CLI commands
pub struct App {
    pub config: EngineConfig,
    pub storage: FileStorage,
    pub cards: FlashcardStorage,
    pub sessions: SessionStorage,
}

impl App {
    /// Open the data directory and load configuration
    pub fn new(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let data_dir: PathBuf = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => FileStorage::default_data_dir().context("Failed to get data directory")?,
        };

        let storage = FileStorage::new(data_dir.clone());
        storage.init().context("Failed to initialize data directory")?;

        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("config.toml"));
        let config = EngineConfig::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        let sessions = SessionStorage::new(data_dir.clone())
            .context("Failed to initialize session storage")?;

        log::debug!("Using data directory {:?}", data_dir);

        Ok(Self {
            config,
            storage,
            cards: FlashcardStorage::new(data_dir),
            sessions,
        })
    }

    pub fn load_graph(&self) -> Result<KnowledgeGraph> {
        self.storage.load_graph().context("Failed to load concept graph")
    }

    pub fn save_graph(&self, graph: &KnowledgeGraph) -> Result<()> {
        self.storage.save_graph(graph).context("Failed to save concept graph")
    }

    pub fn list_cards(&self) -> Result<Vec<ReviewCard>> {
        self.cards.list_cards().context("Failed to list cards")
    }

    pub fn list_sessions(&self) -> Result<Vec<LearningSession>> {
        self.sessions.list_sessions().context("Failed to list sessions")
    }

    /// Find a card by id or unique id prefix
    pub fn find_card(&self, id: &str) -> Result<ReviewCard> {
        let cards = self.list_cards()?;

        if let Some(card) = cards.iter().find(|c| c.id == id) {
            return Ok(card.clone());
        }

        let matches: Vec<&ReviewCard> = cards.iter().filter(|c| c.id.starts_with(id)).collect();
        match matches.len() {
            0 => bail!("No card matching '{}'", id),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous card id '{}'. Matches:\n{}",
                id,
                matches
                    .iter()
                    .map(|c| format!("  - {} {}", c.id, c.question))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }
}

/// Split a comma-separated list, dropping empty entries
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shorten text for table output
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
