//! Storage operations for review cards
//!
//! Directory structure:
//! ```text
//! {data-dir}/
//! └── cards.json           # Array of all review cards
//! ```
//!
//! Every mutation loads the whole array, replaces it with the value the
//! pure queue functions return, and writes it back.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::algorithm::process_review;
use super::models::*;
use super::queue::{batch_review, get_due_cards, review_stats, sort_review_queue};

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Card not found: {0}")]
    CardNotFound(String),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Storage manager for review cards
pub struct FlashcardStorage {
    data_dir: PathBuf,
}

impl FlashcardStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Get the cards.json path
    fn cards_path(&self) -> PathBuf {
        self.data_dir.join("cards.json")
    }

    // ==================== Card Operations ====================

    /// List all cards
    pub fn list_cards(&self) -> Result<Vec<ReviewCard>> {
        let cards_path = self.cards_path();
        if !cards_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&cards_path)?;
        let cards: Vec<ReviewCard> = serde_json::from_str(&content)?;
        Ok(cards)
    }

    /// Replace the stored card list
    pub fn save_cards(&self, cards: &[ReviewCard]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::write(self.cards_path(), serde_json::to_string_pretty(cards)?)?;
        Ok(())
    }

    /// Get a specific card
    pub fn get_card(&self, card_id: &str) -> Result<ReviewCard> {
        self.list_cards()?
            .into_iter()
            .find(|c| c.id == card_id)
            .ok_or_else(|| FlashcardStorageError::CardNotFound(card_id.to_string()))
    }

    /// Add a new card
    pub fn add_card(&self, card: ReviewCard) -> Result<ReviewCard> {
        let mut cards = self.list_cards()?;
        cards.push(card.clone());
        self.save_cards(&cards)?;
        Ok(card)
    }

    /// Add several cards at once
    pub fn add_cards(&self, new_cards: Vec<ReviewCard>) -> Result<usize> {
        let count = new_cards.len();
        let mut cards = self.list_cards()?;
        cards.extend(new_cards);
        self.save_cards(&cards)?;
        Ok(count)
    }

    /// Delete a card
    pub fn delete_card(&self, card_id: &str) -> Result<()> {
        let mut cards = self.list_cards()?;
        let before = cards.len();
        cards.retain(|c| c.id != card_id);
        if cards.len() == before {
            return Err(FlashcardStorageError::CardNotFound(card_id.to_string()));
        }
        self.save_cards(&cards)
    }

    // ==================== Review Operations ====================

    /// Due cards in review order
    pub fn get_due_cards(&self) -> Result<Vec<ReviewCard>> {
        let mut due = get_due_cards(&self.list_cards()?);
        sort_review_queue(&mut due);
        Ok(due)
    }

    /// Submit a review for a card
    pub fn submit_review(
        &self,
        card_id: &str,
        quality: u8,
        time_taken_ms: u64,
    ) -> Result<ReviewCard> {
        let mut cards = self.list_cards()?;
        let pos = cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| FlashcardStorageError::CardNotFound(card_id.to_string()))?;

        let updated = process_review(&cards[pos], quality, time_taken_ms);
        cards[pos] = updated.clone();
        self.save_cards(&cards)?;

        Ok(updated)
    }

    /// Submit a batch of reviews; returns the full updated card list
    pub fn submit_reviews(&self, ratings: &[CardRating]) -> Result<Vec<ReviewCard>> {
        let cards = batch_review(&self.list_cards()?, ratings);
        self.save_cards(&cards)?;
        Ok(cards)
    }

    /// Get review statistics
    pub fn get_review_stats(&self, utc_offset_minutes: i32) -> Result<ReviewStats> {
        Ok(review_stats(&self.list_cards()?, utc_offset_minutes))
    }

    // ==================== Import / Export ====================

    /// Export all cards to a JSON file
    pub fn export_cards(&self, path: &Path) -> Result<usize> {
        let cards = self.list_cards()?;
        fs::write(path, serde_json::to_string_pretty(&cards)?)?;
        Ok(cards.len())
    }

    /// Import cards from a JSON file. Imported cards replace stored cards
    /// with the same id; returns the number of imported cards.
    pub fn import_cards(&self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        let imported: Vec<ReviewCard> = serde_json::from_str(&content)?;

        let mut cards = self.list_cards()?;
        for card in &imported {
            match cards.iter().position(|c| c.id == card.id) {
                Some(pos) => cards[pos] = card.clone(),
                None => cards.push(card.clone()),
            }
        }
        self.save_cards(&cards)?;

        log::info!("Imported {} cards from {:?}", imported.len(), path);
        Ok(imported.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FlashcardStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    fn new_card(question: &str) -> ReviewCard {
        ReviewCard::new(question.to_string(), "answer".to_string(), "s1".to_string())
    }

    #[test]
    fn test_empty_storage_lists_nothing() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.list_cards().unwrap().is_empty());
    }

    #[test]
    fn test_add_and_get_card() {
        let (storage, _temp) = create_test_storage();

        let created = storage.add_card(new_card("What is a trait?")).unwrap();
        let retrieved = storage.get_card(&created.id).unwrap();

        assert_eq!(retrieved.question, "What is a trait?");
        assert_eq!(retrieved.ease_factor, DEFAULT_EASE_FACTOR);
        assert!(retrieved.is_due());
    }

    #[test]
    fn test_submit_review_persists() {
        let (storage, _temp) = create_test_storage();
        let card = storage.add_card(new_card("What is a slice?")).unwrap();

        let updated = storage.submit_review(&card.id, 5, 1500).unwrap();
        assert_eq!(updated.repetitions, 1);

        let stored = storage.get_card(&card.id).unwrap();
        assert_eq!(stored.review_history.len(), 1);
        assert!(storage.get_due_cards().unwrap().is_empty());
    }

    #[test]
    fn test_submit_review_unknown_card() {
        let (storage, _temp) = create_test_storage();
        let result = storage.submit_review("missing", 4, 0);
        assert!(matches!(result, Err(FlashcardStorageError::CardNotFound(_))));
    }

    #[test]
    fn test_delete_card() {
        let (storage, _temp) = create_test_storage();
        let card = storage.add_card(new_card("To delete")).unwrap();

        storage.delete_card(&card.id).unwrap();

        assert!(storage.get_card(&card.id).is_err());
        assert!(storage.delete_card(&card.id).is_err());
    }

    #[test]
    fn test_import_replaces_matching_ids() {
        let (storage, temp) = create_test_storage();
        let original = storage.add_card(new_card("Old question")).unwrap();

        let mut edited = original.clone();
        edited.question = "New question".to_string();
        let extra = new_card("Extra");
        let path = temp.path().join("import.json");
        fs::write(&path, serde_json::to_string(&vec![edited, extra]).unwrap()).unwrap();

        assert_eq!(storage.import_cards(&path).unwrap(), 2);

        let cards = storage.list_cards().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(storage.get_card(&original.id).unwrap().question, "New question");
    }

    #[test]
    fn test_export_round_trip() {
        let (storage, temp) = create_test_storage();
        storage.add_cards(vec![new_card("One"), new_card("Two")]).unwrap();

        let path = temp.path().join("export.json");
        assert_eq!(storage.export_cards(&path).unwrap(), 2);

        let other = FlashcardStorage::new(temp.path().join("other"));
        assert_eq!(other.import_cards(&path).unwrap(), 2);
        assert_eq!(other.list_cards().unwrap(), storage.list_cards().unwrap());
    }
}
