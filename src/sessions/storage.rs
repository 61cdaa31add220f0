use std::fs;
use std::path::PathBuf;

use super::models::*;
use crate::storage::StorageError;

type Result<T> = std::result::Result<T, StorageError>;

/// Storage for learning sessions (one JSON file per session)
pub struct SessionStorage {
    sessions_dir: PathBuf,
}

impl SessionStorage {
    /// Create a new session storage, creating the directory if needed
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        let sessions_dir = data_dir.join("sessions");
        fs::create_dir_all(&sessions_dir)?;
        Ok(Self { sessions_dir })
    }

    /// Get the file path for a session. Ids must be a plain file stem.
    fn session_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidSessionId(id.to_string()));
        }
        Ok(self.sessions_dir.join(format!("{}.json", id)))
    }

    /// Save a session using atomic write (write to .tmp then rename)
    pub fn save_session(&self, session: &LearningSession) -> Result<()> {
        let path = self.session_path(&session.id)?;
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load a full session by ID
    pub fn get_session(&self, id: &str) -> Result<LearningSession> {
        let path = self.session_path(id)?;
        if !path.exists() {
            return Err(StorageError::SessionNotFound(id.to_string()));
        }
        let content = fs::read_to_string(path)?;
        let session: LearningSession = serde_json::from_str(&content)?;
        Ok(session)
    }

    /// Load every session, most recently updated first.
    /// Unreadable files are skipped with a warning.
    pub fn list_sessions(&self) -> Result<Vec<LearningSession>> {
        let mut sessions = Vec::new();

        if !self.sessions_dir.exists() {
            return Ok(sessions);
        }

        for entry in fs::read_dir(&self.sessions_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match fs::read_to_string(&path)
                    .map_err(StorageError::from)
                    .and_then(|content| Ok(serde_json::from_str::<LearningSession>(&content)?))
                {
                    Ok(session) => sessions.push(session),
                    Err(e) => log::warn!("Skipping unreadable session {:?}: {}", path, e),
                }
            }
        }

        // Sort by updated_at descending (most recent first)
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// List all sessions as lightweight summaries
    pub fn list_summaries(&self) -> Result<Vec<SessionSummary>> {
        Ok(self.list_sessions()?.iter().map(SessionSummary::from).collect())
    }

    /// Delete a session
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let path = self.session_path(id)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (SessionStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(temp_dir.path().to_path_buf()).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_save_and_get_session() {
        let (storage, _temp) = create_test_storage();
        let mut session = LearningSession::new("Rust lifetimes".to_string());
        session.messages.push(SessionMessage::new("user", "What is 'a?", Utc::now()));

        storage.save_session(&session).unwrap();
        let loaded = storage.get_session(&session.id).unwrap();

        assert_eq!(loaded.title, "Rust lifetimes");
        assert_eq!(loaded.messages.len(), 1);
    }

    #[test]
    fn test_list_sessions_most_recent_first() {
        let (storage, _temp) = create_test_storage();
        let mut older = LearningSession::new("Older".to_string());
        older.updated_at = Utc::now() - Duration::days(2);
        let newer = LearningSession::new("Newer".to_string());

        storage.save_session(&older).unwrap();
        storage.save_session(&newer).unwrap();

        let titles: Vec<String> =
            storage.list_summaries().unwrap().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
    }

    #[test]
    fn test_missing_session_and_delete() {
        let (storage, _temp) = create_test_storage();
        assert!(matches!(
            storage.get_session("nope"),
            Err(StorageError::SessionNotFound(_))
        ));

        let session = LearningSession::new("Temp".to_string());
        storage.save_session(&session).unwrap();
        storage.delete_session(&session.id).unwrap();
        assert!(storage.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_ids_cannot_leave_sessions_dir() {
        let (storage, temp) = create_test_storage();
        let cards_path = temp.path().join("cards.json");
        fs::write(&cards_path, "[]").unwrap();

        for id in ["../cards", "..", "", "a/b", "a\\b", ".hidden"] {
            assert!(matches!(
                storage.delete_session(id),
                Err(StorageError::InvalidSessionId(_))
            ));
            assert!(matches!(
                storage.get_session(id),
                Err(StorageError::InvalidSessionId(_))
            ));
        }
        assert!(cards_path.exists());

        let mut session = LearningSession::new("Escape".to_string());
        session.id = "../x".to_string();
        assert!(matches!(
            storage.save_session(&session),
            Err(StorageError::InvalidSessionId(_))
        ));
        assert!(!temp.path().join("x.json").exists());
    }
}
