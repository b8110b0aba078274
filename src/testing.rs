//! Test utilities for store setup and word fixtures.
//!
//! Reuses the authoritative schema initialization so tests never carry a
//! copy of the schema.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::db::{SqliteStore, StoreResult};
use crate::domain::Word;

/// Test environment with a migrated SQLite store in a temporary directory.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub store: SqliteStore,
}

impl TestEnv {
    pub fn new() -> StoreResult<Self> {
        let temp = TempDir::new()?;
        let store = SqliteStore::open(&temp.path().join("vocab.db"))?;
        Ok(Self { temp, store })
    }

    pub fn db_path(&self) -> PathBuf {
        self.temp.path().join("vocab.db")
    }
}

/// Two words with distinct translations
pub fn apple_book() -> Vec<Word> {
    vec![Word::new("1", "apple", "תפוח", 1), Word::new("2", "book", "ספר", 1)]
}

/// `count` words with difficulty cycling 1..=5
pub fn numbered_words(count: usize) -> Vec<Word> {
    (0..count)
        .map(|i| {
            Word::new(
                &format!("w{}", i),
                &format!("word{}", i),
                &format!("מילה{}", i),
                (i % 5) as u8 + 1,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::WordListStore;

    #[test]
    fn test_env_creates_migrated_store() {
        let env = TestEnv::new().unwrap();
        assert!(env.db_path().exists());
        assert!(env.store.word_lists(None).unwrap().is_empty());
    }

    #[test]
    fn test_numbered_words_are_distinct() {
        let words = numbered_words(12);
        let mut translations: Vec<&str> = words.iter().map(|w| w.he.as_str()).collect();
        translations.sort();
        translations.dedup();
        assert_eq!(translations.len(), 12);
        assert_eq!(words[4].difficulty, 5);
        assert_eq!(words[5].difficulty, 1);
    }
}
