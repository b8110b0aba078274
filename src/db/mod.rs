pub mod demo;
pub mod schema;
pub mod sqlite;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::config::StorageBackend;
use crate::domain::{
    ProgressKey, ProgressRecord, TextUnit, TextUnitUpdate, UserGameState, Word, WordList, WordListUpdate,
};
use crate::validation::WordError;

pub use demo::DemoStore;
pub use schema::run_migrations;
pub use sqlite::SqliteStore;

pub type DbPool = Arc<Mutex<Connection>>;

/// List id used for progress on the built-in words
pub const DEFAULT_LIST_ID: &str = "default";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("snapshot file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot format error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid words: {0}")]
    InvalidWords(#[from] WordError),
    #[error("storage unavailable")]
    Unavailable,
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Acquire a store lock, reporting a poisoned mutex as unavailable storage
pub fn try_lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("Store mutex poisoned - a thread panicked while holding the lock");
        StoreError::Unavailable
    })
}

/// Per-student spaced-repetition records
pub trait ProgressStore: Send + Sync {
    /// All records of a student, optionally restricted to one list
    fn progress_for_user(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<Vec<ProgressRecord>>;
    fn progress_record(&self, key: &ProgressKey) -> StoreResult<Option<ProgressRecord>>;
    /// Replace the record for `key` with `update(current)` as one atomic
    /// read-modify-write, returning the stored record
    fn update_progress(
        &self,
        key: &ProgressKey,
        update: &dyn Fn(Option<&ProgressRecord>) -> ProgressRecord,
    ) -> StoreResult<ProgressRecord>;
    /// Records of every student on the given lists
    fn progress_for_lists(&self, list_ids: &[String]) -> StoreResult<Vec<ProgressRecord>>;
}

/// Teacher-authored word lists and text units. Words are normalised and
/// given ids on the way in.
pub trait WordListStore: Send + Sync {
    fn create_word_list(
        &self,
        teacher_id: &str,
        name: &str,
        words: &[Word],
        now: DateTime<Utc>,
    ) -> StoreResult<WordList>;
    fn word_lists(&self, teacher_id: Option<&str>) -> StoreResult<Vec<WordList>>;
    fn word_list(&self, id: &str) -> StoreResult<Option<WordList>>;
    fn update_word_list(&self, id: &str, update: &WordListUpdate) -> StoreResult<WordList>;
    fn delete_word_list(&self, id: &str) -> StoreResult<()>;

    fn create_text_unit(
        &self,
        teacher_id: &str,
        title: &str,
        text: &str,
        words: &[Word],
        now: DateTime<Utc>,
    ) -> StoreResult<TextUnit>;
    fn text_units(&self, teacher_id: Option<&str>) -> StoreResult<Vec<TextUnit>>;
    fn text_unit(&self, id: &str) -> StoreResult<Option<TextUnit>>;
    fn update_text_unit(&self, id: &str, update: &TextUnitUpdate) -> StoreResult<TextUnit>;
    fn delete_text_unit(&self, id: &str) -> StoreResult<()>;
}

/// XP, level and badges per user
pub trait UserStore: Send + Sync {
    /// Stored state, or a fresh level 1 state for unknown users
    fn game_state(&self, user_id: &str) -> StoreResult<UserGameState>;
    fn save_game_state(&self, state: &UserGameState) -> StoreResult<()>;
}

/// Everything the app persists
pub trait Persistence: ProgressStore + WordListStore + UserStore {}

impl<T: ProgressStore + WordListStore + UserStore> Persistence for T {}

pub type SharedStore = Arc<dyn Persistence>;

/// Open the configured backend. Chosen once at startup.
pub fn open_store(backend: &StorageBackend) -> StoreResult<SharedStore> {
    match backend {
        StorageBackend::Demo { snapshot } => {
            let store = match snapshot {
                Some(path) => DemoStore::with_snapshot(path)?,
                None => DemoStore::new(),
            };
            tracing::info!("Using in-memory demo storage (snapshot: {:?})", snapshot);
            Ok(Arc::new(store))
        }
        StorageBackend::Sqlite { path } => {
            let store = SqliteStore::open(path)?;
            tracing::info!("Using SQLite storage at {}", path.display());
            Ok(Arc::new(store))
        }
    }
}

/// Built-in English/Hebrew words used when no list is chosen
pub fn default_words() -> Vec<Word> {
    let words = [
        ("apple", "תפוח", 1),
        ("book", "ספר", 1),
        ("computer", "מחשב", 2),
        ("window", "חלון", 1),
        ("teacher", "מורה", 1),
        ("student", "תלמיד", 1),
        ("beautiful", "יפה", 2),
        ("important", "חשוב", 2),
        ("environment", "סביבה", 3),
        ("knowledge", "ידע", 3),
        ("understand", "להבין", 2),
        ("remember", "לזכור", 2),
        ("difficult", "קשה", 2),
        ("experience", "ניסיון", 3),
        ("communication", "תקשורת", 4),
    ];

    words
        .iter()
        .enumerate()
        .map(|(i, (en, he, difficulty))| Word::new(&(i + 1).to_string(), en, he, *difficulty))
        .collect()
}

/// Store-agnostic checks run against both backends
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use chrono::Duration;

    fn words() -> Vec<Word> {
        vec![
            Word::new("", "apple", "תפוח", 1),
            Word::new("", " big   dog ", "כלב  גדול", 9),
        ]
    }

    fn answer(store: &dyn Persistence, key: &ProgressKey, is_correct: bool, now: DateTime<Utc>) -> ProgressRecord {
        store
            .update_progress(key, &|existing| crate::srs::schedule_answer(existing, key, is_correct, now))
            .unwrap()
    }

    pub fn progress_update_replaces(store: &dyn Persistence) {
        let now = Utc::now();
        let key = ProgressKey::new("s1", "w1", "l1");
        let first = answer(store, &key, true, now);
        assert_eq!(first.repetitions, 1);
        let second = answer(store, &key, true, now + Duration::days(1));

        let all = store.progress_for_user("s1", None).unwrap();
        assert_eq!(all.len(), 1);
        let stored = store.progress_record(&key).unwrap().unwrap();
        assert_eq!(stored.repetitions, 2);
        assert_eq!(stored.interval, 3);
        assert_eq!(stored.correct_count, 2);
        assert_eq!(stored.next_review.map(|t| t.timestamp()), second.next_review.map(|t| t.timestamp()));
    }

    pub fn progress_filters(store: &dyn Persistence) {
        let now = Utc::now();
        for (user, word, list) in [("s1", "w1", "l1"), ("s1", "w2", "l2"), ("s2", "w1", "l1"), ("s3", "w9", "l3")] {
            answer(store, &ProgressKey::new(user, word, list), false, now);
        }

        assert_eq!(store.progress_for_user("s1", None).unwrap().len(), 2);
        assert_eq!(store.progress_for_user("s1", Some("l2")).unwrap().len(), 1);
        assert!(store.progress_for_user("nobody", None).unwrap().is_empty());
        assert!(store.progress_record(&ProgressKey::new("s1", "w1", "l2")).unwrap().is_none());

        let lists = store.progress_for_lists(&["l1".to_string(), "l2".to_string()]).unwrap();
        assert_eq!(lists.len(), 3);
        assert!(store.progress_for_lists(&[]).unwrap().is_empty());
    }

    /// Answers from several threads on one key must all be counted
    pub fn concurrent_updates_serialize(store: &dyn Persistence) {
        let key = ProgressKey::new("s1", "w1", "l1");
        let now = Utc::now();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        answer(store, &key, true, now);
                    }
                });
            }
        });

        let record = store.progress_record(&key).unwrap().unwrap();
        assert_eq!(record.attempts(), 200);
        assert_eq!(record.repetitions, 200);
        assert_eq!(store.progress_for_user("s1", None).unwrap().len(), 1);
    }

    pub fn word_list_lifecycle(store: &dyn Persistence) {
        let now = Utc::now();
        let list = store.create_word_list("t1", " Animals ", &words(), now).unwrap();
        assert_eq!(list.name, "Animals");
        assert_eq!(list.words[1].en, "big dog");
        assert_eq!(list.words[1].he, "כלב גדול");
        assert_eq!(list.words[1].difficulty, 5);
        assert_eq!(list.words[0].id, format!("{}_0", list.id));

        store.create_word_list("t2", "Other", &words(), now).unwrap();
        assert_eq!(store.word_lists(Some("t1")).unwrap().len(), 1);
        assert_eq!(store.word_lists(None).unwrap().len(), 2);

        let update = WordListUpdate {
            name: Some("Pets".to_string()),
            words: None,
        };
        let updated = store.update_word_list(&list.id, &update).unwrap();
        assert_eq!(updated.name, "Pets");
        assert_eq!(updated.words.len(), 2);

        let update = WordListUpdate {
            name: None,
            words: Some(vec![Word::new("cat", "cat", "חתול", 1)]),
        };
        let updated = store.update_word_list(&list.id, &update).unwrap();
        assert_eq!(updated.name, "Pets");
        assert_eq!(updated.words.len(), 1);
        assert_eq!(store.word_list(&list.id).unwrap().unwrap().words[0].id, "cat");

        store.delete_word_list(&list.id).unwrap();
        assert!(store.word_list(&list.id).unwrap().is_none());
        assert!(matches!(store.delete_word_list(&list.id), Err(StoreError::NotFound { .. })));
        assert!(matches!(
            store.update_word_list("missing", &WordListUpdate::default()),
            Err(StoreError::NotFound { .. })
        ));
    }

    pub fn word_list_rejects_invalid(store: &dyn Persistence) {
        let bad = vec![Word::new("", "apple", "  ", 1)];
        let result = store.create_word_list("t1", "Bad", &bad, Utc::now());
        assert!(matches!(result, Err(StoreError::InvalidWords(_))));
        assert!(store.word_lists(None).unwrap().is_empty());
    }

    pub fn text_unit_lifecycle(store: &dyn Persistence) {
        let now = Utc::now();
        let unit = store
            .create_text_unit("t1", "Morning", "I eat an apple. The dog sleeps.", &words(), now)
            .unwrap();
        assert_eq!(unit.words.len(), 2);
        assert_eq!(store.text_units(Some("t1")).unwrap().len(), 1);
        assert!(store.text_units(Some("t2")).unwrap().is_empty());
        assert_eq!(store.text_unit(&unit.id).unwrap().unwrap().title, "Morning");

        let update = TextUnitUpdate {
            title: Some(" Evening ".to_string()),
            text: None,
            words: Some(vec![Word::new("", "sun", "שמש", 1)]),
        };
        let updated = store.update_text_unit(&unit.id, &update).unwrap();
        assert_eq!(updated.title, "Evening");
        assert_eq!(updated.text, unit.text);
        assert_eq!(updated.words.len(), 1);
        assert_eq!(updated.words[0].id, format!("{}_0", unit.id));
        assert_eq!(store.text_unit(&unit.id).unwrap().unwrap(), updated);

        let bad = TextUnitUpdate {
            title: Some("Broken".to_string()),
            words: Some(vec![Word::new("", "", "x", 1)]),
            ..Default::default()
        };
        assert!(matches!(store.update_text_unit(&unit.id, &bad), Err(StoreError::InvalidWords(_))));
        assert_eq!(store.text_unit(&unit.id).unwrap().unwrap().title, "Evening");
        assert!(matches!(
            store.update_text_unit("missing", &TextUnitUpdate::default()),
            Err(StoreError::NotFound { .. })
        ));

        store.delete_text_unit(&unit.id).unwrap();
        assert!(store.text_unit(&unit.id).unwrap().is_none());
        assert!(matches!(store.delete_text_unit(&unit.id), Err(StoreError::NotFound { .. })));
    }

    pub fn game_state_roundtrip(store: &dyn Persistence) {
        let fresh = store.game_state("u1").unwrap();
        assert_eq!(fresh, UserGameState::new("u1"));

        let mut state = fresh;
        state.add_points(150);
        state.award(crate::domain::Badge::FirstSteps);
        store.save_game_state(&state).unwrap();

        state.add_points(10);
        store.save_game_state(&state).unwrap();

        let loaded = store.game_state("u1").unwrap();
        assert_eq!(loaded.xp, 160);
        assert_eq!(loaded.level, 2);
        assert!(loaded.has_badge(crate::domain::Badge::FirstSteps));
    }
}
