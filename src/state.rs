//! Application state shared by all handlers.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config;
use crate::db::SharedStore;
use crate::practice::PracticeRun;
use crate::services::{
    DictionaryTranslator, ProgressService, SilentSpeech, SpeechOutput, StoryGenerator, TemplateStories, Translator,
};

/// Practice runs in flight, keyed by run id
pub type RunRegistry = Arc<Mutex<PracticeRuns>>;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub progress: ProgressService,
    pub runs: RunRegistry,
    pub translator: Arc<dyn Translator>,
    pub speech: Arc<dyn SpeechOutput>,
    pub stories: Arc<dyn StoryGenerator>,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            progress: ProgressService::new(store.clone()),
            store,
            runs: Arc::new(Mutex::new(PracticeRuns::default())),
            translator: Arc::new(DictionaryTranslator::new()),
            speech: Arc::new(SilentSpeech),
            stories: Arc::new(TemplateStories::new()),
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = speech;
        self
    }
}

struct RunEntry {
    run: PracticeRun,
    last_active: DateTime<Utc>,
}

/// Runs idle for longer than `PRACTICE_RUN_EXPIRY_HOURS` are dropped
#[derive(Default)]
pub struct PracticeRuns {
    next_id: u64,
    runs: HashMap<String, RunEntry>,
}

impl PracticeRuns {
    pub fn insert(&mut self, run: PracticeRun, now: DateTime<Utc>) -> String {
        self.purge_expired(now);
        self.next_id += 1;
        let id = format!("run_{}", self.next_id);
        self.runs.insert(id.clone(), RunEntry { run, last_active: now });
        id
    }

    /// Run by id, marking it active
    pub fn get_mut(&mut self, id: &str, now: DateTime<Utc>) -> Option<&mut PracticeRun> {
        let entry = self.runs.get_mut(id)?;
        entry.last_active = now;
        Some(&mut entry.run)
    }

    /// Run by id for a timer callback; does not count as activity
    pub fn get_for_timer(&mut self, id: &str) -> Option<&mut PracticeRun> {
        self.runs.get_mut(id).map(|entry| &mut entry.run)
    }

    pub fn remove(&mut self, id: &str) -> Option<PracticeRun> {
        self.runs.remove(id).map(|mut entry| {
            entry.run.teardown();
            entry.run
        })
    }

    /// Drop idle runs, returning how many went
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::hours(config::PRACTICE_RUN_EXPIRY_HOURS);
        let before = self.runs.len();
        self.runs.retain(|_, entry| {
            let keep = entry.last_active > cutoff;
            if !keep {
                entry.run.teardown();
            }
            keep
        });
        let purged = before - self.runs.len();
        if purged > 0 {
            tracing::debug!("Purged {} idle practice runs", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
