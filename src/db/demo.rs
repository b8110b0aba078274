//! In-memory storage for demos and local use, optionally mirrored to a JSON
//! snapshot file so data survives a restart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{ProgressStore, StoreError, StoreResult, UserStore, WordListStore, try_lock};
use crate::domain::{
  ProgressKey, ProgressRecord, TextUnit, TextUnitUpdate, UserGameState, Word, WordList, WordListUpdate,
};
use crate::validation::{normalize_text, normalize_words};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DemoData {
  #[serde(default)]
  next_id: u64,
  #[serde(default)]
  word_lists: Vec<WordList>,
  #[serde(default)]
  text_units: Vec<TextUnit>,
  #[serde(default)]
  progress: Vec<ProgressRecord>,
  #[serde(default)]
  game_states: BTreeMap<String, UserGameState>,
}

impl DemoData {
  fn next_id(&mut self, prefix: &str) -> String {
    self.next_id += 1;
    format!("{}_{}", prefix, self.next_id)
  }
}

pub struct DemoStore {
  data: Mutex<DemoData>,
  snapshot: Option<PathBuf>,
}

impl Default for DemoStore {
  fn default() -> Self {
    Self::new()
  }
}

impl DemoStore {
  /// Empty store that lives only in memory
  pub fn new() -> Self {
    Self {
      data: Mutex::new(DemoData::default()),
      snapshot: None,
    }
  }

  /// Store backed by a snapshot file, loaded now if it exists and rewritten
  /// after every change
  pub fn with_snapshot(path: &Path) -> StoreResult<Self> {
    let data = if path.exists() {
      let raw = std::fs::read_to_string(path)?;
      let data: DemoData = serde_json::from_str(&raw)?;
      tracing::debug!(
        "Loaded demo snapshot: {} lists, {} progress records",
        data.word_lists.len(),
        data.progress.len()
      );
      data
    } else {
      DemoData::default()
    };

    Ok(Self {
      data: Mutex::new(data),
      snapshot: Some(path.to_path_buf()),
    })
  }

  fn save(&self, data: &DemoData) -> StoreResult<()> {
    let Some(path) = &self.snapshot else {
      return Ok(());
    };
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(data)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
  }

  /// Apply a change to a copy, persist it, then publish it. A failed change
  /// or snapshot write leaves the visible data untouched.
  fn mutate<T>(&self, change: impl FnOnce(&mut DemoData) -> StoreResult<T>) -> StoreResult<T> {
    let mut data = try_lock(&self.data)?;
    let mut staged = data.clone();
    let result = change(&mut staged)?;
    self.save(&staged)?;
    *data = staged;
    Ok(result)
  }
}

impl ProgressStore for DemoStore {
  fn progress_for_user(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<Vec<ProgressRecord>> {
    let data = try_lock(&self.data)?;
    Ok(
      data
        .progress
        .iter()
        .filter(|r| r.key.user_id == user_id && list_id.is_none_or(|l| r.key.list_id == l))
        .cloned()
        .collect(),
    )
  }

  fn progress_record(&self, key: &ProgressKey) -> StoreResult<Option<ProgressRecord>> {
    let data = try_lock(&self.data)?;
    Ok(data.progress.iter().find(|r| &r.key == key).cloned())
  }

  fn update_progress(
    &self,
    key: &ProgressKey,
    update: &dyn Fn(Option<&ProgressRecord>) -> ProgressRecord,
  ) -> StoreResult<ProgressRecord> {
    self.mutate(|data| {
      let record = match data.progress.iter_mut().find(|r| &r.key == key) {
        Some(existing) => {
          let next = update(Some(&*existing));
          *existing = next.clone();
          next
        }
        None => {
          let record = update(None);
          data.progress.push(record.clone());
          record
        }
      };
      Ok(record)
    })
  }

  fn progress_for_lists(&self, list_ids: &[String]) -> StoreResult<Vec<ProgressRecord>> {
    let data = try_lock(&self.data)?;
    Ok(
      data
        .progress
        .iter()
        .filter(|r| list_ids.contains(&r.key.list_id))
        .cloned()
        .collect(),
    )
  }
}

impl WordListStore for DemoStore {
  fn create_word_list(
    &self,
    teacher_id: &str,
    name: &str,
    words: &[Word],
    now: DateTime<Utc>,
  ) -> StoreResult<WordList> {
    self.mutate(|data| {
      let id = data.next_id("list");
      let list = WordList {
        words: normalize_words(words, &id)?,
        id,
        teacher_id: teacher_id.to_string(),
        name: normalize_text(name),
        created_at: now,
      };
      data.word_lists.push(list.clone());
      Ok(list)
    })
  }

  fn word_lists(&self, teacher_id: Option<&str>) -> StoreResult<Vec<WordList>> {
    let data = try_lock(&self.data)?;
    Ok(
      data
        .word_lists
        .iter()
        .filter(|l| teacher_id.is_none_or(|t| l.teacher_id == t))
        .cloned()
        .collect(),
    )
  }

  fn word_list(&self, id: &str) -> StoreResult<Option<WordList>> {
    let data = try_lock(&self.data)?;
    Ok(data.word_lists.iter().find(|l| l.id == id).cloned())
  }

  fn update_word_list(&self, id: &str, update: &WordListUpdate) -> StoreResult<WordList> {
    self.mutate(|data| {
      let list = data
        .word_lists
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or_else(|| StoreError::not_found("word list", id))?;
      if let Some(words) = &update.words {
        list.words = normalize_words(words, id)?;
      }
      if let Some(name) = &update.name {
        list.name = normalize_text(name);
      }
      Ok(list.clone())
    })
  }

  fn delete_word_list(&self, id: &str) -> StoreResult<()> {
    self.mutate(|data| {
      let before = data.word_lists.len();
      data.word_lists.retain(|l| l.id != id);
      if data.word_lists.len() == before {
        return Err(StoreError::not_found("word list", id));
      }
      Ok(())
    })
  }

  fn create_text_unit(
    &self,
    teacher_id: &str,
    title: &str,
    text: &str,
    words: &[Word],
    now: DateTime<Utc>,
  ) -> StoreResult<TextUnit> {
    self.mutate(|data| {
      let id = data.next_id("unit");
      let unit = TextUnit {
        words: normalize_words(words, &id)?,
        id,
        teacher_id: teacher_id.to_string(),
        title: normalize_text(title),
        text: text.trim().to_string(),
        created_at: now,
      };
      data.text_units.push(unit.clone());
      Ok(unit)
    })
  }

  fn text_units(&self, teacher_id: Option<&str>) -> StoreResult<Vec<TextUnit>> {
    let data = try_lock(&self.data)?;
    Ok(
      data
        .text_units
        .iter()
        .filter(|u| teacher_id.is_none_or(|t| u.teacher_id == t))
        .cloned()
        .collect(),
    )
  }

  fn text_unit(&self, id: &str) -> StoreResult<Option<TextUnit>> {
    let data = try_lock(&self.data)?;
    Ok(data.text_units.iter().find(|u| u.id == id).cloned())
  }

  fn update_text_unit(&self, id: &str, update: &TextUnitUpdate) -> StoreResult<TextUnit> {
    self.mutate(|data| {
      let unit = data
        .text_units
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| StoreError::not_found("text unit", id))?;
      if let Some(words) = &update.words {
        unit.words = normalize_words(words, id)?;
      }
      if let Some(title) = &update.title {
        unit.title = normalize_text(title);
      }
      if let Some(text) = &update.text {
        unit.text = text.trim().to_string();
      }
      Ok(unit.clone())
    })
  }

  fn delete_text_unit(&self, id: &str) -> StoreResult<()> {
    self.mutate(|data| {
      let before = data.text_units.len();
      data.text_units.retain(|u| u.id != id);
      if data.text_units.len() == before {
        return Err(StoreError::not_found("text unit", id));
      }
      Ok(())
    })
  }
}

impl UserStore for DemoStore {
  fn game_state(&self, user_id: &str) -> StoreResult<UserGameState> {
    let data = try_lock(&self.data)?;
    Ok(
      data
        .game_states
        .get(user_id)
        .cloned()
        .unwrap_or_else(|| UserGameState::new(user_id)),
    )
  }

  fn save_game_state(&self, state: &UserGameState) -> StoreResult<()> {
    self.mutate(|data| {
      data.game_states.insert(state.user_id.clone(), state.clone());
      Ok(())
    })
  }
}
