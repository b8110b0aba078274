use chrono::{DateTime, Utc};

use crate::config;
use crate::db::{ProgressStore, SharedStore, StoreResult};
use crate::domain::{ProgressKey, ProgressRecord};
use crate::srs::{self, ProgressSummary, WordAnalytics};

#[derive(Clone)]
pub struct ProgressService {
  store: SharedStore,
}

impl ProgressService {
  pub fn new(store: SharedStore) -> Self {
    Self { store }
  }

  pub fn record_answer(&self, user_id: &str, word_id: &str, list_id: &str, is_correct: bool) -> StoreResult<ProgressRecord> {
    self.record_answer_at(user_id, word_id, list_id, is_correct, Utc::now())
  }

  pub fn record_answer_at(
    &self,
    user_id: &str,
    word_id: &str,
    list_id: &str,
    is_correct: bool,
    now: DateTime<Utc>,
  ) -> StoreResult<ProgressRecord> {
    let key = ProgressKey::new(user_id, word_id, list_id);
    let record = self
      .store
      .update_progress(&key, &|existing| srs::schedule_answer(existing, &key, is_correct, now))?;

    tracing::debug!(
      "Progress {}/{}/{}: correct={} repetitions={} interval={}d",
      user_id,
      list_id,
      word_id,
      is_correct,
      record.repetitions,
      record.interval
    );
    Ok(record)
  }

  pub fn progress(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<Vec<ProgressRecord>> {
    self.store.progress_for_user(user_id, list_id)
  }

  pub fn words_due_for_review(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<Vec<ProgressRecord>> {
    self.words_due_for_review_at(user_id, list_id, Utc::now())
  }

  pub fn words_due_for_review_at(
    &self,
    user_id: &str,
    list_id: Option<&str>,
    now: DateTime<Utc>,
  ) -> StoreResult<Vec<ProgressRecord>> {
    Ok(srs::due_records(self.progress(user_id, list_id)?, now))
  }

  /// First record for the word, searching every list unless one is given
  pub fn word_progress(&self, user_id: &str, word_id: &str, list_id: Option<&str>) -> StoreResult<Option<ProgressRecord>> {
    if let Some(list_id) = list_id {
      return self.store.progress_record(&ProgressKey::new(user_id, word_id, list_id));
    }
    Ok(
      self
        .progress(user_id, None)?
        .into_iter()
        .find(|r| r.key.word_id == word_id),
    )
  }

  pub fn is_word_mastered(&self, user_id: &str, word_id: &str, list_id: Option<&str>) -> StoreResult<bool> {
    Ok(
      self
        .word_progress(user_id, word_id, list_id)?
        .is_some_and(|r| r.is_mastered()),
    )
  }

  pub fn mastered_count(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<usize> {
    Ok(self.progress(user_id, list_id)?.iter().filter(|r| r.is_mastered()).count())
  }

  /// Share of correct answers over all records, 0-100
  pub fn success_rate(&self, user_id: &str, list_id: Option<&str>) -> StoreResult<f64> {
    Ok(self.summary_at(user_id, list_id, Utc::now())?.success_rate)
  }

  pub fn summary_at(&self, user_id: &str, list_id: Option<&str>, now: DateTime<Utc>) -> StoreResult<ProgressSummary> {
    Ok(srs::summarize(&self.progress(user_id, list_id)?, now))
  }

  /// Words the student answers wrong more often than `threshold` allows
  pub fn struggling(&self, user_id: &str, list_id: Option<&str>, threshold: Option<f64>) -> StoreResult<Vec<ProgressRecord>> {
    let records = self.progress(user_id, list_id)?;
    let threshold = threshold.unwrap_or(config::STRUGGLING_THRESHOLD);
    Ok(srs::struggling_words(&records, threshold).into_iter().cloned().collect())
  }

  /// Every student's records on a teacher's lists
  pub fn students_progress(&self, list_ids: &[String]) -> StoreResult<Vec<ProgressRecord>> {
    self.store.progress_for_lists(list_ids)
  }

  /// Per-word aggregates over a teacher's lists, hardest words first
  pub fn struggling_words_analytics(&self, list_ids: &[String]) -> StoreResult<Vec<WordAnalytics>> {
    Ok(srs::word_analytics(&self.students_progress(list_ids)?))
  }
}
