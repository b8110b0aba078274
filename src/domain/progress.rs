use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config;

/// Identity of a progress record: one per student, word and list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressKey {
  pub user_id: String,
  pub word_id: String,
  pub list_id: String,
}

impl ProgressKey {
  pub fn new(user_id: &str, word_id: &str, list_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      word_id: word_id.to_string(),
      list_id: list_id.to_string(),
    }
  }
}

/// A student's spaced-repetition state for one word in one list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
  #[serde(flatten)]
  pub key: ProgressKey,
  pub repetitions: i64,
  pub correct_count: i64,
  pub wrong_count: i64,
  pub last_seen: DateTime<Utc>,
  /// None means the word is due immediately
  pub next_review: Option<DateTime<Utc>>,
  /// Days until the next review; always one of `config::SR_INTERVALS`
  pub interval: i64,
}

impl ProgressRecord {
  pub fn attempts(&self) -> i64 {
    self.correct_count + self.wrong_count
  }

  /// Fraction of correct answers, 0.0 when never answered
  pub fn success_rate(&self) -> f64 {
    let attempts = self.attempts();
    if attempts > 0 {
      self.correct_count as f64 / attempts as f64
    } else {
      0.0
    }
  }

  /// Mastered once the schedule reached the longest interval with a high success rate
  pub fn is_mastered(&self) -> bool {
    self.interval >= config::MASTERY_INTERVAL_DAYS
      && self.attempts() > 0
      && self.success_rate() >= config::MASTERY_SUCCESS_RATE
  }

  pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
    match self.next_review {
      Some(next_review) => next_review <= now,
      None => true,
    }
  }
}
