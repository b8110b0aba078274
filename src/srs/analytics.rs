//! Read-only reporting over progress records: mastery counts, due words,
//! struggling words for a student and per-word aggregates for teachers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config;
use crate::domain::ProgressRecord;

/// Records whose next review is at or before `now`
pub fn due_records(records: Vec<ProgressRecord>, now: DateTime<Utc>) -> Vec<ProgressRecord> {
  records.into_iter().filter(|r| r.is_due_at(now)).collect()
}

/// Words a student keeps getting wrong (needs a few attempts before judging)
pub fn struggling_words(records: &[ProgressRecord], threshold: f64) -> Vec<&ProgressRecord> {
  records
    .iter()
    .filter(|r| r.attempts() >= config::STRUGGLING_MIN_ATTEMPTS && r.success_rate() < threshold)
    .collect()
}

/// Overview of one student's records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
  pub words_seen: usize,
  pub mastered: usize,
  pub due: usize,
  /// 0-100 over all answers, 0 when nothing was answered
  pub success_rate: f64,
}

pub fn summarize(records: &[ProgressRecord], now: DateTime<Utc>) -> ProgressSummary {
  let (correct, wrong) = records
    .iter()
    .fold((0, 0), |(c, w), r| (c + r.correct_count, w + r.wrong_count));
  let attempts = correct + wrong;

  ProgressSummary {
    words_seen: records.len(),
    mastered: records.iter().filter(|r| r.is_mastered()).count(),
    due: records.iter().filter(|r| r.is_due_at(now)).count(),
    success_rate: if attempts > 0 {
      correct as f64 / attempts as f64 * 100.0
    } else {
      0.0
    },
  }
}

/// Per-word aggregate across all students of a teacher's lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordAnalytics {
  pub word_id: String,
  pub list_id: String,
  pub total_attempts: i64,
  pub total_correct: i64,
  pub total_wrong: i64,
  pub student_count: usize,
  pub success_rate: f64,
}

/// Aggregate records per word, keep words with enough attempts, hardest first
pub fn word_analytics(records: &[ProgressRecord]) -> Vec<WordAnalytics> {
  let mut by_word: BTreeMap<(&str, &str), WordAnalytics> = BTreeMap::new();

  for record in records {
    let entry = by_word
      .entry((record.key.list_id.as_str(), record.key.word_id.as_str()))
      .or_insert_with(|| WordAnalytics {
        word_id: record.key.word_id.clone(),
        list_id: record.key.list_id.clone(),
        total_attempts: 0,
        total_correct: 0,
        total_wrong: 0,
        student_count: 0,
        success_rate: 0.0,
      });
    entry.total_attempts += record.attempts();
    entry.total_correct += record.correct_count;
    entry.total_wrong += record.wrong_count;
    entry.student_count += 1;
  }

  let mut words: Vec<WordAnalytics> = by_word
    .into_values()
    .filter(|w| w.total_attempts >= config::ANALYTICS_MIN_ATTEMPTS)
    .map(|mut w| {
      w.success_rate = w.total_correct as f64 / w.total_attempts as f64;
      w
    })
    .collect();

  words.sort_by(|a, b| a.success_rate.total_cmp(&b.success_rate));
  words
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ProgressKey;
  use chrono::Duration;

  fn record(user: &str, word: &str, correct: i64, wrong: i64, interval: i64) -> ProgressRecord {
    ProgressRecord {
      key: ProgressKey::new(user, word, "list1"),
      repetitions: 1,
      correct_count: correct,
      wrong_count: wrong,
      last_seen: Utc::now(),
      next_review: None,
      interval,
    }
  }

  #[test]
  fn test_due_records_filters_future() {
    let now = Utc::now();
    let mut later = record("u", "a", 1, 0, 1);
    later.next_review = Some(now + Duration::days(1));
    let mut earlier = record("u", "b", 1, 0, 1);
    earlier.next_review = Some(now - Duration::hours(1));
    let unscheduled = record("u", "c", 0, 1, 1);

    let due = due_records(vec![later, earlier, unscheduled], now);
    let ids: Vec<&str> = due.iter().map(|r| r.key.word_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
  }

  #[test]
  fn test_struggling_words_needs_min_attempts() {
    let records = vec![
      record("u", "few", 0, 2, 1),
      record("u", "hard", 1, 3, 1),
      record("u", "easy", 3, 1, 1),
    ];
    let struggling = struggling_words(&records, config::STRUGGLING_THRESHOLD);
    assert_eq!(struggling.len(), 1);
    assert_eq!(struggling[0].key.word_id, "hard");
  }

  #[test]
  fn test_summarize_counts() {
    let records = vec![record("u", "a", 9, 1, 30), record("u", "b", 1, 1, 3)];
    let summary = summarize(&records, Utc::now());
    assert_eq!(summary.words_seen, 2);
    assert_eq!(summary.mastered, 1);
    assert_eq!(summary.due, 2);
    assert!((summary.success_rate - 10.0 / 12.0 * 100.0).abs() < 1e-9);
  }

  #[test]
  fn test_summarize_empty() {
    let summary = summarize(&[], Utc::now());
    assert_eq!(summary.words_seen, 0);
    assert_eq!(summary.success_rate, 0.0);
  }

  #[test]
  fn test_word_analytics_aggregates_students() {
    let records = vec![
      record("alice", "apple", 2, 2, 1),
      record("bob", "apple", 1, 1, 1),
      record("alice", "book", 5, 0, 7),
      record("alice", "rare", 1, 1, 1),
    ];
    let words = word_analytics(&records);

    // "rare" has only 2 attempts and is dropped
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].word_id, "apple");
    assert_eq!(words[0].total_attempts, 6);
    assert_eq!(words[0].student_count, 2);
    assert!((words[0].success_rate - 0.5).abs() < 1e-9);
    assert_eq!(words[1].word_id, "book");
    assert_eq!(words[1].success_rate, 1.0);
  }
}
