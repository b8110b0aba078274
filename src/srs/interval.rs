use chrono::{DateTime, Duration, Utc};

use crate::config::SR_INTERVALS;
use crate::domain::{ProgressKey, ProgressRecord};

/// Interval in days after `repetitions` consecutive correct answers.
/// Repetitions past the table length stay on the last interval.
pub fn interval_for_repetitions(repetitions: i64) -> i64 {
  let last = SR_INTERVALS.len() - 1;
  let index = (repetitions - 1).clamp(0, last as i64) as usize;
  SR_INTERVALS[index]
}

/// Compute the record after answering a word.
///
/// A first answer always starts the schedule at one repetition and a one day
/// interval, whatever its correctness. Afterwards a correct answer climbs
/// one step of `SR_INTERVALS`, a wrong answer drops back to the start.
pub fn schedule_answer(
  existing: Option<&ProgressRecord>,
  key: &ProgressKey,
  is_correct: bool,
  now: DateTime<Utc>,
) -> ProgressRecord {
  let Some(previous) = existing else {
    return ProgressRecord {
      key: key.clone(),
      repetitions: 1,
      correct_count: if is_correct { 1 } else { 0 },
      wrong_count: if is_correct { 0 } else { 1 },
      last_seen: now,
      next_review: Some(now + Duration::days(SR_INTERVALS[0])),
      interval: SR_INTERVALS[0],
    };
  };

  let (repetitions, interval) = if is_correct {
    let repetitions = previous.repetitions + 1;
    (repetitions, interval_for_repetitions(repetitions))
  } else {
    (0, SR_INTERVALS[0])
  };

  ProgressRecord {
    key: key.clone(),
    repetitions,
    correct_count: previous.correct_count + if is_correct { 1 } else { 0 },
    wrong_count: previous.wrong_count + if is_correct { 0 } else { 1 },
    last_seen: now,
    next_review: Some(now + Duration::days(interval)),
    interval,
  }
}
