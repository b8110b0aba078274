use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config;

/// Points for a correct answer before the streak bonus
pub fn base_points(difficulty: u8) -> u32 {
  match difficulty {
    1..=5 => config::POINTS_BY_DIFFICULTY[difficulty as usize - 1],
    _ => config::DEFAULT_POINTS,
  }
}

/// Points for a correct answer given the streak built so far
pub fn calculate_points(difficulty: u8, streak: u32) -> u32 {
  let bonus = streak
    .saturating_mul(config::STREAK_BONUS_PER_ANSWER)
    .min(config::MAX_STREAK_BONUS);
  base_points(difficulty) + bonus
}

/// Score of one practice session. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionScore {
  pub correct: u32,
  pub wrong: u32,
  /// Consecutive correct answers; any wrong answer resets it
  pub streak: u32,
  pub points: u32,
  pub start_time: Option<DateTime<Utc>>,
}

impl SessionScore {
  pub fn started_at(now: DateTime<Utc>) -> Self {
    Self {
      start_time: Some(now),
      ..Self::default()
    }
  }

  /// Score a correct answer and return the points it earned
  pub fn record_correct(&mut self, difficulty: u8) -> u32 {
    let points = calculate_points(difficulty, self.streak);
    self.correct += 1;
    self.streak += 1;
    self.points += points;
    points
  }

  pub fn record_wrong(&mut self) {
    self.wrong += 1;
    self.streak = 0;
  }

  pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> Option<f64> {
    self
      .start_time
      .map(|start| (now - start).num_milliseconds() as f64 / 1000.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn test_base_points_table() {
    assert_eq!(base_points(1), 10);
    assert_eq!(base_points(3), 30);
    assert_eq!(base_points(5), 50);
  }

  #[test]
  fn test_base_points_unknown_difficulty() {
    assert_eq!(base_points(0), 10);
    assert_eq!(base_points(6), 10);
  }

  #[test]
  fn test_calculate_points_formula() {
    for difficulty in 1..=5u8 {
      for streak in 0..30u32 {
        let expected = base_points(difficulty) + (streak * 2).min(20);
        assert_eq!(calculate_points(difficulty, streak), expected);
      }
    }
  }

  #[test]
  fn test_streak_bonus_capped() {
    assert_eq!(calculate_points(1, 10), 30);
    assert_eq!(calculate_points(1, 1000), 30);
    assert_eq!(calculate_points(1, u32::MAX), 30);
  }

  #[test]
  fn test_record_correct_uses_streak_before_increment() {
    let mut score = SessionScore::started_at(Utc::now());
    assert_eq!(score.record_correct(1), 10);
    assert_eq!(score.record_correct(1), 12);
    assert_eq!(score.record_correct(2), 24);
    assert_eq!(score.streak, 3);
    assert_eq!(score.points, 46);
  }

  #[test]
  fn test_record_wrong_resets_streak() {
    let mut score = SessionScore::default();
    score.record_correct(1);
    score.record_correct(1);
    score.record_wrong();
    assert_eq!(score.streak, 0);
    assert_eq!(score.correct, 2);
    assert_eq!(score.wrong, 1);
    assert_eq!(score.record_correct(1), 10);
  }

  #[test]
  fn test_elapsed_seconds() {
    let start = Utc::now();
    let score = SessionScore::started_at(start);
    assert_eq!(score.elapsed_seconds(start + Duration::milliseconds(1500)), Some(1.5));
    assert_eq!(SessionScore::default().elapsed_seconds(start), None);
  }
}
