//! Badge rules evaluated at the end of a practice session.
//!
//! Only `first_steps`, `perfect_round` and `speed_demon` have rules.
//! `word_master`, `streak_star` and `story_creator` are declared in
//! [`Badge`] but nothing awards them yet.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::SessionScore;
use crate::config;
use crate::domain::{Badge, UserGameState};

/// Badges the finished session earns that are not already held
pub fn evaluate_badges(
  score: &SessionScore,
  earned: &BTreeSet<Badge>,
  now: DateTime<Utc>,
) -> Vec<Badge> {
  let mut new_badges = Vec::new();

  if !earned.contains(&Badge::FirstSteps) && score.correct > 0 {
    new_badges.push(Badge::FirstSteps);
  }

  if !earned.contains(&Badge::PerfectRound)
    && score.correct >= config::BADGE_ROUND_SIZE
    && score.wrong == 0
  {
    new_badges.push(Badge::PerfectRound);
  }

  if !earned.contains(&Badge::SpeedDemon) && score.correct >= config::BADGE_ROUND_SIZE {
    let fast = score
      .elapsed_seconds(now)
      .is_some_and(|elapsed| elapsed < config::SPEED_DEMON_SECONDS as f64);
    if fast {
      new_badges.push(Badge::SpeedDemon);
    }
  }

  new_badges
}

impl UserGameState {
  /// Add a badge; returns false when it was already held
  pub fn award(&mut self, badge: Badge) -> bool {
    self.badges.insert(badge)
  }

  /// Evaluate and add session badges, returning only the newly awarded ones
  pub fn award_session_badges(&mut self, score: &SessionScore, now: DateTime<Utc>) -> Vec<Badge> {
    evaluate_badges(score, &self.badges, now)
      .into_iter()
      .filter(|&badge| self.award(badge))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn score(correct: u32, wrong: u32, start: DateTime<Utc>) -> SessionScore {
    SessionScore {
      correct,
      wrong,
      streak: 0,
      points: 0,
      start_time: Some(start),
    }
  }

  #[test]
  fn test_no_badges_without_correct_answers() {
    let now = Utc::now();
    assert!(evaluate_badges(&score(0, 3, now), &BTreeSet::new(), now).is_empty());
  }

  #[test]
  fn test_first_steps() {
    let now = Utc::now();
    let badges = evaluate_badges(&score(1, 5, now - Duration::minutes(5)), &BTreeSet::new(), now);
    assert_eq!(badges, vec![Badge::FirstSteps]);
  }

  #[test]
  fn test_perfect_round_needs_ten_and_no_mistakes() {
    let now = Utc::now();
    let start = now - Duration::minutes(2);
    let earned = BTreeSet::from([Badge::FirstSteps]);
    assert_eq!(evaluate_badges(&score(10, 0, start), &earned, now), vec![Badge::PerfectRound]);
    assert!(evaluate_badges(&score(10, 1, start), &earned, now).is_empty());
    assert!(evaluate_badges(&score(9, 0, start), &earned, now).is_empty());
  }

  #[test]
  fn test_speed_demon_under_thirty_seconds() {
    let now = Utc::now();
    let earned = BTreeSet::from([Badge::FirstSteps, Badge::PerfectRound]);
    let quick = score(10, 2, now - Duration::seconds(29));
    assert_eq!(evaluate_badges(&quick, &earned, now), vec![Badge::SpeedDemon]);
    let slow = score(10, 2, now - Duration::seconds(30));
    assert!(evaluate_badges(&slow, &earned, now).is_empty());
  }

  #[test]
  fn test_speed_demon_requires_start_time() {
    let now = Utc::now();
    let mut s = score(12, 0, now);
    s.start_time = None;
    let badges = evaluate_badges(&s, &BTreeSet::new(), now);
    assert_eq!(badges, vec![Badge::FirstSteps, Badge::PerfectRound]);
  }

  #[test]
  fn test_all_three_in_one_session() {
    let now = Utc::now();
    let badges = evaluate_badges(&score(10, 0, now - Duration::seconds(10)), &BTreeSet::new(), now);
    assert_eq!(badges, vec![Badge::FirstSteps, Badge::PerfectRound, Badge::SpeedDemon]);
  }

  #[test]
  fn test_award_session_badges_is_monotonic() {
    let now = Utc::now();
    let mut state = UserGameState::new("u1");
    let first = state.award_session_badges(&score(10, 0, now - Duration::seconds(5)), now);
    assert_eq!(first.len(), 3);

    // A worse session never revokes or re-awards
    let second = state.award_session_badges(&score(1, 9, now - Duration::minutes(9)), now);
    assert!(second.is_empty());
    assert_eq!(state.badges.len(), 3);
  }

  #[test]
  fn test_inactive_badges_never_awarded() {
    let now = Utc::now();
    let badges = evaluate_badges(&score(50, 0, now - Duration::seconds(1)), &BTreeSet::new(), now);
    assert!(!badges.contains(&Badge::WordMaster));
    assert!(!badges.contains(&Badge::StreakStar));
    assert!(!badges.contains(&Badge::StoryCreator));
  }
}
