use serde::Serialize;

use crate::config::LEVEL_THRESHOLDS;
use crate::domain::UserGameState;

/// Highest level whose threshold `xp` reaches, 1-indexed
pub fn calculate_level(xp: u32) -> u32 {
  LEVEL_THRESHOLDS
    .iter()
    .rposition(|&threshold| xp >= threshold)
    .map(|index| index as u32 + 1)
    .unwrap_or(1)
}

pub fn max_level() -> u32 {
  LEVEL_THRESHOLDS.len() as u32
}

/// XP still missing for the next level, 0 at the top level
pub fn xp_to_next_level(xp: u32) -> u32 {
  let level = calculate_level(xp);
  if level >= max_level() {
    return 0;
  }
  LEVEL_THRESHOLDS[level as usize] - xp
}

/// Percentage of the way from the current level to the next.
/// The top level has no next threshold and always reports 100.
pub fn level_progress(xp: u32) -> f64 {
  let level = calculate_level(xp);
  if level >= max_level() {
    return 100.0;
  }
  let current = LEVEL_THRESHOLDS[level as usize - 1] as f64;
  let next = LEVEL_THRESHOLDS[level as usize] as f64;
  ((xp as f64 - current) / (next - current) * 100.0).clamp(0.0, 100.0)
}

/// Signalled when an XP gain crosses a level threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelUp {
  pub from: u32,
  pub to: u32,
}

impl UserGameState {
  /// Add earned points to XP and total score, recomputing the level
  pub fn add_points(&mut self, points: u32) -> Option<LevelUp> {
    let previous = self.level;
    self.xp = self.xp.saturating_add(points);
    self.total_score = self.total_score.saturating_add(points);
    self.level = calculate_level(self.xp);

    (self.level > previous).then_some(LevelUp {
      from: previous,
      to: self.level,
    })
  }
}
