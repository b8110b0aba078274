use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config;

/// Presentation of a practice question. The state machine is the same for
/// every kind; kinds only differ in timing and whether the prompt is spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  /// English word, pick the translation
  #[default]
  Matching,
  /// Picture prompt, pick the translation
  Visual,
  /// Spoken prompt, pick the translation
  Audio,
  /// Example sentence with the word, pick the translation
  Sentence,
}

impl ExerciseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Matching => "matching",
      Self::Visual => "visual",
      Self::Audio => "audio",
      Self::Sentence => "sentence",
    }
  }

  /// Delay before a correct answer advances, for kinds whose positive
  /// feedback must render first
  pub fn advance_delay(&self) -> Option<Duration> {
    match self {
      Self::Audio | Self::Sentence => Some(Duration::from_millis(config::DELAYED_ADVANCE_MS)),
      Self::Matching | Self::Visual => None,
    }
  }

  pub fn speaks_prompt(&self) -> bool {
    matches!(self, Self::Audio)
  }
}
