use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Achievement badges. Only some are awarded by rules; the rest are
/// declared so stored badge ids round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
  FirstSteps,
  WordMaster,
  StreakStar,
  StoryCreator,
  PerfectRound,
  SpeedDemon,
}

impl Badge {
  pub const ALL: [Badge; 6] = [
    Badge::FirstSteps,
    Badge::WordMaster,
    Badge::StreakStar,
    Badge::StoryCreator,
    Badge::PerfectRound,
    Badge::SpeedDemon,
  ];

  pub fn id(&self) -> &'static str {
    match self {
      Self::FirstSteps => "first_steps",
      Self::WordMaster => "word_master",
      Self::StreakStar => "streak_star",
      Self::StoryCreator => "story_creator",
      Self::PerfectRound => "perfect_round",
      Self::SpeedDemon => "speed_demon",
    }
  }

  pub fn from_id(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|b| b.id() == s)
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::FirstSteps => "First Steps",
      Self::WordMaster => "Word Master",
      Self::StreakStar => "Streak Star",
      Self::StoryCreator => "Story Creator",
      Self::PerfectRound => "Perfect Round",
      Self::SpeedDemon => "Speed Demon",
    }
  }

  pub fn name_he(&self) -> &'static str {
    match self {
      Self::FirstSteps => "צעדים ראשונים",
      Self::WordMaster => "אלוף המילים",
      Self::StreakStar => "כוכב הרצף",
      Self::StoryCreator => "יוצר סיפורים",
      Self::PerfectRound => "סיבוב מושלם",
      Self::SpeedDemon => "שד המהירות",
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      Self::FirstSteps => "Complete your first exercise",
      Self::WordMaster => "Master 50 words",
      Self::StreakStar => "7-day practice streak",
      Self::StoryCreator => "Generate your first AI story",
      Self::PerfectRound => "Complete a practice session with no mistakes",
      Self::SpeedDemon => "Answer 10 questions in under 30 seconds",
    }
  }

  pub fn icon(&self) -> &'static str {
    match self {
      Self::FirstSteps => "🎯",
      Self::WordMaster => "📚",
      Self::StreakStar => "⭐",
      Self::StoryCreator => "📖",
      Self::PerfectRound => "💯",
      Self::SpeedDemon => "⚡",
    }
  }
}

/// Persistent XP, level and badges of one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGameState {
  pub user_id: String,
  pub xp: u32,
  pub level: u32,
  pub total_score: u32,
  pub badges: BTreeSet<Badge>,
}

impl UserGameState {
  pub fn new(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      xp: 0,
      level: 1,
      total_score: 0,
      badges: BTreeSet::new(),
    }
  }

  pub fn has_badge(&self, badge: Badge) -> bool {
    self.badges.contains(&badge)
  }
}
