use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language of a text snippet handed to translation or speech output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  En,
  He,
}

fn default_difficulty() -> u8 {
  1
}

/// A vocabulary item: English headword and its Hebrew translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
  /// Empty until a store assigns one
  #[serde(default)]
  pub id: String,
  pub en: String,
  /// Empty until translated
  #[serde(default)]
  pub he: String,
  /// 1 (easiest) to 5
  #[serde(default = "default_difficulty")]
  pub difficulty: u8,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub audio_url: Option<String>,
  /// Example sentence taken from the source text (text units only)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sentence: Option<String>,
}

impl Word {
  pub fn new(id: &str, en: &str, he: &str, difficulty: u8) -> Self {
    Self {
      id: id.to_string(),
      en: en.to_string(),
      he: he.to_string(),
      difficulty,
      image_url: None,
      audio_url: None,
      sentence: None,
    }
  }
}

/// A teacher-authored list of words
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordList {
  pub id: String,
  pub teacher_id: String,
  pub name: String,
  pub words: Vec<Word>,
  pub created_at: DateTime<Utc>,
}

/// A reading text with the words a teacher picked out of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
  pub id: String,
  pub teacher_id: String,
  pub title: String,
  pub text: String,
  pub words: Vec<Word>,
  pub created_at: DateTime<Utc>,
}

/// Partial update for a word list; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordListUpdate {
  pub name: Option<String>,
  pub words: Option<Vec<Word>>,
}

/// Partial update for a text unit; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextUnitUpdate {
  pub title: Option<String>,
  pub text: Option<String>,
  pub words: Option<Vec<Word>>,
}
