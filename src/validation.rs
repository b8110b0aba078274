//! Normalisation and validation of teacher-authored words.
//!
//! Practice compares the selected option against the stored translation by
//! exact string equality, so everything stored goes through the same
//! normalisation first: trimmed, inner whitespace collapsed, Unicode NFC.
//! Hebrew text pasted from different editors often mixes composed and
//! decomposed forms, which would otherwise never compare equal.

use std::collections::HashSet;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::domain::Word;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WordError {
  #[error("word #{index} has no English text")]
  MissingEnglish { index: usize },
  #[error("word '{en}' has no translation")]
  MissingTranslation { en: String },
  #[error("duplicate word id '{0}'")]
  DuplicateId(String),
}

/// Trim, collapse whitespace and compose to NFC
pub fn normalize_text(input: &str) -> String {
  input
    .nfc()
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Difficulty outside 1..=5 is pulled to the nearest bound; 0 means unset and becomes 1
pub fn clamp_difficulty(difficulty: u8) -> u8 {
  difficulty.clamp(1, 5)
}

/// Normalise one word. An empty id is replaced by `fallback_id`.
pub fn normalize_word(word: &Word, index: usize, fallback_id: &str) -> Result<Word, WordError> {
  let en = normalize_text(&word.en);
  if en.is_empty() {
    return Err(WordError::MissingEnglish { index });
  }
  let he = normalize_text(&word.he);
  if he.is_empty() {
    return Err(WordError::MissingTranslation { en });
  }

  let id = word.id.trim();
  let id = if id.is_empty() { fallback_id.to_string() } else { id.to_string() };

  Ok(Word {
    id,
    en,
    he,
    difficulty: clamp_difficulty(word.difficulty),
    image_url: non_empty(word.image_url.as_deref()),
    audio_url: non_empty(word.audio_url.as_deref()),
    sentence: word.sentence.as_deref().map(normalize_text).filter(|s| !s.is_empty()),
  })
}

/// Normalise a whole list, assigning `{id_prefix}_{index}` to words without an id
pub fn normalize_words(words: &[Word], id_prefix: &str) -> Result<Vec<Word>, WordError> {
  let mut seen = HashSet::new();
  let mut normalized = Vec::with_capacity(words.len());

  for (index, word) in words.iter().enumerate() {
    let word = normalize_word(word, index, &format!("{}_{}", id_prefix, index))?;
    if !seen.insert(word.id.clone()) {
      return Err(WordError::DuplicateId(word.id));
    }
    normalized.push(word);
  }

  Ok(normalized)
}

fn non_empty(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
