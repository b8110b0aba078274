//! Reading material built around vocabulary: short stories that use a set of
//! words, and example sentences for a single word.
//!
//! [`TemplateStories`] is the offline generator. A language-model backed one
//! would implement [`StoryGenerator`] and fall back to it on failure.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

use crate::config;
use crate::validation::{clamp_difficulty, normalize_text};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryError {
  #[error("no words to write about")]
  NoWords,
  #[error("story service unavailable: {0}")]
  Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
  pub story: String,
  /// Words the reader should find in the story
  pub highlighted_words: Vec<String>,
  pub difficulty: u8,
  /// Reading level the difficulty stands for
  pub style: String,
}

pub trait StoryGenerator: Send + Sync {
  /// Short story using `words`; `difficulty` is 1..=5
  fn generate_story(&self, words: &[String], difficulty: u8) -> Result<Story, StoryError>;

  /// Up to `count` example sentences using `word`
  fn generate_sentences(&self, word: &str, count: usize) -> Result<Vec<String>, StoryError>;
}

/// How a story of the given difficulty should read
pub fn difficulty_description(difficulty: u8) -> &'static str {
  match clamp_difficulty(difficulty) {
    1 => "very simple, using short sentences suitable for beginners",
    2 => "simple, using clear sentences suitable for elementary students",
    3 => "intermediate, using varied sentence structures",
    4 => "advanced, using complex sentences and vocabulary",
    _ => "very advanced, using sophisticated language",
  }
}

/// Trimmed, non-empty words in their original order
fn clean_words(words: &[String]) -> Vec<String> {
  words
    .iter()
    .map(|w| normalize_text(w))
    .filter(|w| !w.is_empty())
    .collect()
}

const SENTENCE_TEMPLATES: &[&str] = &[
  "The teacher wrote the word \"{}\" on the board.",
  "Today I learned what \"{}\" means.",
  "My friend used \"{}\" in a story about her family.",
  "Can you find \"{}\" in the text?",
  "We practiced the word \"{}\" in class this morning.",
];

/// Fixed templates with the words slotted in
pub struct TemplateStories {
  rng: Mutex<StdRng>,
}

impl Default for TemplateStories {
  fn default() -> Self {
    Self::new()
  }
}

impl TemplateStories {
  pub fn new() -> Self {
    Self {
      rng: Mutex::new(StdRng::from_os_rng()),
    }
  }

  pub fn seeded(seed: u64) -> Self {
    Self {
      rng: Mutex::new(StdRng::seed_from_u64(seed)),
    }
  }

  fn pick_template(&self) -> Result<usize, StoryError> {
    let mut rng = self
      .rng
      .lock()
      .map_err(|_| StoryError::Unavailable("story generator poisoned".to_string()))?;
    Ok(rng.random_range(0..3))
  }
}

fn story_from_template(template: usize, words: &[String]) -> String {
  let word = |i: usize, default: &str| words.get(i).cloned().unwrap_or_else(|| default.to_string());
  match template {
    0 => format!(
      "Once upon a time, there was a young student who loved to learn. They discovered that {} was very {}. \
       Every day, they would practice and grow stronger in their knowledge.",
      word(0, "learning"),
      word(1, "important")
    ),
    1 => format!(
      "In a small classroom, a {} taught their students about the world. They learned about {} and {}. \
       The students were amazed by what they discovered.",
      word(0, "teacher"),
      word(1, "nature"),
      word(2, "science")
    ),
    _ => format!(
      "The journey of learning begins with a single step. When you {} hard and {} every day, \
       you become {} at everything you do.",
      word(0, "study"),
      word(1, "practice"),
      word(2, "better")
    ),
  }
}

impl StoryGenerator for TemplateStories {
  fn generate_story(&self, words: &[String], difficulty: u8) -> Result<Story, StoryError> {
    let words = clean_words(words);
    if words.is_empty() {
      return Err(StoryError::NoWords);
    }
    let template = self.pick_template()?;
    tracing::debug!("Template story {} for {} words", template, words.len());

    Ok(Story {
      story: story_from_template(template, &words),
      highlighted_words: words,
      difficulty: clamp_difficulty(difficulty),
      style: difficulty_description(difficulty).to_string(),
    })
  }

  fn generate_sentences(&self, word: &str, count: usize) -> Result<Vec<String>, StoryError> {
    let word = normalize_text(word);
    if word.is_empty() {
      return Err(StoryError::NoWords);
    }
    let count = count.clamp(1, config::MAX_SENTENCE_COUNT);
    Ok(
      SENTENCE_TEMPLATES
        .iter()
        .cycle()
        .take(count)
        .map(|template| template.replace("{}", &word))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
  }

  #[test]
  fn test_story_uses_given_words() {
    let stories = TemplateStories::seeded(7);
    for _ in 0..10 {
      let story = stories.generate_story(&words(&["knowledge", "remember", "friend"]), 3).unwrap();
      assert!(story.story.contains("knowledge"));
      assert!(story.story.contains("remember"));
      assert_eq!(story.highlighted_words, words(&["knowledge", "remember", "friend"]));
      assert_eq!(story.difficulty, 3);
    }
  }

  #[test]
  fn test_missing_slots_use_defaults() {
    let one = words(&["apple"]);
    assert!(story_from_template(0, &one).contains("apple was very important"));
    assert!(story_from_template(1, &one).contains("about nature and science"));
    assert!(story_from_template(2, &one).contains("you become better"));
  }

  #[test]
  fn test_blank_words_are_dropped() {
    let stories = TemplateStories::seeded(1);
    let story = stories.generate_story(&words(&["  ", " book "]), 9).unwrap();
    assert_eq!(story.highlighted_words, words(&["book"]));
    assert_eq!(story.difficulty, 5);
    assert_eq!(story.style, difficulty_description(5));
    assert_eq!(stories.generate_story(&words(&[" "]), 2), Err(StoryError::NoWords));
    assert_eq!(stories.generate_story(&[], 2), Err(StoryError::NoWords));
  }

  #[test]
  fn test_sentences_cycle_templates() {
    let stories = TemplateStories::seeded(1);
    let sentences = stories.generate_sentences("window", 7).unwrap();
    assert_eq!(sentences.len(), 7);
    assert!(sentences.iter().all(|s| s.contains("\"window\"")));
    assert_eq!(sentences[0], sentences[5]);
    assert_ne!(sentences[0], sentences[1]);
  }

  #[test]
  fn test_sentence_count_bounds() {
    let stories = TemplateStories::seeded(1);
    assert_eq!(stories.generate_sentences("tree", 0).unwrap().len(), 1);
    assert_eq!(stories.generate_sentences("tree", 100).unwrap().len(), config::MAX_SENTENCE_COUNT);
    assert_eq!(stories.generate_sentences(" ", 3), Err(StoryError::NoWords));
  }

  #[test]
  fn test_difficulty_description() {
    assert!(difficulty_description(1).starts_with("very simple"));
    assert!(difficulty_description(0).starts_with("very simple"));
    assert!(difficulty_description(7).starts_with("very advanced"));
  }
}
