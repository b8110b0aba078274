//! English to Hebrew translation for teacher-entered words, and lookup of
//! example sentences in reading texts.
//!
//! Only an offline dictionary ships; a networked translator would implement
//! [`Translator`] the same way.

use std::collections::HashMap;
use thiserror::Error;

use crate::domain::Word;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
  #[error("nothing to translate")]
  EmptyInput,
  #[error("translation service unavailable: {0}")]
  Unavailable(String),
}

pub trait Translator: Send + Sync {
  /// Translate one English word; `context` is the sentence it came from, if any
  fn translate(&self, word: &str, context: Option<&str>) -> Result<String, TranslateError>;
}

const DICTIONARY: &[(&str, &str)] = &[
  ("apple", "תפוח"),
  ("book", "ספר"),
  ("computer", "מחשב"),
  ("window", "חלון"),
  ("teacher", "מורה"),
  ("student", "תלמיד"),
  ("beautiful", "יפה"),
  ("important", "חשוב"),
  ("environment", "סביבה"),
  ("knowledge", "ידע"),
  ("understand", "להבין"),
  ("remember", "לזכור"),
  ("difficult", "קשה"),
  ("experience", "ניסיון"),
  ("communication", "תקשורת"),
  ("house", "בית"),
  ("water", "מים"),
  ("food", "אוכל"),
  ("dog", "כלב"),
  ("cat", "חתול"),
  ("school", "בית ספר"),
  ("friend", "חבר"),
  ("family", "משפחה"),
  ("love", "אהבה"),
  ("time", "זמן"),
  ("day", "יום"),
  ("night", "לילה"),
  ("morning", "בוקר"),
  ("city", "עיר"),
  ("world", "עולם"),
  ("life", "חיים"),
  ("work", "עבודה"),
  ("child", "ילד"),
  ("children", "ילדים"),
  ("man", "איש"),
  ("woman", "אישה"),
  ("people", "אנשים"),
  ("big", "גדול"),
  ("small", "קטן"),
  ("new", "חדש"),
  ("old", "ישן"),
  ("good", "טוב"),
  ("bad", "רע"),
  ("happy", "שמח"),
  ("sad", "עצוב"),
  ("fast", "מהיר"),
  ("slow", "איטי"),
  ("help", "עזרה"),
  ("learn", "ללמוד"),
  ("write", "לכתוב"),
  ("read", "לקרוא"),
  ("speak", "לדבר"),
  ("think", "לחשוב"),
  ("go", "ללכת"),
  ("come", "לבוא"),
  ("see", "לראות"),
  ("know", "לדעת"),
  ("want", "לרצות"),
  ("give", "לתת"),
  ("take", "לקחת"),
  ("make", "לעשות"),
  ("find", "למצוא"),
  ("run", "לרוץ"),
  ("walk", "ללכת"),
  ("eat", "לאכול"),
  ("drink", "לשתות"),
  ("play", "לשחק"),
  ("open", "לפתוח"),
  ("close", "לסגור"),
  ("begin", "להתחיל"),
  ("end", "לסיים"),
  ("story", "סיפור"),
  ("adventure", "הרפתקה"),
  ("color", "צבע"),
  ("red", "אדום"),
  ("blue", "כחול"),
  ("green", "ירוק"),
  ("white", "לבן"),
  ("black", "שחור"),
  ("sun", "שמש"),
  ("moon", "ירח"),
  ("star", "כוכב"),
  ("tree", "עץ"),
  ("flower", "פרח"),
  ("mountain", "הר"),
  ("river", "נהר"),
  ("sea", "ים"),
  ("rain", "גשם"),
  ("wind", "רוח"),
];

/// Offline translator over a fixed dictionary of common words.
/// Unknown words come back as `[word]` so a teacher can spot and fix them.
pub struct DictionaryTranslator {
  entries: HashMap<&'static str, &'static str>,
}

impl Default for DictionaryTranslator {
  fn default() -> Self {
    Self::new()
  }
}

impl DictionaryTranslator {
  pub fn new() -> Self {
    Self {
      entries: DICTIONARY.iter().copied().collect(),
    }
  }

  pub fn lookup(&self, word: &str) -> Option<&'static str> {
    self.entries.get(word.trim().to_lowercase().as_str()).copied()
  }
}

impl Translator for DictionaryTranslator {
  fn translate(&self, word: &str, _context: Option<&str>) -> Result<String, TranslateError> {
    let word = word.trim();
    if word.is_empty() {
      return Err(TranslateError::EmptyInput);
    }
    Ok(match self.lookup(word) {
      Some(he) => he.to_string(),
      None => {
        tracing::debug!("No dictionary entry for '{}'", word);
        format!("[{}]", word)
      }
    })
  }
}

/// Fill in translations for words that have none. Returns how many were
/// translated; a failing word is logged and left empty.
pub fn translate_missing(translator: &dyn Translator, words: &mut [Word]) -> usize {
  let mut translated = 0;
  for word in words.iter_mut().filter(|w| w.he.trim().is_empty()) {
    match translator.translate(&word.en, word.sentence.as_deref()) {
      Ok(he) => {
        word.he = he;
        translated += 1;
      }
      Err(e) => tracing::warn!("Could not translate '{}': {}", word.en, e),
    }
  }
  translated
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Case-insensitive match of `needle` bounded by non-word characters
fn contains_whole_word(haystack: &str, needle: &str) -> bool {
  let haystack = haystack.to_lowercase();
  let needle = needle.to_lowercase();
  if needle.is_empty() {
    return false;
  }

  haystack.match_indices(needle.as_str()).any(|(start, matched)| {
    let before = haystack[..start].chars().next_back();
    let after = haystack[start + matched.len()..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
  })
}

/// Sentences terminated by `.`, `!` or `?`; trailing text without a
/// terminator is not a sentence
fn split_sentences(text: &str) -> Vec<&str> {
  let mut sentences = Vec::new();
  let mut start = 0;
  let mut chars = text.char_indices().peekable();

  while let Some((i, c)) = chars.next() {
    if matches!(c, '.' | '!' | '?') {
      let mut end = i + c.len_utf8();
      while let Some(&(j, next)) = chars.peek() {
        if !matches!(next, '.' | '!' | '?') {
          break;
        }
        end = j + next.len_utf8();
        chars.next();
      }
      // A run of terminators with nothing before it is not a sentence
      if start < i {
        sentences.push(&text[start..end]);
      }
      start = end;
    }
  }
  sentences
}

/// The sentence of `text` containing `word` as a whole word. Falls back to
/// the first sentence of the text.
pub fn find_sentence_for_word(text: &str, word: &str) -> String {
  let sentences = split_sentences(text);
  let candidates: Vec<&str> = if sentences.is_empty() { vec![text] } else { sentences };

  match candidates.iter().find(|s| contains_whole_word(s, word)) {
    Some(sentence) => sentence.trim().to_string(),
    None => format!("{}.", text.split('.').next().unwrap_or_default().trim()),
  }
}
