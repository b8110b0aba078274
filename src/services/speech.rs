//! Spoken prompts. Audio exercises speak the English word when a question
//! appears; the engine only needs something that accepts text and a
//! language, playback lives with the client.

use std::sync::Mutex;
use thiserror::Error;

use crate::domain::Language;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
  #[error("speech failed: {0}")]
  Failed(String),
}

pub trait SpeechOutput: Send + Sync {
  fn speak(&self, text: &str, lang: Language) -> Result<(), SpeechError>;
}

/// Speech output that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeech;

impl SpeechOutput for SilentSpeech {
  fn speak(&self, _text: &str, _lang: Language) -> Result<(), SpeechError> {
    Ok(())
  }
}

/// Keeps every utterance, for replay to a client or for tests
#[derive(Debug, Default)]
pub struct RecordingSpeech {
  utterances: Mutex<Vec<(String, Language)>>,
}

impl RecordingSpeech {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn utterances(&self) -> Vec<(String, Language)> {
    self
      .utterances
      .lock()
      .map(|u| u.clone())
      .unwrap_or_default()
  }

  /// Drain the recorded utterances
  pub fn take(&self) -> Vec<(String, Language)> {
    self
      .utterances
      .lock()
      .map(|mut u| std::mem::take(&mut *u))
      .unwrap_or_default()
  }
}

impl SpeechOutput for RecordingSpeech {
  fn speak(&self, text: &str, lang: Language) -> Result<(), SpeechError> {
    let mut utterances = self
      .utterances
      .lock()
      .map_err(|_| SpeechError::Failed("recorder poisoned".to_string()))?;
    utterances.push((text.to_string(), lang));
    Ok(())
  }
}
