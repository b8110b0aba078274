//! Application services.
//!
//! Progress bookkeeping over the stores, plus the translation, speech and
//! story collaborators the handlers talk to.

pub mod progress;
pub mod speech;
pub mod story;
pub mod translation;

pub use progress::ProgressService;
pub use speech::{RecordingSpeech, SilentSpeech, SpeechError, SpeechOutput};
pub use story::{Story, StoryError, StoryGenerator, TemplateStories};
pub use translation::{DictionaryTranslator, TranslateError, Translator, find_sentence_for_word, translate_missing};
