pub mod game;
pub mod progress;
pub mod word;

pub use game::{Badge, UserGameState};
pub use progress::{ProgressKey, ProgressRecord};
pub use word::{Language, TextUnit, TextUnitUpdate, Word, WordList, WordListUpdate};
