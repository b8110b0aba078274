pub mod analytics;
pub mod interval;

pub use analytics::{due_records, struggling_words, summarize, word_analytics, ProgressSummary, WordAnalytics};
pub use interval::{interval_for_repetitions, schedule_answer};
