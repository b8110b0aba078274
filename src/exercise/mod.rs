pub mod kind;
pub mod options;
pub mod session;
pub mod timer;

pub use kind::ExerciseKind;
pub use options::generate_options;
pub use session::{
  AnswerHandler, AnswerOutcome, AnswerRecord, ExerciseSession, Feedback, SessionOptions, SessionState,
  SessionStats, TimerOutcome,
};
#[cfg(test)]
pub use timer::ManualScheduler;
pub use timer::{Scheduler, TimerAction, TimerRequest, TimerToken};
