//! A student's practice run: the question session wired to scoring, the
//! persistent game state and spaced-repetition progress.
//!
//! Side effects of an answer are reported as [`PracticeEvent`]s. Storage
//! failures never undo scoring; they surface as `PersistenceFailed` and the
//! run carries on.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;

use crate::db::{LogOnError, SharedStore, StoreResult, UserStore};
use crate::domain::{Badge, Language, UserGameState, Word};
use crate::exercise::{
  AnswerHandler, AnswerOutcome, ExerciseKind, ExerciseSession, Feedback, SessionState, SessionStats, TimerOutcome,
  TimerRequest,
};
use crate::game::{LevelUp, SessionScore, level_progress, xp_to_next_level};
use crate::services::{ProgressService, SpeechOutput};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PracticeEvent {
  PointsEarned { word_id: String, points: u32 },
  LevelUp(LevelUp),
  BadgeEarned { badge: Badge },
  PersistenceFailed { context: String, error: String },
  SessionFinished(PracticeSummary),
}

/// Final numbers of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSummary {
  pub stats: SessionStats,
  pub score: SessionScore,
  pub new_badges: Vec<Badge>,
}

/// Answer side effects: the part of a run the session calls back into
struct RunLedger {
  user_id: String,
  list_id: String,
  store: SharedStore,
  progress: ProgressService,
  score: SessionScore,
  game: UserGameState,
  events: Vec<PracticeEvent>,
  now: DateTime<Utc>,
}

impl RunLedger {
  fn persistence_failed(&mut self, context: &str, error: impl std::fmt::Display) {
    tracing::warn!("{} for {}: {}", context, self.user_id, error);
    self.events.push(PracticeEvent::PersistenceFailed {
      context: context.to_string(),
      error: error.to_string(),
    });
  }

  fn save_game_state(&mut self) {
    if let Err(e) = self.store.save_game_state(&self.game) {
      self.persistence_failed("Failed to save game state", e);
    }
  }

  fn record_progress(&mut self, word: &Word, is_correct: bool) {
    let result = self
      .progress
      .record_answer_at(&self.user_id, &word.id, &self.list_id, is_correct, self.now);
    if let Err(e) = result {
      self.persistence_failed("Failed to record progress", e);
    }
  }
}

impl AnswerHandler for RunLedger {
  fn on_correct(&mut self, word: &Word) -> Option<u32> {
    let points = self.score.record_correct(word.difficulty);
    self.events.push(PracticeEvent::PointsEarned {
      word_id: word.id.clone(),
      points,
    });
    if let Some(level_up) = self.game.add_points(points) {
      tracing::info!("{} reached level {}", self.user_id, level_up.to);
      self.events.push(PracticeEvent::LevelUp(level_up));
    }
    self.save_game_state();
    self.record_progress(word, true);
    Some(points)
  }

  fn on_incorrect(&mut self, word: &Word) {
    self.score.record_wrong();
    self.record_progress(word, false);
  }
}

pub struct PracticeRun<R: Rng = StdRng> {
  session: ExerciseSession<R>,
  kind: ExerciseKind,
  ledger: RunLedger,
  speech: Option<Arc<dyn SpeechOutput>>,
  finished: Option<PracticeSummary>,
}

impl<R: Rng> PracticeRun<R> {
  /// Prepare a run for `user_id` on `list_id`, loading the user's game state
  pub fn new(
    session: ExerciseSession<R>,
    kind: ExerciseKind,
    user_id: &str,
    list_id: &str,
    store: SharedStore,
  ) -> StoreResult<Self> {
    let game = store.game_state(user_id)?;
    Ok(Self {
      session,
      kind,
      ledger: RunLedger {
        user_id: user_id.to_string(),
        list_id: list_id.to_string(),
        progress: ProgressService::new(store.clone()),
        store,
        score: SessionScore::default(),
        game,
        events: Vec::new(),
        now: Utc::now(),
      },
      speech: None,
      finished: None,
    })
  }

  pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
    self.speech = Some(speech);
    self
  }

  /// Start answering `words`. An empty list leaves the run waiting.
  pub fn begin_at(&mut self, words: Vec<Word>, now: DateTime<Utc>) -> bool {
    if !self.session.start(words) {
      return false;
    }
    self.reset_score(now);
    tracing::debug!(
      "{} started {} practice on {} with {} words",
      self.ledger.user_id,
      self.kind.as_str(),
      self.ledger.list_id,
      self.session.total_words()
    );
    self.speak_prompt();
    true
  }

  /// Practice the same words again in a new order
  pub fn restart_at(&mut self, now: DateTime<Utc>) -> bool {
    if !self.session.restart() {
      return false;
    }
    self.reset_score(now);
    self.speak_prompt();
    true
  }

  fn reset_score(&mut self, now: DateTime<Utc>) {
    self.ledger.score = SessionScore::started_at(now);
    self.finished = None;
  }

  pub fn answer_at(&mut self, selected: &str, now: DateTime<Utc>) -> Option<AnswerOutcome> {
    self.ledger.now = now;
    let outcome = self.session.answer(selected, &mut self.ledger)?;
    if outcome.completed {
      self.finish(now);
    } else if outcome.is_correct && outcome.timer.is_none() {
      self.speak_prompt();
    }
    Some(outcome)
  }

  pub fn on_timer_at(&mut self, request: &TimerRequest, now: DateTime<Utc>) -> Option<TimerOutcome> {
    self.ledger.now = now;
    let outcome = self.session.on_timer(request, &mut self.ledger)?;
    if outcome.completed {
      self.finish(now);
    } else if outcome.points_awarded.is_some() {
      self.speak_prompt();
    }
    Some(outcome)
  }

  pub fn skip(&mut self) -> bool {
    let skipped = self.session.skip();
    if skipped {
      self.speak_prompt();
    }
    skipped
  }

  /// Stop pending timers from touching this run
  pub fn teardown(&mut self) {
    self.session.teardown();
  }

  /// Award badges and report the session, once per completion
  fn finish(&mut self, now: DateTime<Utc>) {
    if self.finished.is_some() {
      return;
    }

    let new_badges = self.ledger.game.award_session_badges(&self.ledger.score, now);
    if !new_badges.is_empty() {
      self.ledger.save_game_state();
    }
    for badge in &new_badges {
      tracing::info!("{} earned badge {}", self.ledger.user_id, badge.id());
      self.ledger.events.push(PracticeEvent::BadgeEarned { badge: *badge });
    }

    let summary = PracticeSummary {
      stats: self.session.stats(),
      score: self.ledger.score.clone(),
      new_badges,
    };
    self.ledger.events.push(PracticeEvent::SessionFinished(summary.clone()));
    self.finished = Some(summary);
  }

  fn speak_prompt(&self) {
    if !self.kind.speaks_prompt() {
      return;
    }
    if let (Some(speech), Some(word)) = (&self.speech, self.session.current_word()) {
      speech.speak(&word.en, Language::En).log_warn("Failed to speak prompt");
    }
  }

  /// Events since the last call
  pub fn take_events(&mut self) -> Vec<PracticeEvent> {
    std::mem::take(&mut self.ledger.events)
  }

  pub fn session(&self) -> &ExerciseSession<R> {
    &self.session
  }

  pub fn kind(&self) -> ExerciseKind {
    self.kind
  }

  pub fn user_id(&self) -> &str {
    &self.ledger.user_id
  }

  pub fn list_id(&self) -> &str {
    &self.ledger.list_id
  }

  pub fn score(&self) -> &SessionScore {
    &self.ledger.score
  }

  pub fn game_state(&self) -> &UserGameState {
    &self.ledger.game
  }

  pub fn summary(&self) -> Option<&PracticeSummary> {
    self.finished.as_ref()
  }

  pub fn view(&self) -> PracticeView {
    let game = &self.ledger.game;
    PracticeView {
      kind: self.kind,
      state: self.session.state(),
      prompt: self.session.current_word().map(Prompt::from),
      options: self.session.options().to_vec(),
      feedback: self.session.feedback(),
      transitioning: self.session.is_transitioning(),
      question: self.session.current_index() + 1,
      total_words: self.session.total_words(),
      progress: self.session.progress_percent(),
      score: self.ledger.score.clone(),
      xp: game.xp,
      level: game.level,
      level_progress: level_progress(game.xp),
      xp_to_next_level: xp_to_next_level(game.xp),
      summary: self.finished.clone(),
    }
  }
}

/// What the student sees of the current word; the translation stays hidden
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
  pub word_id: String,
  pub en: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub audio_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sentence: Option<String>,
}

impl From<&Word> for Prompt {
  fn from(word: &Word) -> Self {
    Self {
      word_id: word.id.clone(),
      en: word.en.clone(),
      image_url: word.image_url.clone(),
      audio_url: word.audio_url.clone(),
      sentence: word.sentence.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeView {
  pub kind: ExerciseKind,
  pub state: SessionState,
  pub prompt: Option<Prompt>,
  pub options: Vec<String>,
  pub feedback: Option<Feedback>,
  pub transitioning: bool,
  /// 1-based question number
  pub question: usize,
  pub total_words: usize,
  pub progress: f64,
  pub score: SessionScore,
  pub xp: u32,
  pub level: u32,
  pub level_progress: f64,
  pub xp_to_next_level: u32,
  pub summary: Option<PracticeSummary>,
}
