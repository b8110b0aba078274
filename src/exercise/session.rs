//! One multiple-choice practice run over a set of words.
//!
//! States: `Loading` until words arrive, `InProgress` while questions
//! remain, `Complete` once the last word is answered correctly. Wrong
//! answers never advance; the question stays up for another try. Skipped
//! words go to the back of the queue.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::time::Duration;

use super::kind::ExerciseKind;
use super::options::generate_options;
use super::timer::{TimerAction, TimerRequest, TimerToken};
use crate::config;
use crate::domain::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
  Loading,
  InProgress,
  Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
  Correct,
  Incorrect,
}

/// One logged answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
  pub word_id: String,
  pub word: String,
  pub correct: String,
  pub selected: String,
  pub is_correct: bool,
}

/// Statistics derived from the answer log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
  pub correct: usize,
  pub wrong: usize,
  pub total: usize,
  /// 0-100, 0 when nothing was answered
  pub accuracy: f64,
  pub answers: Vec<AnswerRecord>,
}

/// Side effects of answering, supplied by the caller (scoring, progress).
pub trait AnswerHandler {
  /// Called when a word is answered correctly; may report points earned
  fn on_correct(&mut self, word: &Word) -> Option<u32>;
  fn on_incorrect(&mut self, word: &Word);
}

/// No side effects
impl AnswerHandler for () {
  fn on_correct(&mut self, _word: &Word) -> Option<u32> {
    None
  }

  fn on_incorrect(&mut self, _word: &Word) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
  pub is_correct: bool,
  /// Points from the handler; None while a delayed advance is pending
  pub points_awarded: Option<u32>,
  /// Request the caller must schedule and feed back into `on_timer`
  pub timer: Option<TimerRequest>,
  /// True only on the answer that completed the session
  pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerOutcome {
  pub action: TimerAction,
  pub points_awarded: Option<u32>,
  pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
  pub option_count: usize,
  pub feedback_delay: Duration,
  /// Some for exercise kinds that hold a correct answer before advancing
  pub advance_delay: Option<Duration>,
}

impl Default for SessionOptions {
  fn default() -> Self {
    Self::for_kind(ExerciseKind::default())
  }
}

impl SessionOptions {
  pub fn for_kind(kind: ExerciseKind) -> Self {
    Self {
      option_count: config::OPTION_COUNT,
      feedback_delay: Duration::from_millis(config::WRONG_FEEDBACK_DELAY_MS),
      advance_delay: kind.advance_delay(),
    }
  }
}

pub struct ExerciseSession<R: Rng = StdRng> {
  rng: R,
  settings: SessionOptions,
  /// Words as given to `start`, reshuffled on restart
  original: Vec<Word>,
  queue: Vec<Word>,
  index: usize,
  options: Vec<String>,
  feedback: Option<Feedback>,
  transitioning: bool,
  state: SessionState,
  answers: Vec<AnswerRecord>,
  generation: u64,
  sequence: u64,
  feedback_timer: Option<TimerToken>,
  advance_timer: Option<TimerToken>,
}

impl ExerciseSession<StdRng> {
  /// Session seeded from the operating system
  pub fn from_os_rng(settings: SessionOptions) -> Self {
    Self::new(StdRng::from_os_rng(), settings)
  }
}

impl<R: Rng> ExerciseSession<R> {
  pub fn new(rng: R, settings: SessionOptions) -> Self {
    Self {
      rng,
      settings,
      original: Vec::new(),
      queue: Vec::new(),
      index: 0,
      options: Vec::new(),
      feedback: None,
      transitioning: false,
      state: SessionState::Loading,
      answers: Vec::new(),
      generation: 0,
      sequence: 0,
      feedback_timer: None,
      advance_timer: None,
    }
  }

  /// Start over with a new word set. An empty set is ignored and the
  /// session stays as it was; returns whether the session started.
  pub fn start(&mut self, words: Vec<Word>) -> bool {
    if words.is_empty() {
      tracing::debug!("Ignoring practice start with no words");
      return false;
    }
    self.original = words;
    self.reset();
    true
  }

  /// Reshuffle the original words and begin again. Pending timers go stale.
  pub fn restart(&mut self) -> bool {
    if self.original.is_empty() {
      return false;
    }
    self.reset();
    true
  }

  /// Invalidate pending timers without touching the questions, e.g. when
  /// the owner goes away mid-transition
  pub fn teardown(&mut self) {
    self.generation += 1;
    self.feedback_timer = None;
    self.advance_timer = None;
    self.transitioning = false;
  }

  fn reset(&mut self) {
    self.teardown();
    self.queue = self.original.clone();
    self.queue.shuffle(&mut self.rng);
    self.index = 0;
    self.answers.clear();
    self.feedback = None;
    self.state = SessionState::InProgress;
    self.refresh_options();
  }

  fn refresh_options(&mut self) {
    let Some(word) = self.queue.get(self.index) else {
      self.options.clear();
      return;
    };
    let candidates: Vec<&str> = self.queue.iter().map(|w| w.he.as_str()).collect();
    self.options = generate_options(&word.he, &candidates, self.settings.option_count, &mut self.rng);
  }

  fn next_token(&mut self) -> TimerToken {
    self.sequence += 1;
    TimerToken {
      generation: self.generation,
      sequence: self.sequence,
    }
  }

  /// Move past the current word; returns true when that completed the session
  fn advance(&mut self) -> bool {
    self.feedback = None;
    self.feedback_timer = None;
    self.transitioning = false;

    if self.index + 1 < self.queue.len() {
      self.index += 1;
      self.refresh_options();
      false
    } else {
      self.state = SessionState::Complete;
      self.options.clear();
      tracing::debug!("Practice session complete after {} answers", self.answers.len());
      true
    }
  }

  /// Answer the current question with the selected option.
  ///
  /// Returns None when there is nothing to answer: the session is not in
  /// progress or a delayed correct answer is still transitioning.
  pub fn answer<H>(&mut self, selected: &str, handler: &mut H) -> Option<AnswerOutcome>
  where
    H: AnswerHandler + ?Sized,
  {
    if self.state != SessionState::InProgress || self.transitioning {
      return None;
    }
    let word = self.queue.get(self.index)?.clone();
    let is_correct = selected == word.he;

    self.answers.push(AnswerRecord {
      word_id: word.id.clone(),
      word: word.en.clone(),
      correct: word.he.clone(),
      selected: selected.to_string(),
      is_correct,
    });

    if !is_correct {
      self.feedback = Some(Feedback::Incorrect);
      handler.on_incorrect(&word);
      let token = self.next_token();
      self.feedback_timer = Some(token);
      return Some(AnswerOutcome {
        is_correct,
        points_awarded: None,
        timer: Some(TimerRequest {
          token,
          delay: self.settings.feedback_delay,
          action: TimerAction::ClearFeedback,
        }),
        completed: false,
      });
    }

    if let Some(delay) = self.settings.advance_delay {
      self.feedback = Some(Feedback::Correct);
      self.feedback_timer = None;
      self.transitioning = true;
      let token = self.next_token();
      self.advance_timer = Some(token);
      return Some(AnswerOutcome {
        is_correct,
        points_awarded: None,
        timer: Some(TimerRequest {
          token,
          delay,
          action: TimerAction::Advance,
        }),
        completed: false,
      });
    }

    let points_awarded = handler.on_correct(&word);
    let completed = self.advance();
    Some(AnswerOutcome {
      is_correct,
      points_awarded,
      timer: None,
      completed,
    })
  }

  /// Deliver an elapsed timer. Stale or superseded requests return None.
  pub fn on_timer<H>(&mut self, request: &TimerRequest, handler: &mut H) -> Option<TimerOutcome>
  where
    H: AnswerHandler + ?Sized,
  {
    if request.token.generation != self.generation {
      return None;
    }

    match request.action {
      TimerAction::ClearFeedback => {
        if self.feedback_timer != Some(request.token) {
          return None;
        }
        self.feedback_timer = None;
        self.feedback = None;
        Some(TimerOutcome {
          action: request.action,
          points_awarded: None,
          completed: false,
        })
      }
      TimerAction::Advance => {
        if self.advance_timer != Some(request.token) || self.state != SessionState::InProgress {
          return None;
        }
        self.advance_timer = None;
        let word = self.queue.get(self.index)?.clone();
        let points_awarded = handler.on_correct(&word);
        let completed = self.advance();
        Some(TimerOutcome {
          action: request.action,
          points_awarded,
          completed,
        })
      }
    }
  }

  /// Defer the current word to the end of the queue. No answer is logged.
  pub fn skip(&mut self) -> bool {
    if self.state != SessionState::InProgress || self.transitioning {
      return false;
    }
    if self.index >= self.queue.len() {
      return false;
    }
    let skipped = self.queue.remove(self.index);
    self.queue.push(skipped);
    self.feedback = None;
    self.feedback_timer = None;
    self.refresh_options();
    true
  }

  pub fn stats(&self) -> SessionStats {
    let correct = self.answers.iter().filter(|a| a.is_correct).count();
    let wrong = self.answers.len() - correct;
    let total = correct + wrong;
    SessionStats {
      correct,
      wrong,
      total,
      accuracy: if total > 0 {
        correct as f64 / total as f64 * 100.0
      } else {
        0.0
      },
      answers: self.answers.clone(),
    }
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn current_word(&self) -> Option<&Word> {
    match self.state {
      SessionState::InProgress => self.queue.get(self.index),
      _ => None,
    }
  }

  pub fn current_index(&self) -> usize {
    self.index
  }

  /// Words in their current order, answered ones first
  pub fn words(&self) -> &[Word] {
    &self.queue
  }

  pub fn total_words(&self) -> usize {
    self.queue.len()
  }

  pub fn options(&self) -> &[String] {
    &self.options
  }

  pub fn feedback(&self) -> Option<Feedback> {
    self.feedback
  }

  pub fn is_transitioning(&self) -> bool {
    self.transitioning
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Share of questions already passed, 0-100
  pub fn progress_percent(&self) -> f64 {
    match self.state {
      SessionState::Loading => 0.0,
      SessionState::Complete => 100.0,
      SessionState::InProgress => self.index as f64 / self.queue.len() as f64 * 100.0,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::exercise::timer::{ManualScheduler, Scheduler};

  fn apple_book() -> Vec<Word> {
    vec![Word::new("1", "apple", "תפוח", 1), Word::new("2", "book", "ספר", 1)]
  }

  fn five_words() -> Vec<Word> {
    vec![
      Word::new("1", "apple", "תפוח", 1),
      Word::new("2", "book", "ספר", 1),
      Word::new("3", "computer", "מחשב", 2),
      Word::new("4", "window", "חלון", 1),
      Word::new("5", "teacher", "מורה", 1),
    ]
  }

  fn session(kind: ExerciseKind, seed: u64) -> ExerciseSession<StdRng> {
    ExerciseSession::new(StdRng::seed_from_u64(seed), SessionOptions::for_kind(kind))
  }

  fn correct_answer(s: &ExerciseSession<StdRng>) -> String {
    s.current_word().unwrap().he.clone()
  }

  #[derive(Default)]
  struct Recorder {
    correct: Vec<String>,
    incorrect: Vec<String>,
  }

  impl AnswerHandler for Recorder {
    fn on_correct(&mut self, word: &Word) -> Option<u32> {
      self.correct.push(word.id.clone());
      Some(10)
    }

    fn on_incorrect(&mut self, word: &Word) {
      self.incorrect.push(word.id.clone());
    }
  }

  #[test]
  fn test_starts_in_loading() {
    let s = session(ExerciseKind::Matching, 1);
    assert_eq!(s.state(), SessionState::Loading);
    assert!(s.current_word().is_none());
    assert_eq!(s.progress_percent(), 0.0);
  }

  #[test]
  fn test_start_with_empty_words_is_noop() {
    let mut s = session(ExerciseKind::Matching, 1);
    assert!(!s.start(Vec::new()));
    assert_eq!(s.state(), SessionState::Loading);
    assert!(s.answer("anything", &mut ()).is_none());
    assert!(!s.skip());
    assert!(!s.restart());
  }

  #[test]
  fn test_start_prepares_first_question() {
    let mut s = session(ExerciseKind::Matching, 2);
    assert!(s.start(five_words()));
    assert_eq!(s.state(), SessionState::InProgress);
    assert_eq!(s.current_index(), 0);
    assert_eq!(s.total_words(), 5);
    let word = s.current_word().unwrap();
    assert_eq!(s.options().len(), 4);
    assert_eq!(s.options().iter().filter(|o| **o == word.he).count(), 1);
  }

  #[test]
  fn test_two_word_scenario_completes() {
    let mut s = session(ExerciseKind::Matching, 3);
    s.start(apple_book());

    let first = s.answer(&correct_answer(&s), &mut ()).unwrap();
    assert!(first.is_correct);
    assert!(!first.completed);
    let second = s.answer(&correct_answer(&s), &mut ()).unwrap();
    assert!(second.completed);

    let stats = s.stats();
    assert_eq!(stats.correct, 2);
    assert_eq!(stats.wrong, 0);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.accuracy, 100.0);
    assert_eq!(s.state(), SessionState::Complete);
    assert_eq!(s.progress_percent(), 100.0);
  }

  #[test]
  fn test_wrong_answer_keeps_question() {
    let mut s = session(ExerciseKind::Matching, 4);
    s.start(apple_book());
    let before = s.current_word().unwrap().id.clone();

    let mut recorder = Recorder::default();
    let outcome = s.answer("wrong", &mut recorder).unwrap();
    assert!(!outcome.is_correct);
    assert!(!outcome.completed);
    assert_eq!(outcome.points_awarded, None);
    assert_eq!(s.feedback(), Some(Feedback::Incorrect));
    assert_eq!(s.current_word().unwrap().id, before);
    assert_eq!(recorder.incorrect, vec![before]);

    let timer = outcome.timer.unwrap();
    assert_eq!(timer.action, TimerAction::ClearFeedback);
    assert_eq!(timer.delay, Duration::from_millis(500));
  }

  #[test]
  fn test_feedback_cleared_by_timer() {
    let mut s = session(ExerciseKind::Matching, 5);
    s.start(apple_book());
    let mut scheduler = ManualScheduler::new();

    let outcome = s.answer("wrong", &mut ()).unwrap();
    scheduler.schedule(outcome.timer.unwrap());

    assert!(scheduler.advance(Duration::from_millis(400)).is_empty());
    assert_eq!(s.feedback(), Some(Feedback::Incorrect));

    for request in scheduler.advance(Duration::from_millis(100)) {
      assert!(s.on_timer(&request, &mut ()).is_some());
    }
    assert_eq!(s.feedback(), None);
  }

  #[test]
  fn test_retry_after_wrong_answer_not_locked() {
    let mut s = session(ExerciseKind::Matching, 6);
    s.start(apple_book());
    s.answer("wrong", &mut ()).unwrap();
    let retry = s.answer(&correct_answer(&s), &mut ()).unwrap();
    assert!(retry.is_correct);
    let stats = s.stats();
    assert_eq!(stats.correct, 1);
    assert_eq!(stats.wrong, 1);
    assert_eq!(stats.accuracy, 50.0);
  }

  #[test]
  fn test_older_feedback_timer_superseded() {
    let mut s = session(ExerciseKind::Matching, 7);
    s.start(five_words());
    let first = s.answer("wrong", &mut ()).unwrap().timer.unwrap();
    let second = s.answer("still wrong", &mut ()).unwrap().timer.unwrap();

    // The first clear must not hide the feedback of the second attempt
    assert!(s.on_timer(&first, &mut ()).is_none());
    assert_eq!(s.feedback(), Some(Feedback::Incorrect));
    assert!(s.on_timer(&second, &mut ()).is_some());
    assert_eq!(s.feedback(), None);
  }

  #[test]
  fn test_correct_answer_invokes_handler() {
    let mut s = session(ExerciseKind::Matching, 8);
    s.start(apple_book());
    let id = s.current_word().unwrap().id.clone();
    let mut recorder = Recorder::default();
    let outcome = s.answer(&correct_answer(&s), &mut recorder).unwrap();
    assert_eq!(outcome.points_awarded, Some(10));
    assert!(outcome.timer.is_none());
    assert_eq!(recorder.correct, vec![id]);
    assert_eq!(s.current_index(), 1);
  }

  #[test]
  fn test_delayed_kind_holds_before_advancing() {
    let mut s = session(ExerciseKind::Audio, 9);
    s.start(apple_book());
    let id = s.current_word().unwrap().id.clone();
    let mut recorder = Recorder::default();

    let outcome = s.answer(&correct_answer(&s), &mut recorder).unwrap();
    assert!(outcome.is_correct);
    assert_eq!(outcome.points_awarded, None);
    assert!(s.is_transitioning());
    assert_eq!(s.feedback(), Some(Feedback::Correct));
    assert!(recorder.correct.is_empty());
    assert_eq!(s.current_index(), 0);

    // Locked while transitioning
    assert!(s.answer("anything", &mut recorder).is_none());
    assert!(!s.skip());

    let timer = outcome.timer.unwrap();
    assert_eq!(timer.delay, Duration::from_millis(600));
    let fired = s.on_timer(&timer, &mut recorder).unwrap();
    assert_eq!(fired.points_awarded, Some(10));
    assert!(!fired.completed);
    assert_eq!(recorder.correct, vec![id]);
    assert_eq!(s.current_index(), 1);
    assert!(!s.is_transitioning());
    assert_eq!(s.feedback(), None);
  }

  #[test]
  fn test_completion_fires_once_with_delayed_kind() {
    let mut s = session(ExerciseKind::Sentence, 10);
    s.start(vec![Word::new("1", "apple", "תפוח", 1)]);
    let mut recorder = Recorder::default();

    let outcome = s.answer("תפוח", &mut recorder).unwrap();
    for _ in 0..5 {
      assert!(s.answer("תפוח", &mut recorder).is_none());
    }
    let timer = outcome.timer.unwrap();
    let fired = s.on_timer(&timer, &mut recorder).unwrap();
    assert!(fired.completed);
    // Duplicate delivery of the same timer is ignored
    assert!(s.on_timer(&timer, &mut recorder).is_none());
    assert_eq!(recorder.correct.len(), 1);
    assert_eq!(s.stats().total, 1);
  }

  #[test]
  fn test_completion_fires_once_with_rapid_answers() {
    let mut s = session(ExerciseKind::Matching, 11);
    s.start(apple_book());
    s.answer(&correct_answer(&s), &mut ()).unwrap();
    let last = correct_answer(&s);

    let completions = (0..5)
      .filter_map(|_| s.answer(&last, &mut ()))
      .filter(|o| o.completed)
      .count();
    assert_eq!(completions, 1);
    assert_eq!(s.stats().total, 2);
  }

  #[test]
  fn test_skip_moves_current_to_end() {
    let mut s = session(ExerciseKind::Matching, 12);
    s.start(vec![
      Word::new("1", "apple", "תפוח", 1),
      Word::new("2", "book", "ספר", 1),
      Word::new("3", "window", "חלון", 1),
    ]);
    let order: Vec<String> = s.words().iter().map(|w| w.id.clone()).collect();

    assert!(s.skip());
    let after: Vec<String> = s.words().iter().map(|w| w.id.clone()).collect();
    assert_eq!(after, vec![order[1].clone(), order[2].clone(), order[0].clone()]);
    assert_eq!(s.current_word().unwrap().id, order[1]);
    assert_eq!(s.current_index(), 0);
    assert!(s.stats().answers.is_empty());

    let current = s.current_word().unwrap().he.clone();
    assert!(s.options().contains(&current));
  }

  #[test]
  fn test_skip_last_remaining_word_keeps_it() {
    let mut s = session(ExerciseKind::Matching, 13);
    s.start(apple_book());
    s.answer(&correct_answer(&s), &mut ()).unwrap();
    let last = s.current_word().unwrap().id.clone();
    assert!(s.skip());
    assert_eq!(s.current_word().unwrap().id, last);
    assert_eq!(s.state(), SessionState::InProgress);
  }

  #[test]
  fn test_skip_clears_feedback() {
    let mut s = session(ExerciseKind::Matching, 14);
    s.start(five_words());
    let timer = s.answer("wrong", &mut ()).unwrap().timer.unwrap();
    assert!(s.skip());
    assert_eq!(s.feedback(), None);
    assert!(s.on_timer(&timer, &mut ()).is_none());
  }

  #[test]
  fn test_restart_clears_log_and_invalidates_timers() {
    let mut s = session(ExerciseKind::Audio, 15);
    s.start(apple_book());
    let generation = s.generation();
    let timer = s.answer(&correct_answer(&s), &mut ()).unwrap().timer.unwrap();

    assert!(s.restart());
    assert!(s.generation() > generation);
    assert_eq!(s.state(), SessionState::InProgress);
    assert_eq!(s.current_index(), 0);
    assert!(s.stats().answers.is_empty());
    assert!(!s.is_transitioning());
    assert_eq!(s.feedback(), None);

    let mut recorder = Recorder::default();
    assert!(s.on_timer(&timer, &mut recorder).is_none());
    assert!(recorder.correct.is_empty());
  }

  #[test]
  fn test_restart_after_completion() {
    let mut s = session(ExerciseKind::Matching, 16);
    s.start(apple_book());
    s.answer(&correct_answer(&s), &mut ()).unwrap();
    s.answer(&correct_answer(&s), &mut ()).unwrap();
    assert_eq!(s.state(), SessionState::Complete);

    assert!(s.restart());
    assert_eq!(s.state(), SessionState::InProgress);
    assert_eq!(s.total_words(), 2);
    let mut ids: Vec<&str> = s.words().iter().map(|w| w.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2"]);
  }

  #[test]
  fn test_teardown_suppresses_pending_advance() {
    let mut s = session(ExerciseKind::Audio, 17);
    s.start(apple_book());
    let timer = s.answer(&correct_answer(&s), &mut ()).unwrap().timer.unwrap();
    s.teardown();
    assert!(s.on_timer(&timer, &mut ()).is_none());
    assert_eq!(s.current_index(), 0);
  }

  #[test]
  fn test_answers_after_complete_ignored() {
    let mut s = session(ExerciseKind::Matching, 18);
    s.start(vec![Word::new("1", "apple", "תפוח", 1)]);
    assert!(s.answer("תפוח", &mut ()).unwrap().completed);
    assert!(s.answer("תפוח", &mut ()).is_none());
    assert!(s.current_word().is_none());
    assert!(s.options().is_empty());
  }

  #[test]
  fn test_exact_match_only() {
    let mut s = session(ExerciseKind::Matching, 19);
    s.start(vec![Word::new("1", "apple", "תפוח", 1)]);
    assert!(!s.answer(" תפוח", &mut ()).unwrap().is_correct);
    assert!(!s.answer("", &mut ()).unwrap().is_correct);
  }

  #[test]
  fn test_progress_percent() {
    let mut s = session(ExerciseKind::Matching, 20);
    s.start(five_words());
    assert_eq!(s.progress_percent(), 0.0);
    s.answer(&correct_answer(&s), &mut ()).unwrap();
    assert_eq!(s.progress_percent(), 20.0);
  }

  #[test]
  fn test_stats_without_answers() {
    let mut s = session(ExerciseKind::Matching, 21);
    s.start(five_words());
    let stats = s.stats();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.accuracy, 0.0);
  }
}
