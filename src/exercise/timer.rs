//! Deferred session transitions.
//!
//! The session never sleeps. When it needs something to happen later it
//! hands out a [`TimerRequest`]; whoever drives the session schedules it and
//! passes it back to [`ExerciseSession::on_timer`] once the delay elapsed.
//! Every request carries a [`TimerToken`]. Restarting or tearing down the
//! session bumps its generation, and a newer feedback or advance supersedes
//! the older sequence, so late requests are dropped instead of touching
//! fresh state.
//!
//! [`ExerciseSession::on_timer`]: super::ExerciseSession::on_timer

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerToken {
  /// Session generation the timer belongs to
  pub generation: u64,
  /// Monotonic per-session counter
  pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerAction {
  /// Hide wrong-answer feedback so the question can be retried
  ClearFeedback,
  /// Finish a delayed correct answer and move to the next word
  Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerRequest {
  pub token: TimerToken,
  #[serde(with = "millis")]
  pub delay: Duration,
  pub action: TimerAction,
}

mod millis {
  use serde::Serializer;
  use std::time::Duration;

  pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(delay.as_millis() as u64)
  }
}

/// Something that can run a timer request later
pub trait Scheduler {
  fn schedule(&mut self, request: TimerRequest);
}

/// Virtual-clock scheduler: requests fire only when the clock is advanced.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualScheduler {
  now: Duration,
  next_id: u64,
  pending: Vec<(Duration, u64, TimerRequest)>,
}

#[cfg(test)]
impl ManualScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn now(&self) -> Duration {
    self.now
  }

  pub fn pending(&self) -> usize {
    self.pending.len()
  }

  /// Move the clock forward and return every request now due, earliest first
  pub fn advance(&mut self, by: Duration) -> Vec<TimerRequest> {
    self.now += by;
    let now = self.now;

    let (mut due, waiting): (Vec<_>, Vec<_>) =
      self.pending.drain(..).partition(|(at, _, _)| *at <= now);
    self.pending = waiting;

    due.sort_by_key(|(at, id, _)| (*at, *id));
    due.into_iter().map(|(_, _, request)| request).collect()
  }

  /// Drop everything scheduled
  pub fn clear(&mut self) {
    self.pending.clear();
  }
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
  fn schedule(&mut self, request: TimerRequest) {
    let id = self.next_id;
    self.next_id += 1;
    self.pending.push((self.now + request.delay, id, request));
  }
}
