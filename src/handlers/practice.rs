//! Practice runs over HTTP.
//!
//! Each run lives in the [`RunRegistry`]. Timer requests from a run are
//! slept on by a tokio task which then locks the registry and feeds the
//! request back. A run that was restarted or deleted in the meantime
//! ignores it.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::db::{self, DEFAULT_LIST_ID, WordListStore};
use crate::domain::Word;
use crate::exercise::{AnswerOutcome, ExerciseKind, ExerciseSession, Scheduler, SessionOptions, TimerRequest};
use crate::practice::{PracticeEvent, PracticeRun, PracticeView};
use crate::state::{AppState, RunRegistry};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
  pub user_id: String,
  pub list_id: Option<String>,
  pub unit_id: Option<String>,
  #[serde(default)]
  pub kind: ExerciseKind,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
  pub selected: String,
}

#[derive(Debug, Serialize)]
pub struct PracticeResponse {
  pub run_id: String,
  pub view: PracticeView,
  /// Events drained from the run by this request. Events raised by a timer
  /// (`SessionFinished` after a delayed last answer, `PersistenceFailed`
  /// from its progress write) are not pushed anywhere; they show up in the
  /// next response for the run, so clients poll `GET /practice/{id}` while
  /// `view.transitioning` is set or feedback is showing.
  pub events: Vec<PracticeEvent>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcome: Option<AnswerOutcome>,
}

impl PracticeResponse {
  fn from_run(run_id: &str, run: &mut PracticeRun, outcome: Option<AnswerOutcome>) -> Self {
    Self {
      run_id: run_id.to_string(),
      view: run.view(),
      events: run.take_events(),
      outcome,
    }
  }
}

/// Fires timer requests of one run on the tokio runtime
pub struct TokioScheduler {
  runs: RunRegistry,
  run_id: String,
}

impl TokioScheduler {
  pub fn new(runs: RunRegistry, run_id: &str) -> Self {
    Self {
      runs,
      run_id: run_id.to_string(),
    }
  }
}

impl Scheduler for TokioScheduler {
  fn schedule(&mut self, request: TimerRequest) {
    let runs = self.runs.clone();
    let run_id = self.run_id.clone();
    tokio::spawn(async move {
      tokio::time::sleep(request.delay).await;
      let mut runs = match db::try_lock(&runs) {
        Ok(runs) => runs,
        Err(e) => {
          tracing::warn!("Dropping timer for {}: {}", run_id, e);
          return;
        }
      };
      if let Some(run) = runs.get_for_timer(&run_id) {
        if run.on_timer_at(&request, Utc::now()).is_none() {
          tracing::debug!("Stale {:?} timer for {}", request.action, run_id);
        }
      }
    });
  }
}

/// Words for a run and the list id their progress is filed under
fn resolve_words(state: &AppState, req: &StartRequest) -> ApiResult<(Vec<Word>, String)> {
  match (&req.list_id, &req.unit_id) {
    (Some(_), Some(_)) => Err(ApiError::BadRequest(
      "give either list_id or unit_id, not both".to_string(),
    )),
    (Some(list_id), None) => {
      let list = state
        .store
        .word_list(list_id)?
        .ok_or_else(|| ApiError::not_found("word list", list_id))?;
      Ok((list.words, list.id))
    }
    (None, Some(unit_id)) => {
      let unit = state
        .store
        .text_unit(unit_id)?
        .ok_or_else(|| ApiError::not_found("text unit", unit_id))?;
      Ok((unit.words, unit.id))
    }
    (None, None) => Ok((db::default_words(), DEFAULT_LIST_ID.to_string())),
  }
}

pub async fn start_practice(
  State(state): State<AppState>,
  Json(req): Json<StartRequest>,
) -> ApiResult<(StatusCode, Json<PracticeResponse>)> {
  if req.user_id.trim().is_empty() {
    return Err(ApiError::BadRequest("user_id is required".to_string()));
  }
  let (words, list_id) = resolve_words(&state, &req)?;
  if words.is_empty() {
    return Err(ApiError::BadRequest(format!("'{}' has no words to practice", list_id)));
  }

  let now = Utc::now();
  let session = ExerciseSession::from_os_rng(SessionOptions::for_kind(req.kind));
  let mut run = PracticeRun::new(session, req.kind, &req.user_id, &list_id, state.store.clone())?
    .with_speech(state.speech.clone());
  run.begin_at(words, now);

  let mut runs = db::try_lock(&state.runs)?;
  let run_id = runs.insert(run, now);
  tracing::info!("Started practice run {} for {}", run_id, req.user_id);
  let run = runs
    .get_mut(&run_id, now)
    .ok_or_else(|| ApiError::not_found("practice run", &run_id))?;
  Ok((StatusCode::CREATED, Json(PracticeResponse::from_run(&run_id, run, None))))
}

/// Current view plus events since the last request, timer-driven ones included
pub async fn get_practice(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PracticeResponse>> {
  let mut runs = db::try_lock(&state.runs)?;
  let run = runs
    .get_mut(&id, Utc::now())
    .ok_or_else(|| ApiError::not_found("practice run", &id))?;
  Ok(Json(PracticeResponse::from_run(&id, run, None)))
}

pub async fn answer(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<PracticeResponse>> {
  let now = Utc::now();
  let mut runs = db::try_lock(&state.runs)?;
  let run = runs
    .get_mut(&id, now)
    .ok_or_else(|| ApiError::not_found("practice run", &id))?;

  let outcome = run
    .answer_at(&req.selected, now)
    .ok_or_else(|| ApiError::Conflict("run is not accepting answers".to_string()))?;
  if let Some(request) = outcome.timer {
    TokioScheduler::new(state.runs.clone(), &id).schedule(request);
  }
  Ok(Json(PracticeResponse::from_run(&id, run, Some(outcome))))
}

pub async fn skip(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PracticeResponse>> {
  let mut runs = db::try_lock(&state.runs)?;
  let run = runs
    .get_mut(&id, Utc::now())
    .ok_or_else(|| ApiError::not_found("practice run", &id))?;
  if !run.skip() {
    return Err(ApiError::Conflict("nothing to skip".to_string()));
  }
  Ok(Json(PracticeResponse::from_run(&id, run, None)))
}

pub async fn restart(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<PracticeResponse>> {
  let now = Utc::now();
  let mut runs = db::try_lock(&state.runs)?;
  let run = runs
    .get_mut(&id, now)
    .ok_or_else(|| ApiError::not_found("practice run", &id))?;
  if !run.restart_at(now) {
    return Err(ApiError::Conflict("run has no words to restart".to_string()));
  }
  Ok(Json(PracticeResponse::from_run(&id, run, None)))
}

pub async fn end_practice(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
  let mut runs = db::try_lock(&state.runs)?;
  runs
    .remove(&id)
    .ok_or_else(|| ApiError::not_found("practice run", &id))?;
  tracing::debug!("Ended practice run {}", id);
  Ok(StatusCode::NO_CONTENT)
}
