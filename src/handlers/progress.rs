//! Student progress, game state and teacher analytics.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::db::UserStore;
use crate::domain::{Badge, ProgressRecord, UserGameState};
use crate::game::{level_progress, max_level, xp_to_next_level};
use crate::srs::{ProgressSummary, WordAnalytics};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
  pub list: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
  pub word_id: String,
  pub list_id: String,
  pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  #[serde(flatten)]
  pub summary: ProgressSummary,
  pub struggling: Vec<ProgressRecord>,
}

#[derive(Debug, Serialize)]
pub struct BadgeInfo {
  pub id: &'static str,
  pub name: &'static str,
  pub name_he: &'static str,
  pub description: &'static str,
  pub icon: &'static str,
  pub earned: bool,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
  #[serde(flatten)]
  pub state: UserGameState,
  pub level_progress: f64,
  pub xp_to_next_level: u32,
  pub max_level: u32,
  pub all_badges: Vec<BadgeInfo>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsRequest {
  pub list_ids: Vec<String>,
}

pub async fn user_progress(
  State(state): State<AppState>,
  Path(user): Path<String>,
  Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ProgressRecord>>> {
  Ok(Json(state.progress.progress(&user, query.list.as_deref())?))
}

pub async fn due_words(
  State(state): State<AppState>,
  Path(user): Path<String>,
  Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ProgressRecord>>> {
  Ok(Json(state.progress.words_due_for_review(&user, query.list.as_deref())?))
}

pub async fn summary(
  State(state): State<AppState>,
  Path(user): Path<String>,
  Query(query): Query<ListQuery>,
) -> ApiResult<Json<SummaryResponse>> {
  let list = query.list.as_deref();
  Ok(Json(SummaryResponse {
    summary: state.progress.summary_at(&user, list, Utc::now())?,
    struggling: state.progress.struggling(&user, list, None)?,
  }))
}

/// Record an answer given outside a practice run
pub async fn record_answer(
  State(state): State<AppState>,
  Path(user): Path<String>,
  Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<ProgressRecord>> {
  if req.word_id.trim().is_empty() || req.list_id.trim().is_empty() {
    return Err(ApiError::BadRequest("word_id and list_id are required".to_string()));
  }
  Ok(Json(state.progress.record_answer(&user, &req.word_id, &req.list_id, req.is_correct)?))
}

pub async fn game_state(State(state): State<AppState>, Path(user): Path<String>) -> ApiResult<Json<GameResponse>> {
  let game = state.store.game_state(&user)?;
  let all_badges = Badge::ALL
    .iter()
    .map(|&badge| BadgeInfo {
      id: badge.id(),
      name: badge.name(),
      name_he: badge.name_he(),
      description: badge.description(),
      icon: badge.icon(),
      earned: game.has_badge(badge),
    })
    .collect();

  Ok(Json(GameResponse {
    level_progress: level_progress(game.xp),
    xp_to_next_level: xp_to_next_level(game.xp),
    max_level: max_level(),
    all_badges,
    state: game,
  }))
}

pub async fn struggling_analytics(
  State(state): State<AppState>,
  Json(req): Json<AnalyticsRequest>,
) -> ApiResult<Json<Vec<WordAnalytics>>> {
  Ok(Json(state.progress.struggling_words_analytics(&req.list_ids)?))
}
