//! Teacher-facing word lists and reading units.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;

use super::{ApiError, ApiResult};
use crate::db::WordListStore;
use crate::domain::{TextUnit, TextUnitUpdate, Word, WordList, WordListUpdate};
use crate::services::{find_sentence_for_word, translate_missing};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TeacherQuery {
  pub teacher: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
  pub teacher_id: String,
  pub name: String,
  #[serde(default)]
  pub words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUnitRequest {
  pub teacher_id: String,
  pub title: String,
  pub text: String,
  #[serde(default)]
  pub words: Vec<Word>,
}

pub async fn list_word_lists(
  State(state): State<AppState>,
  Query(query): Query<TeacherQuery>,
) -> ApiResult<Json<Vec<WordList>>> {
  Ok(Json(state.store.word_lists(query.teacher.as_deref())?))
}

pub async fn create_word_list(
  State(state): State<AppState>,
  Json(mut req): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<WordList>)> {
  translate_missing(state.translator.as_ref(), &mut req.words);
  let list = state
    .store
    .create_word_list(&req.teacher_id, &req.name, &req.words, Utc::now())?;
  tracing::info!("Created word list {} with {} words", list.id, list.words.len());
  Ok((StatusCode::CREATED, Json(list)))
}

pub async fn get_word_list(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<WordList>> {
  state
    .store
    .word_list(&id)?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("word list", &id))
}

pub async fn update_word_list(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(mut update): Json<WordListUpdate>,
) -> ApiResult<Json<WordList>> {
  if let Some(words) = update.words.as_mut() {
    translate_missing(state.translator.as_ref(), words);
  }
  Ok(Json(state.store.update_word_list(&id, &update)?))
}

pub async fn delete_word_list(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
  state.store.delete_word_list(&id)?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn list_text_units(
  State(state): State<AppState>,
  Query(query): Query<TeacherQuery>,
) -> ApiResult<Json<Vec<TextUnit>>> {
  Ok(Json(state.store.text_units(query.teacher.as_deref())?))
}

/// Words without an example sentence get the one they appear in
pub async fn create_text_unit(
  State(state): State<AppState>,
  Json(mut req): Json<CreateUnitRequest>,
) -> ApiResult<(StatusCode, Json<TextUnit>)> {
  if req.text.trim().is_empty() {
    return Err(ApiError::BadRequest("text unit needs a text".to_string()));
  }
  for word in req.words.iter_mut().filter(|w| w.sentence.is_none()) {
    word.sentence = Some(find_sentence_for_word(&req.text, &word.en));
  }
  translate_missing(state.translator.as_ref(), &mut req.words);

  let unit = state
    .store
    .create_text_unit(&req.teacher_id, &req.title, &req.text, &req.words, Utc::now())?;
  Ok((StatusCode::CREATED, Json(unit)))
}

pub async fn get_text_unit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<TextUnit>> {
  state
    .store
    .text_unit(&id)?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("text unit", &id))
}

/// New words without a sentence get one from the new text, or the stored
/// text when only the words change
pub async fn update_text_unit(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(mut update): Json<TextUnitUpdate>,
) -> ApiResult<Json<TextUnit>> {
  if update.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
    return Err(ApiError::BadRequest("text unit needs a text".to_string()));
  }
  if let Some(words) = update.words.as_mut() {
    let text = match &update.text {
      Some(text) => text.clone(),
      None => {
        state
          .store
          .text_unit(&id)?
          .ok_or_else(|| ApiError::not_found("text unit", &id))?
          .text
      }
    };
    for word in words.iter_mut().filter(|w| w.sentence.is_none()) {
      word.sentence = Some(find_sentence_for_word(&text, &word.en));
    }
    translate_missing(state.translator.as_ref(), words);
  }
  Ok(Json(state.store.update_text_unit(&id, &update)?))
}

pub async fn delete_text_unit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
  state.store.delete_text_unit(&id)?;
  Ok(StatusCode::NO_CONTENT)
}
