//! Stories and example sentences for reading practice.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};
use crate::config;
use crate::db::WordListStore;
use crate::services::Story;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
  #[serde(default)]
  pub words: Vec<String>,
  pub list_id: Option<String>,
  pub unit_id: Option<String>,
  pub difficulty: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SentencesRequest {
  pub word: String,
  pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SentencesResponse {
  pub word: String,
  pub sentences: Vec<String>,
}

/// English words of the referenced list or unit, followed by any given directly
fn story_words(state: &AppState, req: &StoryRequest) -> ApiResult<Vec<String>> {
  let mut words = Vec::new();
  if let Some(list_id) = &req.list_id {
    let list = state
      .store
      .word_list(list_id)?
      .ok_or_else(|| ApiError::not_found("word list", list_id))?;
    words.extend(list.words.into_iter().map(|w| w.en));
  }
  if let Some(unit_id) = &req.unit_id {
    let unit = state
      .store
      .text_unit(unit_id)?
      .ok_or_else(|| ApiError::not_found("text unit", unit_id))?;
    words.extend(unit.words.into_iter().map(|w| w.en));
  }
  words.extend(req.words.iter().cloned());
  Ok(words)
}

pub async fn generate_story(State(state): State<AppState>, Json(req): Json<StoryRequest>) -> ApiResult<Json<Story>> {
  let words = story_words(&state, &req)?;
  let difficulty = req.difficulty.unwrap_or(config::DEFAULT_STORY_DIFFICULTY);
  let story = state.stories.generate_story(&words, difficulty)?;
  tracing::debug!("Generated story with {} words", story.highlighted_words.len());
  Ok(Json(story))
}

pub async fn generate_sentences(
  State(state): State<AppState>,
  Json(req): Json<SentencesRequest>,
) -> ApiResult<Json<SentencesResponse>> {
  let count = req.count.unwrap_or(config::DEFAULT_SENTENCE_COUNT);
  let sentences = state.stories.generate_sentences(&req.word, count)?;
  Ok(Json(SentencesResponse {
    word: req.word.trim().to_string(),
    sentences,
  }))
}
