pub mod error;
pub mod lists;
pub mod practice;
pub mod progress;
pub mod stories;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;

pub use error::{ApiError, ApiResult};

pub async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/lists", get(lists::list_word_lists).post(lists::create_word_list))
    .route(
      "/lists/{id}",
      get(lists::get_word_list)
        .put(lists::update_word_list)
        .delete(lists::delete_word_list),
    )
    .route("/units", get(lists::list_text_units).post(lists::create_text_unit))
    .route(
      "/units/{id}",
      get(lists::get_text_unit)
        .put(lists::update_text_unit)
        .delete(lists::delete_text_unit),
    )
    .route("/users/{user}/progress", get(progress::user_progress))
    .route("/users/{user}/due", get(progress::due_words))
    .route("/users/{user}/summary", get(progress::summary))
    .route("/users/{user}/answers", post(progress::record_answer))
    .route("/users/{user}/game", get(progress::game_state))
    .route("/analytics/struggling", post(progress::struggling_analytics))
    .route("/practice", post(practice::start_practice))
    .route("/practice/{id}", get(practice::get_practice).delete(practice::end_practice))
    .route("/practice/{id}/answer", post(practice::answer))
    .route("/practice/{id}/skip", post(practice::skip))
    .route("/practice/{id}/restart", post(practice::restart))
    .route("/stories", post(stories::generate_story))
    .route("/sentences", post(stories::generate_sentences))
    .with_state(state)
}

/// In-process server over a fresh demo store
#[cfg(test)]
pub(crate) fn test_server() -> axum_test::TestServer {
  use crate::db::DemoStore;
  use std::sync::Arc;

  let state = AppState::new(Arc::new(DemoStore::new()));
  axum_test::TestServer::new(router(state)).unwrap()
}
