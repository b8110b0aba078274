use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::StoryError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Story(#[from] StoryError),
}

impl ApiError {
  pub fn not_found(kind: &str, id: &str) -> Self {
    Self::NotFound(format!("{} '{}' not found", kind, id))
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
      Self::Store(StoreError::InvalidWords(_)) => StatusCode::BAD_REQUEST,
      Self::Store(StoreError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Story(StoryError::NoWords) => StatusCode::BAD_REQUEST,
      Self::Story(StoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let error = if status.is_server_error() {
      tracing::error!("Request failed: {}", self);
      match self {
        Self::Story(_) => "story service unavailable".to_string(),
        _ => "internal storage error".to_string(),
      }
    } else {
      self.to_string()
    };
    (status, Json(ErrorResponse { error })).into_response()
  }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::validation::WordError;

  #[test]
  fn test_status_mapping() {
    assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::not_found("run", "r1").status(), StatusCode::NOT_FOUND);
    assert_eq!(
      ApiError::from(StoreError::not_found("word list", "7")).status(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      ApiError::from(StoreError::InvalidWords(WordError::MissingEnglish { index: 0 })).status(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(ApiError::from(StoreError::Unavailable).status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ApiError::from(StoryError::NoWords).status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      ApiError::from(StoryError::Unavailable("quota".into())).status(),
      StatusCode::SERVICE_UNAVAILABLE
    );
  }

  #[test]
  fn test_server_errors_hide_details() {
    let err = ApiError::from(StoreError::Io(std::io::Error::other("disk on fire")));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
