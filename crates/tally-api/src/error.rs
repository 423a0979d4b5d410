//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::AsDomainError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  /// A client error naming the offending field.
  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  /// A duplicate `(user, product)` engagement.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Lower a backend failure into the matching client error, or wrap it as
  /// a server fault if it carries no domain classification.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + AsDomainError + Send + Sync + 'static,
  {
    match err.domain() {
      Some(domain) => Self::from(domain.clone()),
      None => ApiError::Store(Box::new(err)),
    }
  }
}

impl From<tally_core::Error> for ApiError {
  fn from(err: tally_core::Error) -> Self {
    use tally_core::Error as Domain;
    match err {
      Domain::UserNotFound(id) => {
        ApiError::NotFound(format!("user {id} not found"))
      }
      Domain::GroupNotFound(id) => {
        ApiError::NotFound(format!("group {id} not found"))
      }
      Domain::ProductNotFound(id) => {
        ApiError::NotFound(format!("product {id} not found"))
      }
      Domain::EngagementNotFound(id) => {
        ApiError::NotFound(format!("engagement {id} not found"))
      }
      Domain::DuplicateEngagement {
        user_id,
        product_id,
      } => ApiError::Conflict(format!(
        "user {user_id} already has an engagement on product {product_id}"
      )),
      Domain::Validation { field, message } => {
        ApiError::Validation { field, message }
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"tally\""),
        );
        res
      }
      ApiError::NotFound(message) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
          .into_response()
      }
      ApiError::Validation { field, message } => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message, "field": field })),
      )
        .into_response(),
      ApiError::Conflict(message) => {
        (StatusCode::CONFLICT, Json(json!({ "error": message })))
          .into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal error" })),
        )
          .into_response()
      }
    }
  }
}
