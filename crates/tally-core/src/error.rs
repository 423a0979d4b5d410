//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("group not found: {0}")]
  GroupNotFound(i64),

  #[error("product not found: {0}")]
  ProductNotFound(i64),

  #[error("engagement not found: {0}")]
  EngagementNotFound(i64),

  /// A second engagement for a `(user, product)` pair that already has one.
  #[error("user {user_id} already has an engagement on product {product_id}")]
  DuplicateEngagement { user_id: i64, product_id: i64 },

  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },
}

impl Error {
  /// Shorthand for [`Error::Validation`] on `field`.
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation {
      field,
      message: message.into(),
    }
  }
}

/// Implemented by backend error types that may carry a domain [`Error`].
///
/// The HTTP layer is generic over the store backend; this is how it recovers
/// the domain classification of a failure (not-found, duplicate, validation)
/// without naming the backend's concrete error type.
pub trait AsDomainError {
  /// The domain error inside, if this failure has one.
  fn domain(&self) -> Option<&Error>;
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
