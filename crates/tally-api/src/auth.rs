//! HTTP Basic-auth extractor backed by the user table.
//!
//! Credentials are checked against the bootstrap admin identity from server
//! configuration first (so an empty database is still administrable), then
//! against `users.password_hash`. Any authenticated caller may operate on
//! any resource; there is no per-record ownership.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use tally_core::store::CatalogStore;

use crate::{AppState, error::ApiError};

/// The bootstrap credential accepted alongside user-table accounts.
#[derive(Clone)]
pub struct AuthConfig {
  pub admin_username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub admin_password_hash: String,
}

/// Zero-size marker: present in the handler means the request was
/// authenticated.
pub struct Authenticated;

/// Verify credentials directly from headers.
pub async fn verify_auth<S>(
  headers: &HeaderMap,
  state: &AppState<S>,
) -> Result<(), ApiError>
where
  S: CatalogStore,
{
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  if username == state.auth.admin_username {
    return verify_hash(password, &state.auth.admin_password_hash);
  }

  let user = state
    .store
    .get_user_by_username(username)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;

  verify_hash(password, &user.password_hash)
}

fn verify_hash(password: &str, phc: &str) -> Result<(), ApiError> {
  let parsed_hash =
    PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, state).await?;
    Ok(Authenticated)
  }
}
