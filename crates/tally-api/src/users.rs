//! Handlers for `/users/` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/users/` | Newest accounts first |
//! | `POST`   | `/users/` | Body: [`CreateBody`]; `password` is write-only |
//! | `GET`    | `/users/{id}/` | 404 if not found |
//! | `PUT`    | `/users/{id}/` | Full replace; same body as create |
//! | `PATCH`  | `/users/{id}/` | Any subset of fields |
//! | `DELETE` | `/users/{id}/` | Removes the user's engagements too |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tally_core::{
  store::CatalogStore,
  user::{NewUser, User, UserPatch},
};

use crate::{
  AppState,
  auth::{Authenticated, hash_password},
  error::ApiError,
  refs::{ResourceRef, resource_url},
};

// ─── Representation ──────────────────────────────────────────────────────────

/// Wire shape of a user. The password hash never appears here.
#[derive(Debug, Serialize)]
pub struct UserRepr {
  pub url:      String,
  pub username: String,
  pub email:    String,
  /// Group memberships as addressable links.
  pub groups:   Vec<String>,
}

pub fn represent(user: &User) -> UserRepr {
  UserRepr {
    url:      resource_url("users", user.user_id),
    username: user.username.clone(),
    email:    user.email.clone(),
    groups:   user
      .group_ids
      .iter()
      .map(|id| resource_url("groups", *id))
      .collect(),
  }
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /users/` and `PUT /users/{id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: String,
  pub email:    String,
  /// Write-only; hashed before it reaches the store.
  pub password: String,
  #[serde(default)]
  pub groups:   Vec<ResourceRef>,
}

/// JSON body accepted by `PATCH /users/{id}/`.
#[derive(Debug, Deserialize, Default)]
pub struct PatchBody {
  pub username: Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
  pub groups:   Option<Vec<ResourceRef>>,
}

fn resolve_groups(refs: &[ResourceRef]) -> Result<Vec<i64>, ApiError> {
  refs.iter().map(|r| r.resolve("groups", "groups")).collect()
}

fn check_password(password: &str) -> Result<(), ApiError> {
  if password.is_empty() {
    return Err(ApiError::Validation {
      field:   "password",
      message: "must not be empty".into(),
    });
  }
  Ok(())
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /users/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<UserRepr>>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let users = state
    .store
    .list_users()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(users.iter().map(represent).collect()))
}

/// `POST /users/` — returns 201 + the stored representation.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  check_password(&body.password)?;
  let password_hash = hash_password(&body.password)?;
  let group_ids     = resolve_groups(&body.groups)?;

  let input = NewUser {
    username: body.username,
    email: body.email,
    password_hash,
    group_ids,
  };
  input.validate()?;

  let user = state
    .store
    .create_user(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(represent(&user))))
}

/// `GET /users/{id}/`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<UserRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(represent(&user)))
}

/// `PUT /users/{id}/` — full replace; every writable field required.
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<CreateBody>,
) -> Result<Json<UserRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  check_password(&body.password)?;
  let patch = UserPatch {
    username:      Some(body.username),
    email:         Some(body.email),
    password_hash: Some(hash_password(&body.password)?),
    group_ids:     Some(resolve_groups(&body.groups)?),
  };
  patch.validate()?;

  let user = state
    .store
    .update_user(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(&user)))
}

/// `PATCH /users/{id}/` — any subset of fields.
pub async fn modify<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<PatchBody>,
) -> Result<Json<UserRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let password_hash = match &body.password {
    Some(password) => {
      check_password(password)?;
      Some(hash_password(password)?)
    }
    None => None,
  };
  let group_ids = body.groups.as_deref().map(resolve_groups).transpose()?;

  let patch = UserPatch {
    username: body.username,
    email: body.email,
    password_hash,
    group_ids,
  };
  patch.validate()?;

  let user = state
    .store
    .update_user(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(&user)))
}

/// `DELETE /users/{id}/`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .delete_user(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
