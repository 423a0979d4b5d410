//! Handlers for `/groups/` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/groups/` | In id order |
//! | `POST`   | `/groups/` | Body: `{"name":"editors"}` |
//! | `GET`    | `/groups/{id}/` | 404 if not found |
//! | `PUT`    | `/groups/{id}/` | Full replace |
//! | `PATCH`  | `/groups/{id}/` | Partial |
//! | `DELETE` | `/groups/{id}/` | Memberships vanish with the group |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tally_core::{
  group::{Group, GroupPatch, NewGroup},
  store::CatalogStore,
};

use crate::{
  AppState, auth::Authenticated, error::ApiError, refs::resource_url,
};

// ─── Representation ──────────────────────────────────────────────────────────

/// Wire shape of a group.
#[derive(Debug, Serialize)]
pub struct GroupRepr {
  pub url:  String,
  pub name: String,
}

pub fn represent(group: &Group) -> GroupRepr {
  GroupRepr {
    url:  resource_url("groups", group.group_id),
    name: group.name.clone(),
  }
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /groups/` and `PUT /groups/{id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// JSON body accepted by `PATCH /groups/{id}/`.
#[derive(Debug, Deserialize, Default)]
pub struct PatchBody {
  pub name: Option<String>,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /groups/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<GroupRepr>>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let groups = state
    .store
    .list_groups()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(groups.iter().map(represent).collect()))
}

/// `POST /groups/` — returns 201 + the stored representation.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let input = NewGroup { name: body.name };
  input.validate()?;

  let group = state
    .store
    .create_group(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(represent(&group))))
}

/// `GET /groups/{id}/`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<GroupRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let group = state
    .store
    .get_group(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(represent(&group)))
}

/// `PUT /groups/{id}/` — full replace.
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<CreateBody>,
) -> Result<Json<GroupRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let patch = GroupPatch { name: Some(body.name) };
  patch.validate()?;

  let group = state
    .store
    .update_group(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(&group)))
}

/// `PATCH /groups/{id}/`
pub async fn modify<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<PatchBody>,
) -> Result<Json<GroupRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let patch = GroupPatch { name: body.name };
  patch.validate()?;

  let group = state
    .store
    .update_group(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(&group)))
}

/// `DELETE /groups/{id}/`
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
    .delete_group(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
