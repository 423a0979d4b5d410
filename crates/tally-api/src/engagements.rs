//! Handlers for `/engagements/` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/engagements/` | In id order |
//! | `POST`   | `/engagements/` | Body: [`CreateBody`]; 409 for a duplicate pair |
//! | `GET`    | `/engagements/{id}/` | 404 if not found |
//! | `PUT`    | `/engagements/{id}/` | Full replace |
//! | `PATCH`  | `/engagements/{id}/` | The polarity-flip path |
//! | `DELETE` | `/engagements/{id}/` | |
//!
//! `product` and `user` in bodies accept a plain id or a hyperlinked path
//! (`"/products/3/"`), and are always rendered as the latter.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
  engagement::{Engagement, EngagementKind, EngagementPatch, NewEngagement},
  store::CatalogStore,
};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  refs::{ResourceRef, resource_url},
};

// ─── Representation ──────────────────────────────────────────────────────────

/// Wire shape of an engagement. Cross-references are addressable links,
/// not embedded objects.
#[derive(Debug, Serialize)]
pub struct EngagementRepr {
  pub url:        String,
  pub product:    String,
  pub user:       String,
  pub engagement: EngagementKind,
  pub created:    DateTime<Utc>,
}

pub fn represent(engagement: &Engagement) -> EngagementRepr {
  EngagementRepr {
    url:        resource_url("engagements", engagement.engagement_id),
    product:    resource_url("products", engagement.product_id),
    user:       resource_url("users", engagement.user_id),
    engagement: engagement.kind,
    created:    engagement.created_at,
  }
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /engagements/` and `PUT /engagements/{id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub product:    ResourceRef,
  pub user:       ResourceRef,
  pub engagement: EngagementKind,
}

/// JSON body accepted by `PATCH /engagements/{id}/`.
#[derive(Debug, Deserialize, Default)]
pub struct PatchBody {
  pub product:    Option<ResourceRef>,
  pub user:       Option<ResourceRef>,
  pub engagement: Option<EngagementKind>,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /engagements/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<EngagementRepr>>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let engagements = state
    .store
    .list_engagements()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(engagements.iter().map(represent).collect()))
}

/// `POST /engagements/` — returns 201 + the stored representation.
///
/// A second engagement for the same `(user, product)` pair is a 409, never
/// a silent overwrite.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let input = NewEngagement {
    user_id:    body.user.resolve("user", "users")?,
    product_id: body.product.resolve("product", "products")?,
    kind:       body.engagement,
  };

  let engagement = state
    .store
    .create_engagement(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(represent(&engagement))))
}

/// `GET /engagements/{id}/`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<EngagementRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let engagement = state
    .store
    .get_engagement(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("engagement {id} not found")))?;
  Ok(Json(represent(&engagement)))
}

/// `PUT /engagements/{id}/` — full replace.
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<CreateBody>,
) -> Result<Json<EngagementRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let patch = EngagementPatch {
    user_id:    Some(body.user.resolve("user", "users")?),
    product_id: Some(body.product.resolve("product", "products")?),
    kind:       Some(body.engagement),
  };

  let engagement = state
    .store
    .update_engagement(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(&engagement)))
}

/// `PATCH /engagements/{id}/` — flipping `engagement` here must be visible
/// in the product's derived counts on the very next read.
pub async fn modify<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<PatchBody>,
) -> Result<Json<EngagementRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let patch = EngagementPatch {
    user_id: body
      .user
      .as_ref()
      .map(|r| r.resolve("user", "users"))
      .transpose()?,
    product_id: body
      .product
      .as_ref()
      .map(|r| r.resolve("product", "products"))
      .transpose()?,
    kind: body.engagement,
  };

  let engagement = state
    .store
    .update_engagement(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(&engagement)))
}

/// `DELETE /engagements/{id}/`
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
    .delete_engagement(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
