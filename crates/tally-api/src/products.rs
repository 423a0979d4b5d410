//! Handlers for `/products/` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/products/` | In id order |
//! | `POST`   | `/products/` | Body: [`CreateBody`] |
//! | `GET`    | `/products/{id}/` | 404 if not found |
//! | `PUT`    | `/products/{id}/` | Full replace of name/description |
//! | `PATCH`  | `/products/{id}/` | Partial |
//! | `DELETE` | `/products/{id}/` | Engagements vanish with the product |
//!
//! Every rendered product carries `likes` and `dislikes`, recomputed from
//! the engagement table on each render — they are derived counts, never
//! stored.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
  engagement::EngagementKind,
  product::{NewProduct, Product, ProductPatch},
  store::CatalogStore,
};

use crate::{
  AppState, auth::Authenticated, error::ApiError, refs::resource_url,
};

// ─── Representation ──────────────────────────────────────────────────────────

/// Wire shape of a product, including the derived tallies.
#[derive(Debug, Serialize)]
pub struct ProductRepr {
  pub url:         String,
  pub name:        String,
  pub description: String,
  pub likes:       u64,
  pub dislikes:    u64,
  pub created:     DateTime<Utc>,
}

/// Build the wire shape for `product`, recomputing both tallies.
///
/// Two separate counting queries; a concurrent engagement write between
/// them may land in one count and not the other.
pub async fn represent<S>(
  store: &S,
  product: &Product,
) -> Result<ProductRepr, ApiError>
where
  S: CatalogStore,
{
  let likes = store
    .count_engagements(product.product_id, EngagementKind::Like)
    .await
    .map_err(ApiError::from_store)?;
  let dislikes = store
    .count_engagements(product.product_id, EngagementKind::Dislike)
    .await
    .map_err(ApiError::from_store)?;

  Ok(ProductRepr {
    url: resource_url("products", product.product_id),
    name: product.name.clone(),
    description: product.description.clone(),
    likes,
    dislikes,
    created: product.created_at,
  })
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /products/` and `PUT /products/{id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

/// JSON body accepted by `PATCH /products/{id}/`.
#[derive(Debug, Deserialize, Default)]
pub struct PatchBody {
  pub name:        Option<String>,
  pub description: Option<String>,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /products/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<ProductRepr>>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let products = state
    .store
    .list_products()
    .await
    .map_err(ApiError::from_store)?;

  let mut reprs = Vec::with_capacity(products.len());
  for product in &products {
    reprs.push(represent(state.store.as_ref(), product).await?);
  }
  Ok(Json(reprs))
}

/// `POST /products/` — returns 201 + the stored representation.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let input = NewProduct {
    name:        body.name,
    description: body.description,
  };
  input.validate()?;

  let product = state
    .store
    .create_product(input)
    .await
    .map_err(ApiError::from_store)?;
  let repr = represent(state.store.as_ref(), &product).await?;
  Ok((StatusCode::CREATED, Json(repr)))
}

/// `GET /products/{id}/`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<Json<ProductRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let product = state
    .store
    .get_product(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
  Ok(Json(represent(state.store.as_ref(), &product).await?))
}

/// `PUT /products/{id}/` — full replace of the writable fields.
pub async fn replace<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<CreateBody>,
) -> Result<Json<ProductRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let patch = ProductPatch {
    name:        Some(body.name),
    description: Some(body.description),
  };
  patch.validate()?;

  let product = state
    .store
    .update_product(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(state.store.as_ref(), &product).await?))
}

/// `PATCH /products/{id}/`
pub async fn modify<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Json(body): Json<PatchBody>,
) -> Result<Json<ProductRepr>, ApiError>
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  let patch = ProductPatch {
    name:        body.name,
    description: body.description,
  };
  patch.validate()?;

  let product = state
    .store
    .update_product(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(represent(state.store.as_ref(), &product).await?))
}

/// `DELETE /products/{id}/`
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
    .delete_product(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
