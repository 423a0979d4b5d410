//! JSON HTTP layer for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`CatalogStore`]. Every route
//! requires HTTP Basic authentication; see [`auth`]. Resource
//! representations are built by explicit mapping functions in each handler
//! module — the persisted records never serialize directly.

pub mod auth;
pub mod engagements;
pub mod error;
pub mod groups;
pub mod products;
pub mod refs;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;
use tally_core::store::CatalogStore;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  /// PHC string produced by argon2; see the `--hash-password` helper.
  pub admin_password_hash: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: CatalogStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the Tally API.
///
/// Paths carry trailing slashes (`/products/3/`), matching the hyperlinks
/// the representations render.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CatalogStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/users/", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}/",
      get(users::get_one::<S>)
        .put(users::replace::<S>)
        .patch(users::modify::<S>)
        .delete(users::remove::<S>),
    )
    .route("/groups/", get(groups::list::<S>).post(groups::create::<S>))
    .route(
      "/groups/{id}/",
      get(groups::get_one::<S>)
        .put(groups::replace::<S>)
        .patch(groups::modify::<S>)
        .delete(groups::remove::<S>),
    )
    .route(
      "/products/",
      get(products::list::<S>).post(products::create::<S>),
    )
    .route(
      "/products/{id}/",
      get(products::get_one::<S>)
        .put(products::replace::<S>)
        .patch(products::modify::<S>)
        .delete(products::remove::<S>),
    )
    .route(
      "/engagements/",
      get(engagements::list::<S>).post(engagements::create::<S>),
    )
    .route(
      "/engagements/{id}/",
      get(engagements::get_one::<S>)
        .put(engagements::replace::<S>)
        .patch(engagements::modify::<S>)
        .delete(engagements::remove::<S>),
    )
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
