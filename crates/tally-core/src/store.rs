//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  engagement::{Engagement, EngagementKind, EngagementPatch, NewEngagement},
  error::AsDomainError,
  group::{Group, GroupPatch, NewGroup},
  product::{NewProduct, Product, ProductPatch},
  user::{NewUser, User, UserPatch},
};

/// Abstraction over the Tally datastore.
///
/// The store holds no in-process mutable state; every method is a single
/// datastore operation, and ordering across concurrent calls is whatever the
/// backend's row-level consistency provides. The `(user, product)`
/// uniqueness constraint on engagements is the only cross-request
/// arbitration in the system.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + AsDomainError + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user and its group memberships atomically.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user by exact username — the authentication path.
  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// List all users, newest first.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Apply `patch` to an existing user. A present `group_ids` replaces the
  /// whole membership set.
  fn update_user(
    &self,
    id: i64,
    patch: UserPatch,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Delete a user. Their engagements are removed with them.
  fn delete_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  fn create_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// List all groups in id order.
  fn list_groups(
    &self,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  fn update_group(
    &self,
    id: i64,
    patch: GroupPatch,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn delete_group(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Products ──────────────────────────────────────────────────────────

  fn create_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  fn get_product(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  /// List all products in id order.
  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  /// Apply `patch` to an existing product. `created_at` is never touched.
  fn update_product(
    &self,
    id: i64,
    patch: ProductPatch,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  /// Delete a product. Its engagements are removed with it.
  fn delete_product(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Engagements ───────────────────────────────────────────────────────

  /// Persist a new engagement.
  ///
  /// Fails with a validation error if the referenced user or product does
  /// not exist, and with a duplicate-engagement error if the `(user,
  /// product)` pair already has one. Under concurrent creates for the same
  /// pair, the store's uniqueness constraint arbitrates and exactly one
  /// call wins.
  fn create_engagement(
    &self,
    input: NewEngagement,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  fn get_engagement(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Engagement>, Self::Error>> + Send + '_;

  /// List all engagements in id order.
  fn list_engagements(
    &self,
  ) -> impl Future<Output = Result<Vec<Engagement>, Self::Error>> + Send + '_;

  /// Apply `patch` to an existing engagement — the polarity-flip path.
  ///
  /// Re-validates references and re-checks the `(user, product)` uniqueness
  /// constraint when either side of the pair changes. `created_at` is never
  /// touched.
  fn update_engagement(
    &self,
    id: i64,
    patch: EngagementPatch,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  fn delete_engagement(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Derived counts ────────────────────────────────────────────────────

  /// Count engagements of `kind` on `product_id`.
  ///
  /// Pure and recomputed on every call; no caching, no stored counters.
  /// Absence is not an error: a product with no engagements (or a
  /// nonexistent product id) counts zero.
  fn count_engagements(
    &self,
    product_id: i64,
    kind: EngagementKind,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
