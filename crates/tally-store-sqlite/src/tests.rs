//! Integration tests for `SqliteStore` against an in-memory database.

use tally_core::{
  Error as CoreError,
  engagement::{EngagementKind, EngagementPatch, NewEngagement},
  group::{GroupPatch, NewGroup},
  product::{NewProduct, Product, ProductPatch},
  store::CatalogStore,
  user::{NewUser, User, UserPatch},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(username: &str) -> NewUser {
  NewUser {
    username:      username.into(),
    email:         format!("{username}@example.com"),
    password_hash: "$argon2id$stub".into(),
    group_ids:     vec![],
  }
}

async fn add_user(s: &SqliteStore, username: &str) -> User {
  s.create_user(new_user(username)).await.unwrap()
}

async fn add_product(s: &SqliteStore, name: &str) -> Product {
  s.create_product(NewProduct {
    name:        name.into(),
    description: format!("{name} description"),
  })
  .await
  .unwrap()
}

async fn engage(
  s: &SqliteStore,
  user: &User,
  product: &Product,
  kind: EngagementKind,
) -> tally_core::engagement::Engagement {
  s.create_engagement(NewEngagement {
    user_id:    user.user_id,
    product_id: product.product_id,
    kind,
  })
  .await
  .unwrap()
}

async fn counts(s: &SqliteStore, product: &Product) -> (u64, u64) {
  let likes = s
    .count_engagements(product.product_id, EngagementKind::Like)
    .await
    .unwrap();
  let dislikes = s
    .count_engagements(product.product_id, EngagementKind::Dislike)
    .await
    .unwrap();
  (likes, dislikes)
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;

  let user = add_user(&s, "alice").await;
  assert_eq!(user.username, "alice");

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, user);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(999).await.unwrap().is_none());
}

#[tokio::test]
async fn get_user_by_username() {
  let s = store().await;
  let user = add_user(&s, "alice").await;

  let fetched = s.get_user_by_username("alice").await.unwrap().unwrap();
  assert_eq!(fetched.user_id, user.user_id);
  assert!(s.get_user_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_a_validation_error() {
  let s = store().await;
  add_user(&s, "alice").await;

  let err = s.create_user(new_user("alice")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "username", .. })
  ));
}

#[tokio::test]
async fn user_group_memberships_roundtrip() {
  let s = store().await;
  let editors = s
    .create_group(NewGroup { name: "editors".into() })
    .await
    .unwrap();
  let admins = s
    .create_group(NewGroup { name: "admins".into() })
    .await
    .unwrap();

  let mut input = new_user("alice");
  input.group_ids = vec![admins.group_id, editors.group_id];
  let user = s.create_user(input).await.unwrap();

  // Stored and returned in ascending id order.
  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.group_ids, vec![editors.group_id, admins.group_id]);
}

#[tokio::test]
async fn create_user_with_unknown_group_fails() {
  let s = store().await;

  let mut input = new_user("alice");
  input.group_ids = vec![42];
  let err = s.create_user(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "groups", .. })
  ));
}

#[tokio::test]
async fn update_user_replaces_membership_set() {
  let s = store().await;
  let editors = s
    .create_group(NewGroup { name: "editors".into() })
    .await
    .unwrap();
  let admins = s
    .create_group(NewGroup { name: "admins".into() })
    .await
    .unwrap();

  let mut input = new_user("alice");
  input.group_ids = vec![editors.group_id];
  let user = s.create_user(input).await.unwrap();

  let patch = UserPatch {
    group_ids: Some(vec![admins.group_id]),
    ..UserPatch::default()
  };
  let updated = s.update_user(user.user_id, patch).await.unwrap();
  assert_eq!(updated.group_ids, vec![admins.group_id]);

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.group_ids, vec![admins.group_id]);
}

#[tokio::test]
async fn update_user_partial_leaves_other_fields() {
  let s = store().await;
  let user = add_user(&s, "alice").await;

  let patch = UserPatch {
    email: Some("new@example.com".into()),
    ..UserPatch::default()
  };
  let updated = s.update_user(user.user_id, patch).await.unwrap();
  assert_eq!(updated.username, "alice");
  assert_eq!(updated.email, "new@example.com");
  assert_eq!(updated.created_at, user.created_at);
}

#[tokio::test]
async fn list_users_newest_first() {
  let s = store().await;
  let a = add_user(&s, "first").await;
  let b = add_user(&s, "second").await;
  let c = add_user(&s, "third").await;

  let users = s.list_users().await.unwrap();
  let ids: Vec<i64> = users.iter().map(|u| u.user_id).collect();
  assert_eq!(ids, vec![c.user_id, b.user_id, a.user_id]);
}

#[tokio::test]
async fn delete_user_missing_returns_not_found() {
  let s = store().await;
  let err = s.delete_user(7).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(7))));
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn group_crud_roundtrip() {
  let s = store().await;

  let group = s
    .create_group(NewGroup { name: "editors".into() })
    .await
    .unwrap();
  assert_eq!(
    s.get_group(group.group_id).await.unwrap().unwrap().name,
    "editors"
  );

  let renamed = s
    .update_group(group.group_id, GroupPatch { name: Some("writers".into()) })
    .await
    .unwrap();
  assert_eq!(renamed.name, "writers");

  s.delete_group(group.group_id).await.unwrap();
  assert!(s.get_group(group.group_id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_group_name_is_a_validation_error() {
  let s = store().await;
  s.create_group(NewGroup { name: "editors".into() })
    .await
    .unwrap();

  let err = s
    .create_group(NewGroup { name: "editors".into() })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "name", .. })
  ));
}

#[tokio::test]
async fn deleting_a_group_removes_memberships_not_users() {
  let s = store().await;
  let editors = s
    .create_group(NewGroup { name: "editors".into() })
    .await
    .unwrap();

  let mut input = new_user("alice");
  input.group_ids = vec![editors.group_id];
  let user = s.create_user(input).await.unwrap();

  s.delete_group(editors.group_id).await.unwrap();

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert!(fetched.group_ids.is_empty());
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_product() {
  let s = store().await;

  let product = add_product(&s, "widget").await;
  let fetched = s.get_product(product.product_id).await.unwrap().unwrap();
  assert_eq!(fetched, product);
}

#[tokio::test]
async fn update_product_keeps_created_at() {
  let s = store().await;
  let product = add_product(&s, "widget").await;

  let patch = ProductPatch {
    name: Some("gadget".into()),
    ..ProductPatch::default()
  };
  let updated = s.update_product(product.product_id, patch).await.unwrap();
  assert_eq!(updated.name, "gadget");
  assert_eq!(updated.description, product.description);
  assert_eq!(updated.created_at, product.created_at);
}

#[tokio::test]
async fn update_product_missing_returns_not_found() {
  let s = store().await;
  let err = s
    .update_product(3, ProductPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ProductNotFound(3))));
}

#[tokio::test]
async fn list_products_in_id_order() {
  let s = store().await;
  let a = add_product(&s, "one").await;
  let b = add_product(&s, "two").await;

  let products = s.list_products().await.unwrap();
  let ids: Vec<i64> = products.iter().map(|p| p.product_id).collect();
  assert_eq!(ids, vec![a.product_id, b.product_id]);
}

// ─── Derived counts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_product_counts_zero() {
  let s = store().await;
  let product = add_product(&s, "widget").await;
  assert_eq!(counts(&s, &product).await, (0, 0));
}

#[tokio::test]
async fn nonexistent_product_counts_zero() {
  let s = store().await;
  assert_eq!(
    s.count_engagements(999, EngagementKind::Like).await.unwrap(),
    0
  );
}

#[tokio::test]
async fn likes_count_matches_distinct_users() {
  let s = store().await;
  let product = add_product(&s, "widget").await;

  for name in ["alice", "bob", "carol"] {
    let user = add_user(&s, name).await;
    engage(&s, &user, &product, EngagementKind::Like).await;
  }

  assert_eq!(counts(&s, &product).await, (3, 0));
}

#[tokio::test]
async fn counts_partition_by_product() {
  let s = store().await;
  let p = add_product(&s, "widget").await;
  let q = add_product(&s, "gadget").await;
  let alice = add_user(&s, "alice").await;
  let bob = add_user(&s, "bob").await;

  engage(&s, &alice, &p, EngagementKind::Like).await;
  engage(&s, &bob, &p, EngagementKind::Dislike).await;
  engage(&s, &alice, &q, EngagementKind::Dislike).await;

  assert_eq!(counts(&s, &p).await, (1, 1));
  assert_eq!(counts(&s, &q).await, (0, 1));
}

// ─── Engagement uniqueness ───────────────────────────────────────────────────

#[tokio::test]
async fn second_engagement_for_same_pair_fails() {
  let s = store().await;
  let product = add_product(&s, "widget").await;
  let alice = add_user(&s, "alice").await;

  engage(&s, &alice, &product, EngagementKind::Like).await;

  let err = s
    .create_engagement(NewEngagement {
      user_id:    alice.user_id,
      product_id: product.product_id,
      kind:       EngagementKind::Dislike,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::DuplicateEngagement { .. })
  ));

  // The original engagement is untouched.
  assert_eq!(counts(&s, &product).await, (1, 0));
}

#[tokio::test]
async fn same_user_may_engage_distinct_products() {
  let s = store().await;
  let p = add_product(&s, "widget").await;
  let q = add_product(&s, "gadget").await;
  let alice = add_user(&s, "alice").await;

  engage(&s, &alice, &p, EngagementKind::Like).await;
  engage(&s, &alice, &q, EngagementKind::Like).await;

  assert_eq!(counts(&s, &p).await, (1, 0));
  assert_eq!(counts(&s, &q).await, (1, 0));
}

#[tokio::test]
async fn engagement_with_unknown_user_fails() {
  let s = store().await;
  let product = add_product(&s, "widget").await;

  let err = s
    .create_engagement(NewEngagement {
      user_id:    999,
      product_id: product.product_id,
      kind:       EngagementKind::Like,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "user", .. })
  ));
}

#[tokio::test]
async fn engagement_with_unknown_product_fails() {
  let s = store().await;
  let alice = add_user(&s, "alice").await;

  let err = s
    .create_engagement(NewEngagement {
      user_id:    alice.user_id,
      product_id: 999,
      kind:       EngagementKind::Like,
    })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Validation { field: "product", .. })
  ));
}

// ─── Engagement updates ──────────────────────────────────────────────────────

#[tokio::test]
async fn polarity_flip_moves_one_count() {
  let s = store().await;
  let product = add_product(&s, "widget").await;
  let alice = add_user(&s, "alice").await;
  let bob = add_user(&s, "bob").await;

  let e = engage(&s, &alice, &product, EngagementKind::Dislike).await;
  engage(&s, &bob, &product, EngagementKind::Dislike).await;
  assert_eq!(counts(&s, &product).await, (0, 2));

  let patch = EngagementPatch {
    kind: Some(EngagementKind::Like),
    ..EngagementPatch::default()
  };
  let updated = s.update_engagement(e.engagement_id, patch).await.unwrap();
  assert_eq!(updated.kind, EngagementKind::Like);
  assert_eq!(updated.created_at, e.created_at);

  // Visible on the very next read; bob's engagement untouched.
  assert_eq!(counts(&s, &product).await, (1, 1));
}

#[tokio::test]
async fn moving_engagement_onto_taken_pair_fails() {
  let s = store().await;
  let p = add_product(&s, "widget").await;
  let q = add_product(&s, "gadget").await;
  let alice = add_user(&s, "alice").await;

  engage(&s, &alice, &p, EngagementKind::Like).await;
  let e = engage(&s, &alice, &q, EngagementKind::Like).await;

  let patch = EngagementPatch {
    product_id: Some(p.product_id),
    ..EngagementPatch::default()
  };
  let err = s
    .update_engagement(e.engagement_id, patch)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::DuplicateEngagement { .. })
  ));
}

#[tokio::test]
async fn update_engagement_missing_returns_not_found() {
  let s = store().await;
  let err = s
    .update_engagement(5, EngagementPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::EngagementNotFound(5))));
}

// ─── Cascades ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_user_removes_their_engagements() {
  let s = store().await;
  let product = add_product(&s, "widget").await;
  let alice = add_user(&s, "alice").await;
  let bob = add_user(&s, "bob").await;

  let e = engage(&s, &alice, &product, EngagementKind::Like).await;
  engage(&s, &bob, &product, EngagementKind::Like).await;
  assert_eq!(counts(&s, &product).await, (2, 0));

  s.delete_user(alice.user_id).await.unwrap();

  assert!(s.get_engagement(e.engagement_id).await.unwrap().is_none());
  assert_eq!(counts(&s, &product).await, (1, 0));
}

#[tokio::test]
async fn deleting_a_product_removes_its_engagements() {
  let s = store().await;
  let p = add_product(&s, "widget").await;
  let q = add_product(&s, "gadget").await;
  let alice = add_user(&s, "alice").await;

  let e = engage(&s, &alice, &p, EngagementKind::Like).await;
  engage(&s, &alice, &q, EngagementKind::Dislike).await;

  s.delete_product(p.product_id).await.unwrap();

  assert!(s.get_engagement(e.engagement_id).await.unwrap().is_none());
  // The other product's engagement survives.
  assert_eq!(counts(&s, &q).await, (0, 1));
}

#[tokio::test]
async fn deleting_an_engagement_updates_counts() {
  let s = store().await;
  let product = add_product(&s, "widget").await;
  let alice = add_user(&s, "alice").await;

  let e = engage(&s, &alice, &product, EngagementKind::Like).await;
  assert_eq!(counts(&s, &product).await, (1, 0));

  s.delete_engagement(e.engagement_id).await.unwrap();
  assert_eq!(counts(&s, &product).await, (0, 0));

  let err = s.delete_engagement(e.engagement_id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::EngagementNotFound(_))
  ));
}
