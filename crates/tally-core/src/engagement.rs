//! Engagement — a single user's LIKE or DISLIKE reaction to a product.
//!
//! At most one engagement may exist per `(user, product)` pair; the store
//! enforces this with a uniqueness constraint, and a second create for the
//! same pair fails rather than silently overwriting. Flipping polarity is an
//! update to the existing record, visible in the product's derived counts on
//! the very next read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reaction polarity. The wire form is the uppercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngagementKind {
  Like,
  Dislike,
}

/// A persisted engagement record.
#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
  pub engagement_id: i64,
  pub user_id:       i64,
  pub product_id:    i64,
  pub kind:          EngagementKind,
  /// Set once at creation; never writable afterwards.
  pub created_at:    DateTime<Utc>,
}

/// Input for creating an [`Engagement`]. `engagement_id` and `created_at`
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEngagement {
  pub user_id:    i64,
  pub product_id: i64,
  pub kind:       EngagementKind,
}

/// A partial update to an [`Engagement`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct EngagementPatch {
  pub user_id:    Option<i64>,
  pub product_id: Option<i64>,
  pub kind:       Option<EngagementKind>,
}
