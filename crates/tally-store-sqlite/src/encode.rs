//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Engagement kinds are
//! stored as the uppercase wire strings.

use chrono::{DateTime, Utc};
use tally_core::{
  engagement::{Engagement, EngagementKind},
  product::Product,
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── EngagementKind ──────────────────────────────────────────────────────────

pub fn encode_kind(k: EngagementKind) -> &'static str {
  match k {
    EngagementKind::Like => "LIKE",
    EngagementKind::Dislike => "DISLIKE",
  }
}

pub fn decode_kind(s: &str) -> Result<EngagementKind> {
  match s {
    "LIKE" => Ok(EngagementKind::Like),
    "DISLIKE" => Ok(EngagementKind::Dislike),
    other => Err(Error::UnknownKind(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns read directly from a `users` row. Group memberships come from
/// the join table and are supplied separately.
pub struct RawUser {
  pub user_id:       i64,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self, group_ids: Vec<i64>) -> Result<User> {
    Ok(User {
      user_id:       self.user_id,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      group_ids,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw columns read directly from a `products` row.
pub struct RawProduct {
  pub product_id:  i64,
  pub name:        String,
  pub description: String,
  pub created_at:  String,
}

impl RawProduct {
  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id:  self.product_id,
      name:        self.name,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw columns read directly from an `engagements` row.
pub struct RawEngagement {
  pub engagement_id: i64,
  pub user_id:       i64,
  pub product_id:    i64,
  pub kind:          String,
  pub created_at:    String,
}

impl RawEngagement {
  pub fn into_engagement(self) -> Result<Engagement> {
    Ok(Engagement {
      engagement_id: self.engagement_id,
      user_id:       self.user_id,
      product_id:    self.product_id,
      kind:          decode_kind(&self.kind)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
