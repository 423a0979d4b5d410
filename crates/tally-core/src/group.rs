//! Group — an opaque authorization grouping referenced by users.
//!
//! Tally stores and serves groups but attaches no semantics to them; they
//! exist so user records can carry memberships.

use crate::{Error, Result};

/// Maximum length of a group name, in characters.
pub const NAME_MAX: usize = 150;

/// A named authorization group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
  pub group_id: i64,
  pub name:     String,
}

/// Input for creating a [`Group`]. `group_id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewGroup {
  pub name: String,
}

impl NewGroup {
  pub fn validate(&self) -> Result<()> {
    validate_name(&self.name)
  }
}

/// A partial update to a [`Group`].
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
  pub name: Option<String>,
}

impl GroupPatch {
  pub fn validate(&self) -> Result<()> {
    match &self.name {
      Some(name) => validate_name(name),
      None => Ok(()),
    }
  }
}

fn validate_name(name: &str) -> Result<()> {
  if name.is_empty() {
    return Err(Error::validation("name", "must not be empty"));
  }
  if name.chars().count() > NAME_MAX {
    return Err(Error::validation(
      "name",
      format!("must be at most {NAME_MAX} characters"),
    ));
  }
  Ok(())
}
