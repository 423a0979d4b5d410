//! Product — a catalog entry users can react to.
//!
//! A product row never stores its like/dislike tallies. Those are derived
//! counts, recomputed from the engagement table on every read; see
//! [`CatalogStore::count_engagements`](crate::store::CatalogStore::count_engagements).

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Maximum length of a product name, in characters.
pub const NAME_MAX: usize = 30;
/// Maximum length of a product description, in characters.
pub const DESCRIPTION_MAX: usize = 255;

/// A persisted product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
  pub product_id:  i64,
  pub name:        String,
  pub description: String,
  /// Set once at creation; never writable afterwards.
  pub created_at:  DateTime<Utc>,
}

/// Input for creating a [`Product`]. `product_id` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name:        String,
  pub description: String,
}

impl NewProduct {
  pub fn validate(&self) -> Result<()> {
    validate_name(&self.name)?;
    validate_description(&self.description)
  }
}

/// A partial update to a [`Product`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
}

impl ProductPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate_name(name)?;
    }
    if let Some(description) = &self.description {
      validate_description(description)?;
    }
    Ok(())
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

fn validate_description(description: &str) -> Result<()> {
  if description.chars().count() > DESCRIPTION_MAX {
    return Err(Error::validation(
      "description",
      format!("must be at most {DESCRIPTION_MAX} characters"),
    ));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_name_at_limit() {
    let product = NewProduct {
      name:        "x".repeat(NAME_MAX),
      description: String::new(),
    };
    assert!(product.validate().is_ok());
  }

  #[test]
  fn rejects_name_over_limit() {
    let product = NewProduct {
      name:        "x".repeat(NAME_MAX + 1),
      description: String::new(),
    };
    let err = product.validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "name", .. }));
  }

  #[test]
  fn rejects_overlong_description() {
    let product = NewProduct {
      name:        "widget".into(),
      description: "d".repeat(DESCRIPTION_MAX + 1),
    };
    let err = product.validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "description", .. }));
  }
}
