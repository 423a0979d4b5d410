//! Hyperlinked resource references.
//!
//! Representations render cross-references as addressable paths
//! (`/products/3/`); request bodies accept either that form or the plain
//! integer id.

use serde::Deserialize;

use crate::error::ApiError;

/// Render the canonical path for `id` within `collection`.
pub fn resource_url(collection: &str, id: i64) -> String {
  format!("/{collection}/{id}/")
}

/// A reference to another resource, as found in a request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
  Id(i64),
  Url(String),
}

impl ResourceRef {
  /// Resolve to an id. A URL form must address `collection`; anything else
  /// is a validation error naming `field`.
  pub fn resolve(
    &self,
    field: &'static str,
    collection: &str,
  ) -> Result<i64, ApiError> {
    match self {
      ResourceRef::Id(id) => Ok(*id),
      ResourceRef::Url(path) => {
        let mut segments = path
          .trim_start_matches('/')
          .trim_end_matches('/')
          .split('/');
        match (segments.next(), segments.next(), segments.next()) {
          (Some(c), Some(id), None) if c == collection => {
            id.parse().map_err(|_| ApiError::Validation {
              field,
              message: format!("cannot parse an id out of {path:?}"),
            })
          }
          _ => Err(ApiError::Validation {
            field,
            message: format!("expected a /{collection}/ reference, got {path:?}"),
          }),
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_trailing_slash_paths() {
    assert_eq!(resource_url("products", 3), "/products/3/");
  }

  #[test]
  fn resolves_plain_ids() {
    let r = ResourceRef::Id(7);
    assert_eq!(r.resolve("user", "users").unwrap(), 7);
  }

  #[test]
  fn resolves_hyperlinked_paths() {
    let r = ResourceRef::Url("/products/3/".into());
    assert_eq!(r.resolve("product", "products").unwrap(), 3);

    // The trailing slash is optional on input.
    let r = ResourceRef::Url("/products/3".into());
    assert_eq!(r.resolve("product", "products").unwrap(), 3);
  }

  #[test]
  fn rejects_wrong_collection() {
    let r = ResourceRef::Url("/users/3/".into());
    let err = r.resolve("product", "products").unwrap_err();
    assert!(matches!(err, ApiError::Validation { field: "product", .. }));
  }

  #[test]
  fn rejects_unparseable_ids() {
    let r = ResourceRef::Url("/products/three/".into());
    assert!(r.resolve("product", "products").is_err());

    let r = ResourceRef::Url("/products/3/extra/".into());
    assert!(r.resolve("product", "products").is_err());
  }

  #[test]
  fn deserializes_both_forms() {
    let r: ResourceRef = serde_json::from_str("3").unwrap();
    assert!(matches!(r, ResourceRef::Id(3)));

    let r: ResourceRef = serde_json::from_str("\"/users/3/\"").unwrap();
    assert!(matches!(r, ResourceRef::Url(_)));
  }
}
