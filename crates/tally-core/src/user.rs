//! User — an account that can authenticate and engage with products.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Maximum length of a username, in characters.
pub const USERNAME_MAX: usize = 150;
/// Maximum length of an email address, in characters.
pub const EMAIL_MAX: usize = 254;

/// A persisted user account.
///
/// `password_hash` is an argon2 PHC string. It never appears in a wire
/// representation; the HTTP layer builds those field-by-field.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
  pub user_id:       i64,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  /// Groups this user belongs to, in ascending id order.
  pub group_ids:     Vec<i64>,
  pub created_at:    DateTime<Utc>,
}

/// Input for creating a [`User`]. `user_id` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub group_ids:     Vec<i64>,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    validate_username(&self.username)?;
    validate_email(&self.email)
  }
}

/// A partial update to a [`User`]. `None` fields are left unchanged.
/// `group_ids` replaces the whole membership set when present.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub username:      Option<String>,
  pub email:         Option<String>,
  pub password_hash: Option<String>,
  pub group_ids:     Option<Vec<i64>>,
}

impl UserPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(username) = &self.username {
      validate_username(username)?;
    }
    if let Some(email) = &self.email {
      validate_email(email)?;
    }
    Ok(())
  }
}

fn validate_username(username: &str) -> Result<()> {
  if username.is_empty() {
    return Err(Error::validation("username", "must not be empty"));
  }
  if username.chars().count() > USERNAME_MAX {
    return Err(Error::validation(
      "username",
      format!("must be at most {USERNAME_MAX} characters"),
    ));
  }
  Ok(())
}

fn validate_email(email: &str) -> Result<()> {
  if email.is_empty() {
    return Err(Error::validation("email", "must not be empty"));
  }
  if email.chars().count() > EMAIL_MAX {
    return Err(Error::validation(
      "email",
      format!("must be at most {EMAIL_MAX} characters"),
    ));
  }
  if !email.contains('@') {
    return Err(Error::validation("email", "must contain '@'"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
      username:      username.into(),
      email:         email.into(),
      password_hash: "$argon2id$stub".into(),
      group_ids:     vec![],
    }
  }

  #[test]
  fn accepts_ordinary_user() {
    assert!(new_user("alice", "alice@example.com").validate().is_ok());
  }

  #[test]
  fn rejects_empty_username() {
    let err = new_user("", "a@example.com").validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "username", .. }));
  }

  #[test]
  fn rejects_overlong_username() {
    let long = "x".repeat(USERNAME_MAX + 1);
    let err = new_user(&long, "a@example.com").validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "username", .. }));
  }

  #[test]
  fn rejects_email_without_at_sign() {
    let err = new_user("alice", "not-an-email").validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "email", .. }));
  }

  #[test]
  fn patch_validates_only_present_fields() {
    let patch = UserPatch {
      email: Some("bad".into()),
      ..UserPatch::default()
    };
    assert!(patch.validate().is_err());
    assert!(UserPatch::default().validate().is_ok());
  }
}
