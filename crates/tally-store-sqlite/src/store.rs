//! [`SqliteStore`] — the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use tally_core::{
  Error as CoreError,
  engagement::{Engagement, EngagementKind, EngagementPatch, NewEngagement},
  group::{Group, GroupPatch, NewGroup},
  product::{NewProduct, Product, ProductPatch},
  store::CatalogStore,
  user::{NewUser, User, UserPatch},
};

use crate::{
  Error, Result,
  encode::{RawEngagement, RawProduct, RawUser, encode_dt, encode_kind},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally catalog store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_exists(&self, id: i64) -> Result<bool> {
    self
      .row_exists("SELECT 1 FROM users WHERE user_id = ?1", id)
      .await
  }

  async fn group_exists(&self, id: i64) -> Result<bool> {
    self
      .row_exists("SELECT 1 FROM groups WHERE group_id = ?1", id)
      .await
  }

  async fn product_exists(&self, id: i64) -> Result<bool> {
    self
      .row_exists("SELECT 1 FROM products WHERE product_id = ?1", id)
      .await
  }

  async fn row_exists(&self, sql: &'static str, id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id], |_| Ok(true))
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  /// Verify every id in `group_ids` names an existing group.
  async fn check_groups(&self, group_ids: &[i64]) -> Result<()> {
    for gid in group_ids {
      if !self.group_exists(*gid).await? {
        return Err(
          CoreError::validation("groups", format!("group {gid} does not exist"))
            .into(),
        );
      }
    }
    Ok(())
  }
}

// ─── Constraint mapping ──────────────────────────────────────────────────────

/// True when `err` is a UNIQUE-constraint failure mentioning `column`.
fn unique_violation(err: &tokio_rusqlite::Error, column: &str) -> bool {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
    e,
    Some(msg),
  )) = err
  {
    e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
      && msg.contains(column)
  } else {
    false
  }
}

fn foreign_key_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
  )
}

/// Load a user's memberships in ascending id order.
fn user_group_ids(
  conn: &rusqlite::Connection,
  user_id: i64,
) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn
    .prepare("SELECT group_id FROM user_groups WHERE user_id = ?1 ORDER BY group_id")?;
  stmt
    .query_map(rusqlite::params![user_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()
}

const USER_COLUMNS: &str =
  "user_id, username, email, password_hash, created_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    username:      row.get(1)?,
    email:         row.get(2)?,
    password_hash: row.get(3)?,
    created_at:    row.get(4)?,
  })
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    self.check_groups(&input.group_ids).await?;

    let created_at = Utc::now();
    let NewUser {
      username,
      email,
      password_hash,
      mut group_ids,
    } = input;
    group_ids.sort_unstable();
    group_ids.dedup();

    let at_str      = encode_dt(created_at);
    let username_db = username.clone();
    let email_db    = email.clone();
    let hash_db     = password_hash.clone();
    let groups_db   = group_ids.clone();

    let user_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (username, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![username_db, email_db, hash_db, at_str],
        )?;
        let user_id = tx.last_insert_rowid();
        for gid in &groups_db {
          tx.execute(
            "INSERT INTO user_groups (user_id, group_id) VALUES (?1, ?2)",
            rusqlite::params![user_id, gid],
          )?;
        }
        tx.commit()?;
        Ok(user_id)
      })
      .await
      .map_err(|e| {
        if unique_violation(&e, "users.username") {
          Error::Core(CoreError::validation("username", "already in use"))
        } else {
          Error::Database(e)
        }
      })?;

    Ok(User {
      user_id,
      username,
      email,
      password_hash,
      group_ids,
      created_at,
    })
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw: Option<(RawUser, Vec<i64>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id],
            user_from_row,
          )
          .optional()?;
        match raw {
          None => Ok(None),
          Some(raw) => {
            let group_ids = user_group_ids(conn, raw.user_id)?;
            Ok(Some((raw, group_ids)))
          }
        }
      })
      .await?;

    raw.map(|(raw, gids)| raw.into_user(gids)).transpose()
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    let raw: Option<(RawUser, Vec<i64>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            rusqlite::params![username],
            user_from_row,
          )
          .optional()?;
        match raw {
          None => Ok(None),
          Some(raw) => {
            let group_ids = user_group_ids(conn, raw.user_id)?;
            Ok(Some((raw, group_ids)))
          }
        }
      })
      .await?;

    raw.map(|(raw, gids)| raw.into_user(gids)).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<(RawUser, Vec<i64>)> = self
      .conn
      .call(move |conn| {
        // Newest accounts first.
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users
           ORDER BY created_at DESC, user_id DESC"
        ))?;
        let raws = stmt
          .query_map([], user_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
          let group_ids = user_group_ids(conn, raw.user_id)?;
          out.push((raw, group_ids));
        }
        Ok(out)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, gids)| raw.into_user(gids))
      .collect()
  }

  async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User> {
    let Some(current) = self.get_user(id).await? else {
      return Err(CoreError::UserNotFound(id).into());
    };
    if let Some(gids) = &patch.group_ids {
      self.check_groups(gids).await?;
    }

    let username      = patch.username.unwrap_or(current.username);
    let email         = patch.email.unwrap_or(current.email);
    let password_hash = patch.password_hash.unwrap_or(current.password_hash);
    let mut group_ids = patch.group_ids.unwrap_or(current.group_ids);
    group_ids.sort_unstable();
    group_ids.dedup();

    let username_db = username.clone();
    let email_db    = email.clone();
    let hash_db     = password_hash.clone();
    let groups_db   = group_ids.clone();

    let affected = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let affected = tx.execute(
          "UPDATE users SET username = ?1, email = ?2, password_hash = ?3
           WHERE user_id = ?4",
          rusqlite::params![username_db, email_db, hash_db, id],
        )?;
        if affected > 0 {
          tx.execute(
            "DELETE FROM user_groups WHERE user_id = ?1",
            rusqlite::params![id],
          )?;
          for gid in &groups_db {
            tx.execute(
              "INSERT INTO user_groups (user_id, group_id) VALUES (?1, ?2)",
              rusqlite::params![id, gid],
            )?;
          }
        }
        tx.commit()?;
        Ok(affected)
      })
      .await
      .map_err(|e| {
        if unique_violation(&e, "users.username") {
          Error::Core(CoreError::validation("username", "already in use"))
        } else {
          Error::Database(e)
        }
      })?;

    if affected == 0 {
      return Err(CoreError::UserNotFound(id).into());
    }

    Ok(User {
      user_id: id,
      username,
      email,
      password_hash,
      group_ids,
      created_at: current.created_at,
    })
  }

  async fn delete_user(&self, id: i64) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::UserNotFound(id).into());
    }
    Ok(())
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn create_group(&self, input: NewGroup) -> Result<Group> {
    let name    = input.name;
    let name_db = name.clone();

    let group_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO groups (name) VALUES (?1)",
          rusqlite::params![name_db],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| {
        if unique_violation(&e, "groups.name") {
          Error::Core(CoreError::validation("name", "already in use"))
        } else {
          Error::Database(e)
        }
      })?;

    Ok(Group { group_id, name })
  }

  async fn get_group(&self, id: i64) -> Result<Option<Group>> {
    let group = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT group_id, name FROM groups WHERE group_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(Group {
                  group_id: row.get(0)?,
                  name:     row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(group)
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    let groups = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT group_id, name FROM groups ORDER BY group_id")?;
        let groups = stmt
          .query_map([], |row| {
            Ok(Group {
              group_id: row.get(0)?,
              name:     row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
      })
      .await?;
    Ok(groups)
  }

  async fn update_group(&self, id: i64, patch: GroupPatch) -> Result<Group> {
    let Some(current) = self.get_group(id).await? else {
      return Err(CoreError::GroupNotFound(id).into());
    };

    let name    = patch.name.unwrap_or(current.name);
    let name_db = name.clone();

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE groups SET name = ?1 WHERE group_id = ?2",
          rusqlite::params![name_db, id],
        )?)
      })
      .await
      .map_err(|e| {
        if unique_violation(&e, "groups.name") {
          Error::Core(CoreError::validation("name", "already in use"))
        } else {
          Error::Database(e)
        }
      })?;

    if affected == 0 {
      return Err(CoreError::GroupNotFound(id).into());
    }
    Ok(Group { group_id: id, name })
  }

  async fn delete_group(&self, id: i64) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM groups WHERE group_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::GroupNotFound(id).into());
    }
    Ok(())
  }

  // ── Products ──────────────────────────────────────────────────────────────

  async fn create_product(&self, input: NewProduct) -> Result<Product> {
    let created_at = Utc::now();
    let NewProduct { name, description } = input;

    let at_str  = encode_dt(created_at);
    let name_db = name.clone();
    let desc_db = description.clone();

    let product_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (name, description, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![name_db, desc_db, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Product {
      product_id,
      name,
      description,
      created_at,
    })
  }

  async fn get_product(&self, id: i64) -> Result<Option<Product>> {
    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT product_id, name, description, created_at
               FROM products WHERE product_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawProduct {
                  product_id:  row.get(0)?,
                  name:        row.get(1)?,
                  description: row.get(2)?,
                  created_at:  row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn list_products(&self) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT product_id, name, description, created_at
           FROM products ORDER BY product_id",
        )?;
        let raws = stmt
          .query_map([], |row| {
            Ok(RawProduct {
              product_id:  row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
              created_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn update_product(&self, id: i64, patch: ProductPatch) -> Result<Product> {
    let Some(current) = self.get_product(id).await? else {
      return Err(CoreError::ProductNotFound(id).into());
    };

    let name        = patch.name.unwrap_or(current.name);
    let description = patch.description.unwrap_or(current.description);
    let name_db     = name.clone();
    let desc_db     = description.clone();

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE products SET name = ?1, description = ?2
           WHERE product_id = ?3",
          rusqlite::params![name_db, desc_db, id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::ProductNotFound(id).into());
    }

    Ok(Product {
      product_id: id,
      name,
      description,
      created_at: current.created_at,
    })
  }

  async fn delete_product(&self, id: i64) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM products WHERE product_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::ProductNotFound(id).into());
    }
    Ok(())
  }

  // ── Engagements ───────────────────────────────────────────────────────────

  async fn create_engagement(&self, input: NewEngagement) -> Result<Engagement> {
    let NewEngagement {
      user_id,
      product_id,
      kind,
    } = input;

    // Name the offending field for dangling references. The UNIQUE and
    // FOREIGN KEY constraints below remain the arbiter under races.
    if !self.user_exists(user_id).await? {
      return Err(
        CoreError::validation("user", format!("user {user_id} does not exist"))
          .into(),
      );
    }
    if !self.product_exists(product_id).await? {
      return Err(
        CoreError::validation(
          "product",
          format!("product {product_id} does not exist"),
        )
        .into(),
      );
    }

    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let kind_str   = encode_kind(kind);

    let engagement_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO engagements (user_id, product_id, kind, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, product_id, kind_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| {
        if unique_violation(&e, "engagements.user_id") {
          Error::Core(CoreError::DuplicateEngagement {
            user_id,
            product_id,
          })
        } else if foreign_key_violation(&e) {
          Error::Core(CoreError::validation(
            "engagement",
            "referenced user or product does not exist",
          ))
        } else {
          Error::Database(e)
        }
      })?;

    Ok(Engagement {
      engagement_id,
      user_id,
      product_id,
      kind,
      created_at,
    })
  }

  async fn get_engagement(&self, id: i64) -> Result<Option<Engagement>> {
    let raw: Option<RawEngagement> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT engagement_id, user_id, product_id, kind, created_at
               FROM engagements WHERE engagement_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawEngagement {
                  engagement_id: row.get(0)?,
                  user_id:       row.get(1)?,
                  product_id:    row.get(2)?,
                  kind:          row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEngagement::into_engagement).transpose()
  }

  async fn list_engagements(&self) -> Result<Vec<Engagement>> {
    let raws: Vec<RawEngagement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT engagement_id, user_id, product_id, kind, created_at
           FROM engagements ORDER BY engagement_id",
        )?;
        let raws = stmt
          .query_map([], |row| {
            Ok(RawEngagement {
              engagement_id: row.get(0)?,
              user_id:       row.get(1)?,
              product_id:    row.get(2)?,
              kind:          row.get(3)?,
              created_at:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawEngagement::into_engagement).collect()
  }

  async fn update_engagement(
    &self,
    id: i64,
    patch: EngagementPatch,
  ) -> Result<Engagement> {
    let Some(current) = self.get_engagement(id).await? else {
      return Err(CoreError::EngagementNotFound(id).into());
    };

    let user_id    = patch.user_id.unwrap_or(current.user_id);
    let product_id = patch.product_id.unwrap_or(current.product_id);
    let kind       = patch.kind.unwrap_or(current.kind);

    if user_id != current.user_id && !self.user_exists(user_id).await? {
      return Err(
        CoreError::validation("user", format!("user {user_id} does not exist"))
          .into(),
      );
    }
    if product_id != current.product_id
      && !self.product_exists(product_id).await?
    {
      return Err(
        CoreError::validation(
          "product",
          format!("product {product_id} does not exist"),
        )
        .into(),
      );
    }

    let kind_str = encode_kind(kind);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE engagements SET user_id = ?1, product_id = ?2, kind = ?3
           WHERE engagement_id = ?4",
          rusqlite::params![user_id, product_id, kind_str, id],
        )?)
      })
      .await
      .map_err(|e| {
        if unique_violation(&e, "engagements.user_id") {
          Error::Core(CoreError::DuplicateEngagement {
            user_id,
            product_id,
          })
        } else {
          Error::Database(e)
        }
      })?;

    if affected == 0 {
      return Err(CoreError::EngagementNotFound(id).into());
    }

    Ok(Engagement {
      engagement_id: id,
      user_id,
      product_id,
      kind,
      created_at: current.created_at,
    })
  }

  async fn delete_engagement(&self, id: i64) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM engagements WHERE engagement_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(CoreError::EngagementNotFound(id).into());
    }
    Ok(())
  }

  // ── Derived counts ────────────────────────────────────────────────────────

  async fn count_engagements(
    &self,
    product_id: i64,
    kind: EngagementKind,
  ) -> Result<u64> {
    let kind_str = encode_kind(kind);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM engagements
           WHERE product_id = ?1 AND kind = ?2",
          rusqlite::params![product_id, kind_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }
}
