//! Item repository
//!
//! - create: single INSERT ... RETURNING inside a transaction
//! - list: newest first (id descending), bounded by a limit

use chrono::NaiveDateTime;
use sqlx::{Connection, FromRow, PgConnection};

use crate::db::DbError;
use crate::models::NewItem;

/// Rows returned by `list` when the caller has no preference
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Item record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Store-side insertion time; nullable in the column definition
    pub created_at: Option<NaiveDateTime>,
}

/// Item repository
pub struct ItemRepo<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ItemRepo<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert one item, returning it with its store-assigned id and timestamp.
    ///
    /// The transaction rolls back if anything fails before commit.
    pub async fn create(&mut self, item: NewItem) -> Result<Item, DbError> {
        let mut tx = self.conn.begin().await?;

        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(item.name.as_str())
        .bind(item.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Up to `limit` items, most recently created first.
    pub async fn list(&mut self, limit: i64) -> Result<Vec<Item>, DbError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, created_at
            FROM items
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(items)
    }
}
