use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use super::{ItemId, TagId};

/// Tag represents a named classification (public, published, categories)
/// Maps to `tags` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// ItemTag associates one tag with one item
/// Maps to `item_tags` table, unique per `(item_id, tag_id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemTag {
    pub item_id: ItemId,
    pub tag_id: TagId,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a tag with a fixed id (configured tags are known up front)
    pub async fn create_with_id(
        conn: &mut SqliteConnection,
        id: TagId,
        name: &str,
    ) -> Result<Tag, sqlx::Error> {
        sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut *conn)
            .await?;

        Ok(Tag {
            id,
            name: name.to_string(),
        })
    }

    /// Create a tag with a generated id
    pub async fn create(conn: &mut SqliteConnection, name: &str) -> Result<Tag, sqlx::Error> {
        Self::create_with_id(conn, TagId::new(), name).await
    }
}

impl ItemTag {
    /// Attach a tag to an item; attaching twice is a no-op
    pub async fn create(
        conn: &mut SqliteConnection,
        item_id: ItemId,
        tag_id: TagId,
    ) -> Result<ItemTag, sqlx::Error> {
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO item_tags (item_id, tag_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (item_id, tag_id) DO NOTHING
            "#,
        )
        .bind(item_id)
        .bind(tag_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(ItemTag {
            item_id,
            tag_id,
            created_at,
        })
    }

    /// Tags attached directly to an item, oldest first
    pub async fn for_item(
        conn: &mut SqliteConnection,
        item_id: ItemId,
    ) -> Result<Vec<ItemTag>, sqlx::Error> {
        sqlx::query_as::<_, ItemTag>(
            r#"
            SELECT item_id, tag_id, created_at
            FROM item_tags
            WHERE item_id = ?
            ORDER BY created_at, tag_id
            "#,
        )
        .bind(item_id)
        .fetch_all(&mut *conn)
        .await
    }
}
