use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection};

use super::{ItemId, ItemMembership, MemberId};

/// Separator between ids in an item path.
pub const PATH_SEPARATOR: char = '.';

/// Item represents a node of the hierarchical store
/// Maps to `items` table
///
/// `path` lists the ids of every ancestor followed by the item's own id,
/// joined with [`PATH_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub description: Option<String>,
    pub path: String,
    #[sqlx(json)]
    pub extra: serde_json::Value,
    pub creator: Option<MemberId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Item for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub item_type: String,
    pub description: Option<String>,
    pub extra: serde_json::Value,
    pub creator: Option<MemberId>,
}

impl NewItem {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: "folder".to_string(),
            description: None,
            extra: serde_json::json!({ "folder": {} }),
            creator: None,
        }
    }

    pub fn with_extra(mut self, item_type: impl Into<String>, extra: serde_json::Value) -> Self {
        self.item_type = item_type.into();
        self.extra = extra;
        self
    }
}

pub(crate) const ITEM_COLUMNS: &str =
    "id, name, item_type, description, path, extra, creator, created_at, updated_at";

/// Path of a new child `id` under `parent_path`.
pub fn child_path(parent_path: Option<&str>, id: ItemId) -> String {
    match parent_path {
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{id}"),
        None => id.to_string(),
    }
}

impl Item {
    /// Id of the direct parent, if the item is not a root.
    pub fn parent_id(&self) -> Option<ItemId> {
        let mut segments = self.path.rsplit(PATH_SEPARATOR);
        segments.next();
        segments.next().and_then(|segment| segment.parse().ok())
    }

    /// Ordered child ids stored in `extra.folder.childrenOrder`.
    pub fn children_order(&self) -> Vec<ItemId> {
        self.extra
            .pointer("/folder/childrenOrder")
            .and_then(serde_json::Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(serde_json::Value::as_str)
                    .filter_map(|id| id.parse().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Insert a new item under `parent_path` (or at the root)
    pub async fn create(
        conn: &mut SqliteConnection,
        parent_path: Option<&str>,
        new_item: NewItem,
    ) -> Result<Item, sqlx::Error> {
        let id = ItemId::new();
        let now = Utc::now();
        let item = Item {
            id,
            name: new_item.name,
            item_type: new_item.item_type,
            description: new_item.description,
            path: child_path(parent_path, id),
            extra: new_item.extra,
            creator: new_item.creator,
            created_at: now,
            updated_at: now,
        };
        Self::insert(conn, &item).await?;
        Ok(item)
    }

    /// Insert a fully specified item row
    pub async fn insert(conn: &mut SqliteConnection, item: &Item) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, item_type, description, path, extra, creator, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.item_type)
        .bind(&item.description)
        .bind(&item.path)
        .bind(Json(&item.extra))
        .bind(item.creator)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Find an item by ID
    pub async fn find_by_id(
        conn: &mut SqliteConnection,
        id: ItemId,
    ) -> Result<Option<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Direct children of `parent`, oldest first
    pub async fn children(
        conn: &mut SqliteConnection,
        parent: &Item,
    ) -> Result<Vec<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM items
            WHERE path LIKE ? || '.%' AND path NOT LIKE ? || '.%.%'
            ORDER BY created_at, id
            "#
        ))
        .bind(&parent.path)
        .bind(&parent.path)
        .fetch_all(&mut *conn)
        .await
    }

    /// Every item below `root`, parents before their children
    pub async fn descendants(
        conn: &mut SqliteConnection,
        root: &Item,
    ) -> Result<Vec<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM items
            WHERE path LIKE ? || '.%'
            ORDER BY length(path), created_at, id
            "#
        ))
        .bind(&root.path)
        .fetch_all(&mut *conn)
        .await
    }

    /// Delete an item and its subtree
    pub async fn delete_tree(
        conn: &mut SqliteConnection,
        item: &Item,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM items WHERE path = ? OR path LIKE ? || '.%'")
            .bind(&item.path)
            .bind(&item.path)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

/// A single value or a list, mirrored by tasks that accept both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

/// Item as returned to callers, optionally enriched with memberships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memberships: Option<Vec<ItemMembership>>,
}

impl ItemView {
    pub fn with_memberships(item: Item, memberships: Vec<ItemMembership>) -> Self {
        Self {
            item,
            memberships: Some(memberships),
        }
    }
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        Self {
            item,
            memberships: None,
        }
    }
}
