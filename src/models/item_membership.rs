use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use std::fmt;

use super::MemberId;

/// Permission levels granted by a membership, weakest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    /// Check if this level allows creating or copying content
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Write | Self::Admin)
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Invalid permission level: {s}")),
        }
    }
}

/// ItemMembership grants a member a permission on an item and its subtree
/// Maps to `item_memberships` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemMembership {
    pub item_path: String,
    pub member_id: MemberId,
    pub permission: PermissionLevel,
    pub created_at: DateTime<Utc>,
}

impl ItemMembership {
    /// Grant `permission` on `item_path` to a member
    pub async fn create(
        conn: &mut SqliteConnection,
        item_path: &str,
        member_id: MemberId,
        permission: PermissionLevel,
    ) -> Result<ItemMembership, sqlx::Error> {
        let created_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO item_memberships (item_path, member_id, permission, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(item_path)
        .bind(member_id)
        .bind(permission)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(ItemMembership {
            item_path: item_path.to_string(),
            member_id,
            permission,
            created_at,
        })
    }

    /// Memberships on the item at `path` and every ancestor, closest last
    pub async fn for_item_path(
        conn: &mut SqliteConnection,
        path: &str,
    ) -> Result<Vec<ItemMembership>, sqlx::Error> {
        sqlx::query_as::<_, ItemMembership>(
            r#"
            SELECT item_path, member_id, permission, created_at
            FROM item_memberships
            WHERE item_path = ? OR ? LIKE item_path || '.%'
            ORDER BY length(item_path), created_at
            "#,
        )
        .bind(path)
        .bind(path)
        .fetch_all(&mut *conn)
        .await
    }

    /// Highest permission `member_id` holds on `path`, inherited or direct
    pub async fn permission_for(
        conn: &mut SqliteConnection,
        member_id: MemberId,
        path: &str,
    ) -> Result<Option<PermissionLevel>, sqlx::Error> {
        let memberships = Self::for_item_path(conn, path).await?;

        Ok(memberships
            .into_iter()
            .filter(|m| m.member_id == member_id)
            .map(|m| m.permission)
            .max())
    }
}
