//! # Item Store
//!
//! The generic item manager the public surface delegates to. [`ItemStore`]
//! is the seam: every method runs on the caller's connection so primitive
//! tasks join whatever transaction the runner opened. [`SqliteItemStore`] is
//! the reference adapter over the models, and [`ItemTaskManager`] builds the
//! primitive tasks (get, children, copy) the public pipelines embed.

pub mod manager;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::fmt;

use crate::error::Result;
use crate::models::{Item, ItemId, ItemMembership, MemberId, PermissionLevel};

pub use manager::ItemTaskManager;
pub use sqlite::SqliteItemStore;

/// Options for copying a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOptions {
    /// Destination parent; `None` copies to the root.
    pub parent_id: Option<ItemId>,
    /// Copy tag associations along with the items. Off by default so a copy
    /// of a public item does not end up public as well.
    #[serde(default)]
    pub should_copy_tags: bool,
}


#[async_trait]
pub trait ItemStore: Send + Sync + fmt::Debug {
    async fn get(&self, conn: &mut SqliteConnection, id: ItemId) -> Result<Option<Item>>;

    /// Direct children of `parent`, oldest first
    async fn children(&self, conn: &mut SqliteConnection, parent: &Item) -> Result<Vec<Item>>;

    /// Memberships on `item` and its ancestors
    async fn memberships(
        &self,
        conn: &mut SqliteConnection,
        item: &Item,
    ) -> Result<Vec<ItemMembership>>;

    /// Highest permission `member_id` holds on `item`
    async fn permission(
        &self,
        conn: &mut SqliteConnection,
        member_id: MemberId,
        item: &Item,
    ) -> Result<Option<PermissionLevel>>;

    /// Copy `source` and its subtree under `parent` (or to the root) and
    /// return the new root. Authorization is the caller's job.
    async fn copy_tree(
        &self,
        conn: &mut SqliteConnection,
        source: &Item,
        parent: Option<&Item>,
        copier: MemberId,
        copy_tags: bool,
    ) -> Result<Item>;
}
