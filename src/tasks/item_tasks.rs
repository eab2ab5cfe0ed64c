//! Primitive item tasks produced by [`ItemTaskManager`](crate::store::ItemTaskManager).

use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::sync::Arc;

use crate::error::{Result, TaskError};
use crate::execution::Task;
use crate::models::{Actor, Item, ItemId, Member};
use crate::store::{CopyOptions, ItemStore};

/// Fetch an item by id.
///
/// Visibility is not checked here; pipelines put a public gate in front of
/// or after this task.
#[derive(Debug, Clone)]
pub struct GetItem {
    actor: Actor,
    store: Arc<dyn ItemStore>,
}

impl GetItem {
    pub fn new(actor: Actor, store: Arc<dyn ItemStore>) -> Self {
        Self { actor, store }
    }
}

#[async_trait]
impl Task for GetItem {
    type Input = ItemId;
    type Output = Item;

    fn name(&self) -> &'static str {
        "get-item"
    }

    fn message(&self) -> String {
        format!("get item for {}", self.actor.id())
    }

    async fn run(&self, id: ItemId, conn: &mut SqliteConnection) -> Result<Item> {
        self.store
            .get(conn, id)
            .await?
            .ok_or(TaskError::ItemNotFound(id))
    }
}

/// List the direct children of an item.
#[derive(Debug, Clone)]
pub struct GetItemChildren {
    actor: Actor,
    store: Arc<dyn ItemStore>,
}

impl GetItemChildren {
    pub fn new(actor: Actor, store: Arc<dyn ItemStore>) -> Self {
        Self { actor, store }
    }
}

#[async_trait]
impl Task for GetItemChildren {
    type Input = Item;
    type Output = Vec<Item>;

    fn name(&self) -> &'static str {
        "get-item-children"
    }

    fn message(&self) -> String {
        format!("get item children for {}", self.actor.id())
    }

    async fn run(&self, parent: Item, conn: &mut SqliteConnection) -> Result<Vec<Item>> {
        self.store.children(conn, &parent).await
    }
}

/// Copy an item and its subtree on behalf of an authenticated member.
#[derive(Debug, Clone)]
pub struct CopyItem {
    member: Member,
    options: CopyOptions,
    store: Arc<dyn ItemStore>,
}

impl CopyItem {
    pub fn new(member: Member, options: CopyOptions, store: Arc<dyn ItemStore>) -> Self {
        Self {
            member,
            options,
            store,
        }
    }

    pub fn options(&self) -> CopyOptions {
        self.options
    }
}

#[async_trait]
impl Task for CopyItem {
    type Input = Item;
    type Output = Item;

    fn name(&self) -> &'static str {
        "copy-item"
    }

    fn message(&self) -> String {
        match self.options.parent_id {
            Some(parent_id) => format!("copy item into {parent_id} for {}", self.member.id),
            None => format!("copy item to root for {}", self.member.id),
        }
    }

    async fn run(&self, source: Item, conn: &mut SqliteConnection) -> Result<Item> {
        let parent = match self.options.parent_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .get(conn, parent_id)
                    .await?
                    .ok_or(TaskError::ItemNotFound(parent_id))?;

                let permission = self.store.permission(conn, self.member.id, &parent).await?;
                if !permission.is_some_and(|level| level.can_write()) {
                    return Err(TaskError::forbidden(format!(
                        "member {} cannot write to item {parent_id}",
                        self.member.id
                    )));
                }
                Some(parent)
            }
            None => None,
        };

        self.store
            .copy_tree(
                conn,
                &source,
                parent.as_ref(),
                self.member.id,
                self.options.should_copy_tags,
            )
            .await
    }
}
