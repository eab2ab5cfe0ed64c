//! Tag and category listings.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::sync::Arc;

use crate::error::{Result, TaskError};
use crate::execution::Task;
use crate::models::{Actor, ItemId, TagId};
use crate::services::PublicItemService;
use crate::store::ItemStore;

/// Ids of public items carrying a tag directly.
#[derive(Debug, Clone)]
pub struct GetPublicItemIdsWithTag {
    actor: Actor,
    service: PublicItemService,
}

impl GetPublicItemIdsWithTag {
    pub fn new(actor: Actor, service: PublicItemService) -> Self {
        Self { actor, service }
    }
}

#[async_trait]
impl Task for GetPublicItemIdsWithTag {
    type Input = TagId;
    type Output = Vec<ItemId>;

    fn name(&self) -> &'static str {
        "get-public-item-ids-with-tag"
    }

    fn message(&self) -> String {
        format!("get public item ids with tag for {}", self.actor.id())
    }

    async fn run(&self, tag_id: TagId, conn: &mut SqliteConnection) -> Result<Vec<ItemId>> {
        self.service.get_public_item_ids_by_tag(tag_id, conn).await
    }
}

/// Ids of items in any of the given categories.
///
/// No visibility check happens here; the category listing filters afterwards.
#[derive(Debug, Clone)]
pub struct GetItemsByCategory {
    actor: Actor,
    service: PublicItemService,
}

impl GetItemsByCategory {
    pub fn new(actor: Actor, service: PublicItemService) -> Self {
        Self { actor, service }
    }
}

#[async_trait]
impl Task for GetItemsByCategory {
    type Input = Vec<TagId>;
    type Output = Vec<ItemId>;

    fn name(&self) -> &'static str {
        "get-items-by-category"
    }

    fn message(&self) -> String {
        format!("get items by category for {}", self.actor.id())
    }

    async fn run(
        &self,
        category_ids: Vec<TagId>,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<ItemId>> {
        self.service.get_items_by_category(&category_ids, conn).await
    }
}

/// Categories attached to an item.
#[derive(Debug, Clone)]
pub struct GetItemCategories {
    actor: Actor,
    service: PublicItemService,
    store: Arc<dyn ItemStore>,
}

impl GetItemCategories {
    pub fn new(actor: Actor, service: PublicItemService, store: Arc<dyn ItemStore>) -> Self {
        Self {
            actor,
            service,
            store,
        }
    }
}

#[async_trait]
impl Task for GetItemCategories {
    type Input = ItemId;
    type Output = Vec<TagId>;

    fn name(&self) -> &'static str {
        "get-item-categories"
    }

    fn message(&self) -> String {
        format!("get item categories for {}", self.actor.id())
    }

    async fn run(&self, item_id: ItemId, conn: &mut SqliteConnection) -> Result<Vec<TagId>> {
        let item = self
            .store
            .get(conn, item_id)
            .await?
            .ok_or(TaskError::ItemNotFound(item_id))?;

        self.service.get_item_categories(&item, conn).await
    }
}
