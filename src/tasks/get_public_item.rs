use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, TaskError};
use crate::execution::Task;
use crate::models::{Actor, Item, ItemId};
use crate::services::PublicItemService;
use crate::store::ItemStore;

/// Fetch an item and require it to be public.
///
/// Fails with [`TaskError::ItemNotFound`] for unknown ids and
/// [`TaskError::ItemNotPublic`] when neither the item nor an ancestor carries
/// the public tag. The item is returned unchanged.
#[derive(Debug, Clone)]
pub struct GetPublicItem {
    actor: Actor,
    service: PublicItemService,
    store: Arc<dyn ItemStore>,
}

impl GetPublicItem {
    pub fn new(actor: Actor, service: PublicItemService, store: Arc<dyn ItemStore>) -> Self {
        Self {
            actor,
            service,
            store,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}

#[async_trait]
impl Task for GetPublicItem {
    type Input = ItemId;
    type Output = Item;

    fn name(&self) -> &'static str {
        "get-public-item"
    }

    fn message(&self) -> String {
        format!("get public item for {}", self.actor.id())
    }

    async fn run(&self, id: ItemId, conn: &mut SqliteConnection) -> Result<Item> {
        let item = self
            .store
            .get(conn, id)
            .await?
            .ok_or(TaskError::ItemNotFound(id))?;

        if !self.service.has_public_tag(&item, conn).await? {
            debug!(item_id = %id, actor = %self.actor.id(), "Item is not public");
            return Err(TaskError::ItemNotPublic(id));
        }

        Ok(item)
    }
}
