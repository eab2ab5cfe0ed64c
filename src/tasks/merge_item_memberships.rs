use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::sync::Arc;

use crate::error::Result;
use crate::execution::Task;
use crate::models::{Actor, Item, ItemView, OneOrMany};
use crate::store::ItemStore;

/// Attach each item's memberships (own and inherited) to it.
///
/// One item in gives one view out, a list gives a list. Memberships are only
/// read.
#[derive(Debug, Clone)]
pub struct MergeItemMembershipsIntoItems {
    actor: Actor,
    store: Arc<dyn ItemStore>,
}

impl MergeItemMembershipsIntoItems {
    pub fn new(actor: Actor, store: Arc<dyn ItemStore>) -> Self {
        Self { actor, store }
    }
}

#[async_trait]
impl Task for MergeItemMembershipsIntoItems {
    type Input = OneOrMany<Item>;
    type Output = OneOrMany<ItemView>;

    fn name(&self) -> &'static str {
        "merge-item-memberships-into-items"
    }

    fn message(&self) -> String {
        format!("merge item memberships for {}", self.actor.id())
    }

    async fn run(
        &self,
        items: OneOrMany<Item>,
        conn: &mut SqliteConnection,
    ) -> Result<OneOrMany<ItemView>> {
        Ok(match items {
            OneOrMany::One(item) => {
                let memberships = self.store.memberships(conn, &item).await?;
                OneOrMany::One(ItemView::with_memberships(item, memberships))
            }
            OneOrMany::Many(items) => {
                let mut views = Vec::with_capacity(items.len());
                for item in items {
                    let memberships = self.store.memberships(conn, &item).await?;
                    views.push(ItemView::with_memberships(item, memberships));
                }
                OneOrMany::Many(views)
            }
        })
    }
}
