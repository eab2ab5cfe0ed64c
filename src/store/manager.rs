use std::sync::Arc;

use super::{CopyOptions, ItemStore, SqliteItemStore};
use crate::execution::{Sequence, TaskNode};
use crate::models::{Actor, Item, ItemId, Member};
use crate::tasks::{CopyItem, GetItem, GetItemChildren};

/// Builds the primitive item tasks over one [`ItemStore`].
#[derive(Debug, Clone)]
pub struct ItemTaskManager {
    store: Arc<dyn ItemStore>,
}

impl Default for ItemTaskManager {
    fn default() -> Self {
        Self::new(Arc::new(SqliteItemStore::new()))
    }
}

impl ItemTaskManager {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn ItemStore> {
        Arc::clone(&self.store)
    }

    pub fn create_get_task(&self, actor: &Actor, id: ItemId) -> TaskNode<GetItem> {
        TaskNode::new(GetItem::new(actor.clone(), self.store()), id)
    }

    /// Children task whose parent is supplied by the caller, usually bound
    /// to an earlier task in the same sequence.
    pub fn create_get_children_task(&self, actor: &Actor) -> GetItemChildren {
        GetItemChildren::new(actor.clone(), self.store())
    }

    /// Extend `root` with a copy of the item it produces.
    pub fn create_copy_sub_task_sequence(
        &self,
        member: &Member,
        root: Sequence<Item>,
        options: CopyOptions,
    ) -> Sequence<Item> {
        let copy = CopyItem::new(member.clone(), options, self.store());
        root.pipe(copy, |item| Ok(item.clone()))
    }
}
