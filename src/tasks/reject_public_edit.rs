use async_trait::async_trait;
use sqlx::SqliteConnection;
use std::convert::Infallible;

use crate::error::{Result, TaskError};
use crate::execution::Task;
use crate::models::{Actor, ItemId};

/// Mutation gate of the public surface: fails for every item id.
///
/// Runs ahead of upload and thumbnail upload. It does not look at the item,
/// so the outcome never depends on tags.
#[derive(Debug, Clone)]
pub struct RejectPublicEdit {
    actor: Actor,
}

impl RejectPublicEdit {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }
}

#[async_trait]
impl Task for RejectPublicEdit {
    type Input = ItemId;
    type Output = Infallible;

    fn name(&self) -> &'static str {
        "reject-public-edit"
    }

    fn message(&self) -> String {
        format!("reject public edit for {}", self.actor.id())
    }

    async fn run(&self, item_id: ItemId, _conn: &mut SqliteConnection) -> Result<Infallible> {
        Err(TaskError::CannotEditPublicItem(item_id))
    }
}
