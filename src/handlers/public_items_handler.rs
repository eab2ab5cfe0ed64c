use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::PublicItemsConfig;
use crate::error::{Result, TaskError};
use crate::execution::{Sequence, SequenceResults, TaskNode, TaskOutcome, TaskRef, TaskRunner};
use crate::models::{Actor, Item, ItemId, ItemView, Member, MemberId, OneOrMany, TagId};
use crate::services::PublicItemService;
use crate::store::{CopyOptions, ItemStore, ItemTaskManager};
use crate::tasks::{
    FileLocation, GetItemCategories, GetItemsByCategory, GetPublicItem, GetPublicItemIdsWithTag,
    MergeItemMembershipsIntoItems, PathAndMimeType, RejectPublicEdit, ThumbnailSize,
};

/// Handlers for every operation of the public items surface
///
/// Each method maps to one inbound route and assembles the task pipeline for
/// it. `member` is the authenticated caller, `None` for anonymous requests,
/// which then run as the configured public actor.
#[derive(Debug, Clone)]
pub struct PublicItemsHandler {
    runner: TaskRunner,
    manager: ItemTaskManager,
    service: PublicItemService,
    public_actor_id: MemberId,
    files_path_prefix: String,
    thumbnails_path_prefix: String,
}

/// Handles to the fetch and merge steps of an item view pipeline
struct ViewPipeline {
    sequence: Sequence<OneOrMany<ItemView>>,
    fetched: TaskRef<Item>,
    merged: TaskRef<OneOrMany<ItemView>>,
}

impl PublicItemsHandler {
    pub fn new(runner: TaskRunner, manager: ItemTaskManager, config: &PublicItemsConfig) -> Self {
        Self {
            runner,
            manager,
            service: PublicItemService::from_config(config),
            public_actor_id: config.public_actor_id,
            files_path_prefix: config.files_path_prefix.clone(),
            thumbnails_path_prefix: config.thumbnails_path_prefix.clone(),
        }
    }

    /// Handler over the SQLite reference store
    pub fn from_config(pool: SqlitePool, config: &PublicItemsConfig) -> Self {
        Self::new(
            TaskRunner::from_config(pool, config),
            ItemTaskManager::default(),
            config,
        )
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn service(&self) -> &PublicItemService {
        &self.service
    }

    fn actor(&self, member: Option<Member>) -> Actor {
        Actor::resolve(member, self.public_actor_id)
    }

    fn store(&self) -> Arc<dyn ItemStore> {
        self.manager.store()
    }

    fn get_public_item(&self, actor: &Actor) -> GetPublicItem {
        GetPublicItem::new(actor.clone(), self.service, self.store())
    }

    /// [GetPublicItem, MergeItemMembershipsIntoItems] with the merge skipped
    /// unless memberships were asked for.
    fn view_pipeline(&self, actor: &Actor, id: ItemId, with_memberships: bool) -> ViewPipeline {
        let start = Sequence::start(TaskNode::new(self.get_public_item(actor), id));
        let fetched = start.last();
        let merge = TaskNode::bound(
            MergeItemMembershipsIntoItems::new(actor.clone(), self.store()),
            move |results| Ok(OneOrMany::One(results.get(fetched)?.clone())),
        )
        .skip(!with_memberships);
        let sequence = start.then(merge);
        let merged = sequence.last();

        ViewPipeline {
            sequence,
            fetched,
            merged,
        }
    }

    /// The merged view, or the bare item when the merge was skipped
    fn into_view(
        mut results: SequenceResults<OneOrMany<ItemView>>,
        fetched: TaskRef<Item>,
        merged: TaskRef<OneOrMany<ItemView>>,
    ) -> Result<ItemView> {
        if let TaskOutcome::Completed(views) = results.take(merged)? {
            if let Some(view) = views.into_vec().into_iter().next() {
                return Ok(view);
            }
        }

        match results.take(fetched)? {
            TaskOutcome::Completed(item) => Ok(ItemView::from(item)),
            TaskOutcome::Skipped => Err(TaskError::ResultUnavailable {
                index: fetched.index(),
                reason: "item fetch was skipped".to_string(),
            }),
        }
    }

    fn completed<T>(outcome: TaskOutcome<T>, task: &'static str) -> Result<T> {
        outcome.completed().ok_or_else(|| TaskError::ResultUnavailable {
            index: 0,
            reason: format!("{task} was skipped"),
        })
    }

    /// `GET /:id?withMemberships=bool`
    pub async fn get_item(
        &self,
        id: ItemId,
        with_memberships: bool,
        member: Option<Member>,
    ) -> Result<ItemView> {
        let actor = self.actor(member);
        let pipeline = self.view_pipeline(&actor, id, with_memberships);
        let results = self.runner.run_sequence(pipeline.sequence).await?;
        Self::into_view(results, pipeline.fetched, pipeline.merged)
    }

    /// `GET /:id/children?ordered=bool`
    ///
    /// Ordered children follow the parent's `extra.folder.childrenOrder`;
    /// children missing from it come last, oldest first.
    pub async fn get_children(
        &self,
        id: ItemId,
        ordered: bool,
        member: Option<Member>,
    ) -> Result<Vec<Item>> {
        let actor = self.actor(member);
        let start = Sequence::start(TaskNode::new(self.get_public_item(&actor), id));
        let parent = start.last();
        let sequence = start.pipe(self.manager.create_get_children_task(&actor), |item| {
            Ok(item.clone())
        });
        let children_ref = sequence.last();

        let mut results = self.runner.run_sequence(sequence).await?;
        let mut children = Self::completed(results.take(children_ref)?, "get-item-children")?;

        if ordered {
            let parent = Self::completed(results.take(parent)?, "get-public-item")?;
            sort_by_children_order(&mut children, &parent.children_order());
        }

        Ok(children)
    }

    /// `GET /?tagId=&withMemberships=bool`
    ///
    /// Items deleted or hidden between listing and fetching are dropped.
    pub async fn get_items_with_tag(
        &self,
        tag_id: TagId,
        with_memberships: bool,
        member: Option<Member>,
    ) -> Result<Vec<ItemView>> {
        let actor = self.actor(member);
        let listing = TaskNode::new(
            GetPublicItemIdsWithTag::new(actor.clone(), self.service),
            tag_id,
        );
        let ids = Self::completed(
            self.runner.run_single(listing).await?,
            "get-public-item-ids-with-tag",
        )?;

        let mut refs = Vec::with_capacity(ids.len());
        let mut sequences = Vec::with_capacity(ids.len());
        for id in ids {
            let pipeline = self.view_pipeline(&actor, id, with_memberships);
            refs.push((pipeline.fetched, pipeline.merged));
            sequences.push(pipeline.sequence);
        }

        let mut views = Vec::with_capacity(sequences.len());
        let batch = self.runner.run_multiple_sequences(sequences).await;
        for (results, (fetched, merged)) in batch.into_iter().zip(refs) {
            if let Some(results) = results {
                views.push(Self::into_view(results, fetched, merged)?);
            }
        }

        Ok(views)
    }

    /// `GET /with-categories?category=[]`
    ///
    /// An item is listed only when it is in one of the categories, public,
    /// and published.
    pub async fn get_items_with_categories(
        &self,
        category_ids: Vec<TagId>,
        member: Option<Member>,
    ) -> Result<Vec<Item>> {
        let actor = self.actor(member);
        let listing = TaskNode::new(
            GetItemsByCategory::new(actor.clone(), self.service),
            category_ids,
        );
        let ids = Self::completed(self.runner.run_single(listing).await?, "get-items-by-category")?;

        if self.service.published_tag_id().is_none() {
            warn!("No published tag configured; category listing is empty");
            return Ok(Vec::new());
        }

        let nodes = ids
            .into_iter()
            .map(|id| self.manager.create_get_task(&actor, id))
            .collect();
        let items: Vec<Item> = self
            .runner
            .run_multiple(nodes)
            .await
            .into_iter()
            .flatten()
            .collect();

        let mut conn = self.runner.pool().acquire().await?;
        let mut visible = Vec::with_capacity(items.len());
        for item in items {
            let is_public = self.service.has_public_tag(&item, &mut conn).await?;
            let is_published = self.service.has_published_tag(&item, &mut conn).await?;
            if is_public && is_published {
                visible.push(item);
            }
        }

        debug!(items = visible.len(), "Filtered category listing");
        Ok(visible)
    }

    /// `GET /:itemId/categories`
    pub async fn get_item_categories(
        &self,
        item_id: ItemId,
        member: Option<Member>,
    ) -> Result<Vec<TagId>> {
        let actor = self.actor(member);
        let sequence = Sequence::start(TaskNode::new(self.get_public_item(&actor), item_id)).pipe(
            GetItemCategories::new(actor.clone(), self.service, self.store()),
            |item| Ok(item.id),
        );

        Self::completed(
            self.runner.run_single_sequence(sequence).await?,
            "get-item-categories",
        )
    }

    /// `POST /:id/copy {parentId?, shouldCopyTags?}`
    ///
    /// Authenticated callers only; the source must still be public.
    pub async fn copy_item(
        &self,
        id: ItemId,
        parent_id: Option<ItemId>,
        should_copy_tags: bool,
        member: Option<Member>,
    ) -> Result<Item> {
        let member = member
            .ok_or_else(|| TaskError::forbidden("copying a public item requires a member"))?;
        let actor = Actor::Member(member.clone());

        let root = Sequence::start(TaskNode::new(self.get_public_item(&actor), id));
        let options = CopyOptions {
            parent_id,
            should_copy_tags,
        };
        let sequence = self.manager.create_copy_sub_task_sequence(&member, root, options);

        Self::completed(self.runner.run_single_sequence(sequence).await?, "copy-item")
    }

    /// `GET /:id/download`
    pub async fn get_file(&self, id: ItemId, member: Option<Member>) -> Result<FileLocation> {
        let actor = self.actor(member);
        let task = PathAndMimeType::file(self.get_public_item(&actor), &self.files_path_prefix);

        Self::completed(self.runner.run_single(TaskNode::new(task, id)).await?, "get-file-location")
    }

    /// `GET /:id/thumbnails/:size`
    pub async fn get_thumbnail(
        &self,
        id: ItemId,
        size: ThumbnailSize,
        member: Option<Member>,
    ) -> Result<FileLocation> {
        let actor = self.actor(member);
        let task = PathAndMimeType::thumbnail(
            self.get_public_item(&actor),
            &self.thumbnails_path_prefix,
            size,
        );

        Self::completed(
            self.runner.run_single(TaskNode::new(task, id)).await?,
            "get-thumbnail-location",
        )
    }

    /// Upload pre-hook; public items are never editable
    pub async fn upload_file(&self, id: ItemId, member: Option<Member>) -> Result<()> {
        self.reject_edit(id, member).await
    }

    /// Thumbnail upload pre-hook; public items are never editable
    pub async fn upload_thumbnail(&self, id: ItemId, member: Option<Member>) -> Result<()> {
        self.reject_edit(id, member).await
    }

    async fn reject_edit(&self, id: ItemId, member: Option<Member>) -> Result<()> {
        let node = TaskNode::new(RejectPublicEdit::new(self.actor(member)), id);
        match self.runner.run_single(node).await? {
            TaskOutcome::Completed(never) => match never {},
            TaskOutcome::Skipped => Ok(()),
        }
    }
}

/// Stable sort by position in `order`; unlisted items keep their order at the end.
fn sort_by_children_order(children: &mut [Item], order: &[ItemId]) {
    let positions: HashMap<ItemId, usize> = order
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();

    children.sort_by_key(|child| positions.get(&child.id).copied().unwrap_or(usize::MAX));
}
