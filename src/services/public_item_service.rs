use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::config::PublicItemsConfig;
use crate::error::Result;
use crate::models::item::ITEM_COLUMNS;
use crate::models::{Item, ItemId, TagId};

/// Visibility predicates and listings for the public surface
///
/// An item is public when it or any ancestor carries the public tag. The
/// published tag is a second, independent marker only category browsing
/// requires. Every query runs on the connection handed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicItemService {
    public_tag_id: TagId,
    published_tag_id: Option<TagId>,
}

impl PublicItemService {
    pub fn new(public_tag_id: TagId, published_tag_id: Option<TagId>) -> Self {
        Self {
            public_tag_id,
            published_tag_id,
        }
    }

    pub fn from_config(config: &PublicItemsConfig) -> Self {
        Self::new(config.public_tag_id, config.published_tag_id)
    }

    pub fn public_tag_id(&self) -> TagId {
        self.public_tag_id
    }

    pub fn published_tag_id(&self) -> Option<TagId> {
        self.published_tag_id
    }

    /// Whether `item` or one of its ancestors carries `tag_id`
    pub async fn has_tag(
        &self,
        item: &Item,
        tag_id: TagId,
        conn: &mut SqliteConnection,
    ) -> Result<bool> {
        let found: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM item_tags
                JOIN items ON items.id = item_tags.item_id
                WHERE item_tags.tag_id = ?
                  AND (items.path = ? OR ? LIKE items.path || '.%')
            )
            "#,
        )
        .bind(tag_id)
        .bind(&item.path)
        .bind(&item.path)
        .fetch_one(&mut *conn)
        .await?;

        Ok(found != 0)
    }

    pub async fn has_public_tag(&self, item: &Item, conn: &mut SqliteConnection) -> Result<bool> {
        self.has_tag(item, self.public_tag_id, conn).await
    }

    /// Always false when no published tag is configured
    pub async fn has_published_tag(
        &self,
        item: &Item,
        conn: &mut SqliteConnection,
    ) -> Result<bool> {
        match self.published_tag_id {
            Some(tag_id) => self.has_tag(item, tag_id, conn).await,
            None => Ok(false),
        }
    }

    /// Public items carrying `tag_id` directly, oldest first
    ///
    /// With the public tag itself this lists every item tagged public.
    pub async fn get_public_items_by_tag(
        &self,
        tag_id: TagId,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM items
            WHERE id IN (SELECT item_id FROM item_tags WHERE tag_id = ?)
              AND EXISTS (
                SELECT 1
                FROM item_tags AS public_tags
                JOIN items AS tagged ON tagged.id = public_tags.item_id
                WHERE public_tags.tag_id = ?
                  AND (items.path = tagged.path OR items.path LIKE tagged.path || '.%')
              )
            ORDER BY created_at, id
            "#
        ))
        .bind(tag_id)
        .bind(self.public_tag_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    pub async fn get_public_item_ids_by_tag(
        &self,
        tag_id: TagId,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<ItemId>> {
        let items = self.get_public_items_by_tag(tag_id, conn).await?;
        Ok(items.into_iter().map(|item| item.id).collect())
    }

    /// Distinct ids of items tagged directly with any of `category_ids`
    pub async fn get_items_by_category(
        &self,
        category_ids: &[TagId],
        conn: &mut SqliteConnection,
    ) -> Result<Vec<ItemId>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT DISTINCT item_id FROM item_tags WHERE tag_id IN (");
        let mut separated = query.separated(", ");
        for category_id in category_ids {
            separated.push_bind(*category_id);
        }
        separated.push_unseparated(") ORDER BY item_id");

        let ids: Vec<ItemId> = query.build_query_scalar().fetch_all(&mut *conn).await?;
        debug!(
            categories = category_ids.len(),
            items = ids.len(),
            "Resolved items by category"
        );

        Ok(ids)
    }

    /// Tags attached directly to `item`, minus the public and published markers
    pub async fn get_item_categories(
        &self,
        item: &Item,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<TagId>> {
        let tags: Vec<TagId> = sqlx::query_scalar(
            r#"
            SELECT tag_id FROM item_tags
            WHERE item_id = ?
            ORDER BY created_at, tag_id
            "#,
        )
        .bind(item.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(tags
            .into_iter()
            .filter(|tag| *tag != self.public_tag_id && Some(*tag) != self.published_tag_id)
            .collect())
    }
}
