use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::debug;

use super::ItemStore;
use crate::error::{Result, TaskError};
use crate::models::item::child_path;
use crate::models::{Item, ItemId, ItemMembership, ItemTag, MemberId, PermissionLevel};

/// Item store backed by the SQLite tables from
/// [`DatabaseMigrations`](crate::database::DatabaseMigrations).
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteItemStore;

impl SqliteItemStore {
    pub fn new() -> Self {
        Self
    }
}

/// Rewrite `extra.folder.childrenOrder` to point at copied ids.
fn remap_children_order(extra: &mut serde_json::Value, copies: &HashMap<ItemId, ItemId>) {
    let Some(order) = extra
        .pointer_mut("/folder/childrenOrder")
        .and_then(serde_json::Value::as_array_mut)
    else {
        return;
    };

    for entry in order.iter_mut() {
        let copied = entry
            .as_str()
            .and_then(|id| id.parse::<ItemId>().ok())
            .and_then(|id| copies.get(&id));
        if let Some(copied) = copied {
            *entry = serde_json::Value::String(copied.to_string());
        }
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn get(&self, conn: &mut SqliteConnection, id: ItemId) -> Result<Option<Item>> {
        Ok(Item::find_by_id(conn, id).await?)
    }

    async fn children(&self, conn: &mut SqliteConnection, parent: &Item) -> Result<Vec<Item>> {
        Ok(Item::children(conn, parent).await?)
    }

    async fn memberships(
        &self,
        conn: &mut SqliteConnection,
        item: &Item,
    ) -> Result<Vec<ItemMembership>> {
        Ok(ItemMembership::for_item_path(conn, &item.path).await?)
    }

    async fn permission(
        &self,
        conn: &mut SqliteConnection,
        member_id: MemberId,
        item: &Item,
    ) -> Result<Option<PermissionLevel>> {
        Ok(ItemMembership::permission_for(conn, member_id, &item.path).await?)
    }

    async fn copy_tree(
        &self,
        conn: &mut SqliteConnection,
        source: &Item,
        parent: Option<&Item>,
        copier: MemberId,
        copy_tags: bool,
    ) -> Result<Item> {
        // read the whole subtree first so a copy into the source itself
        // does not pick up its own new rows
        let descendants = Item::descendants(conn, source).await?;
        let now = Utc::now();

        let mut copies: HashMap<ItemId, ItemId> = HashMap::new();
        let mut paths: HashMap<ItemId, String> = HashMap::new();
        let mut originals = Vec::with_capacity(descendants.len() + 1);
        originals.push(source.clone());
        originals.extend(descendants);

        for original in &originals {
            copies.insert(original.id, ItemId::new());
        }

        let mut root = None;
        for original in originals {
            let id = copies[&original.id];
            let parent_path = if original.id == source.id {
                parent.map(|p| p.path.clone())
            } else {
                let parent_id = original.parent_id().ok_or_else(|| {
                    TaskError::invalid_item(original.id, "descendant without a parent")
                })?;
                let path = paths.get(&parent_id).ok_or_else(|| {
                    TaskError::invalid_item(original.id, "parent was not copied first")
                })?;
                Some(path.clone())
            };

            let mut extra = original.extra.clone();
            remap_children_order(&mut extra, &copies);

            let copy = Item {
                id,
                name: original.name.clone(),
                item_type: original.item_type.clone(),
                description: original.description.clone(),
                path: child_path(parent_path.as_deref(), id),
                extra,
                creator: Some(copier),
                created_at: now,
                updated_at: now,
            };
            Item::insert(conn, &copy).await?;

            if copy_tags {
                for tag in ItemTag::for_item(conn, original.id).await? {
                    ItemTag::create(conn, copy.id, tag.tag_id).await?;
                }
            }

            paths.insert(original.id, copy.path.clone());
            if original.id == source.id {
                root = Some(copy);
            }
        }

        let root = root.ok_or_else(|| TaskError::invalid_item(source.id, "copy produced no root"))?;

        // a copy at the root would otherwise be unreachable for its copier
        if parent.is_none() {
            ItemMembership::create(conn, &root.path, copier, PermissionLevel::Admin).await?;
        }

        debug!(
            source = %source.id,
            copy = %root.id,
            items = copies.len(),
            copy_tags,
            "Copied item subtree"
        );

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_order_follows_copies() {
        let kept = ItemId::new();
        let copied = ItemId::new();
        let new_id = ItemId::new();
        let mut extra = json!({
            "folder": { "childrenOrder": [copied.to_string(), kept.to_string(), 3] }
        });

        remap_children_order(&mut extra, &HashMap::from([(copied, new_id)]));

        assert_eq!(
            extra,
            json!({ "folder": { "childrenOrder": [new_id.to_string(), kept.to_string(), 3] } })
        );
    }

    #[test]
    fn test_extra_without_order_is_untouched() {
        let mut extra = json!({ "file": { "path": "a/b" } });
        remap_children_order(&mut extra, &HashMap::new());
        assert_eq!(extra, json!({ "file": { "path": "a/b" } }));
    }
}
