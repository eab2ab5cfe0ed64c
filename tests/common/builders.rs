//! Builders for seeding items, tags and memberships.

#![allow(dead_code)] // Not every test binary uses every helper

use serde_json::json;

use public_items::models::item::NewItem;
use public_items::models::{
    Item, ItemMembership, ItemTag, MemberId, PermissionLevel, Tag, TagId,
};

use super::TestDb;

/// Builder for test items
pub struct ItemBuilder {
    new_item: NewItem,
    parent: Option<Item>,
    tags: Vec<TagId>,
}

impl ItemBuilder {
    pub fn folder(name: &str) -> Self {
        Self {
            new_item: NewItem::folder(name),
            parent: None,
            tags: Vec::new(),
        }
    }

    /// A file item whose metadata lives under `extra.file`
    pub fn file(name: &str, path: &str, mimetype: &str) -> Self {
        Self::folder(name).with_extra(
            "file",
            json!({ "file": { "name": name, "path": path, "mimetype": mimetype } }),
        )
    }

    pub fn with_extra(mut self, item_type: &str, extra: serde_json::Value) -> Self {
        self.new_item = self.new_item.with_extra(item_type, extra);
        self
    }

    pub fn under(mut self, parent: &Item) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn tagged(mut self, tag_id: TagId) -> Self {
        self.tags.push(tag_id);
        self
    }

    pub async fn build(self, db: &TestDb) -> Item {
        let mut conn = db.conn().await;
        let parent_path = self.parent.as_ref().map(|parent| parent.path.as_str());
        let item = Item::create(&mut conn, parent_path, self.new_item)
            .await
            .expect("Failed to create test item");

        for tag_id in self.tags {
            ItemTag::create(&mut conn, item.id, tag_id)
                .await
                .expect("Failed to tag test item");
        }

        item
    }
}

/// Create a category tag
pub async fn create_category(db: &TestDb, name: &str) -> TagId {
    let mut conn = db.conn().await;
    Tag::create(&mut conn, name)
        .await
        .expect("Failed to create category")
        .id
}

pub async fn tag_item(db: &TestDb, item: &Item, tag_id: TagId) {
    let mut conn = db.conn().await;
    ItemTag::create(&mut conn, item.id, tag_id)
        .await
        .expect("Failed to tag item");
}

pub async fn grant(db: &TestDb, item: &Item, member_id: MemberId, permission: PermissionLevel) {
    let mut conn = db.conn().await;
    ItemMembership::create(&mut conn, &item.path, member_id, permission)
        .await
        .expect("Failed to create membership");
}

pub async fn delete_item(db: &TestDb, item: &Item) {
    let mut conn = db.conn().await;
    Item::delete_tree(&mut conn, item)
        .await
        .expect("Failed to delete item");
}

pub async fn tags_of(db: &TestDb, item: &Item) -> Vec<TagId> {
    let mut conn = db.conn().await;
    ItemTag::for_item(&mut conn, item.id)
        .await
        .expect("Failed to list tags")
        .into_iter()
        .map(|tag| tag.tag_id)
        .collect()
}

pub async fn find_item(db: &TestDb, item: &Item) -> Option<Item> {
    let mut conn = db.conn().await;
    Item::find_by_id(&mut conn, item.id)
        .await
        .expect("Failed to find item")
}
