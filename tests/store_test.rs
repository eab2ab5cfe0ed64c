mod common;

use futures::future::join_all;
use serde_json::json;

use common::*;
use public_items::models::item::NewItem;
use public_items::models::{Item, ItemMembership, ItemTag, Member, MemberId, PermissionLevel};
use public_items::{ItemStore, SqliteItemStore};

#[tokio::test]
async fn test_created_item_matches_stored_row() {
    let db = TestDb::new().await;
    let mut conn = db.conn().await;

    let new_item = NewItem::folder("stored").with_extra(
        "file",
        json!({ "file": { "path": "a/b.txt", "mimetype": "text/plain" } }),
    );
    let created = Item::create(&mut conn, None, new_item).await.unwrap();
    let found = Item::find_by_id(&mut conn, created.id).await.unwrap();

    assert_eq!(found, Some(created));
}

#[tokio::test]
async fn test_memberships_and_tags_read_back_typed() {
    let db = TestDb::new().await;
    let item = ItemBuilder::folder("tagged").tagged(db.public_tag()).build(&db).await;
    let member_id = MemberId::new();
    let mut conn = db.conn().await;

    let granted = ItemMembership::create(&mut conn, &item.path, member_id, PermissionLevel::Write)
        .await
        .unwrap();
    let memberships = ItemMembership::for_item_path(&mut conn, &item.path).await.unwrap();
    assert_eq!(memberships, vec![granted]);

    let tags = ItemTag::for_item(&mut conn, item.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].item_id, item.id);
    assert_eq!(tags[0].tag_id, db.public_tag());
}

#[tokio::test]
async fn test_copy_result_matches_stored_copy() {
    let db = TestDb::new().await;
    let source = ItemBuilder::folder("source").tagged(db.public_tag()).build(&db).await;
    let child = ItemBuilder::folder("child").under(&source).build(&db).await;
    let copier = MemberId::new();
    let mut conn = db.conn().await;

    let copy = SqliteItemStore::new()
        .copy_tree(&mut conn, &source, None, copier, false)
        .await
        .unwrap();
    drop(conn);

    assert_eq!(find_item(&db, &copy).await, Some(copy.clone()));
    assert_eq!(find_item(&db, &child).await, Some(child));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_copies_all_succeed() {
    let db = TestDb::new().await;
    let handler = db.handler();
    let source = ItemBuilder::folder("source").tagged(db.public_tag()).build(&db).await;
    let _child = ItemBuilder::folder("child").under(&source).build(&db).await;

    for round in 0..5 {
        let copies = join_all((0..6).map(|n| {
            let handler = handler.clone();
            let copier = Member::new(MemberId::new(), format!("copier-{round}-{n}"));
            async move { handler.copy_item(source.id, None, false, Some(copier)).await }
        }))
        .await;

        for copy in copies {
            let copy = copy.unwrap();
            assert_eq!(find_item(&db, &copy).await, Some(copy));
        }
    }

    // the source subtree plus 30 copies of two items each
    assert_eq!(db.item_count().await, 2 + 30 * 2);
}
