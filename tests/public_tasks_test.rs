mod common;

use common::*;
use public_items::execution::{TaskNode, TaskOutcome};
use public_items::models::{Actor, ItemId, MemberId, OneOrMany, PermissionLevel};
use public_items::tasks::{
    GetItemCategories, GetPublicItem, GetPublicItemIdsWithTag, MergeItemMembershipsIntoItems,
    RejectPublicEdit,
};
use public_items::TaskError;

fn public_actor() -> Actor {
    Actor::resolve(None, MemberId::new())
}

#[tokio::test]
async fn test_get_public_item_returns_item_unchanged() {
    let db = TestDb::new().await;
    let root = ItemBuilder::folder("root").tagged(db.public_tag()).build(&db).await;
    let task = GetPublicItem::new(public_actor(), db.service(), db.manager().store());

    let outcome = db.runner().run_single(TaskNode::new(task, root.id)).await.unwrap();
    assert_eq!(outcome, TaskOutcome::Completed(root));
}

#[tokio::test]
async fn test_merge_memberships_mirrors_input_shape() {
    let db = TestDb::new().await;
    let owner = MemberId::new();
    let root = ItemBuilder::folder("root").build(&db).await;
    let child = ItemBuilder::folder("child").under(&root).build(&db).await;
    let other = ItemBuilder::folder("other").build(&db).await;
    grant(&db, &root, owner, PermissionLevel::Write).await;
    let runner = db.runner();
    let merge = || MergeItemMembershipsIntoItems::new(public_actor(), db.manager().store());

    let one = runner
        .run_single(TaskNode::new(merge(), OneOrMany::One(child.clone())))
        .await
        .unwrap()
        .completed()
        .unwrap();
    match one {
        OneOrMany::One(view) => {
            assert_eq!(view.item, child);
            assert_eq!(view.memberships.map(|m| m.len()), Some(1));
        }
        OneOrMany::Many(_) => panic!("single input must give a single view"),
    }

    let many = runner
        .run_single(TaskNode::new(merge(), OneOrMany::Many(vec![child.clone(), other.clone()])))
        .await
        .unwrap()
        .completed()
        .unwrap();
    let views = match many {
        OneOrMany::Many(views) => views,
        OneOrMany::One(_) => panic!("list input must give a list"),
    };
    assert_eq!(views.len(), 2);
    assert_eq!(views[1].item, other);
    assert_eq!(views[1].memberships, Some(Vec::new()));
}

#[tokio::test]
async fn test_item_categories_of_unknown_item() {
    let db = TestDb::new().await;
    let missing = ItemId::new();
    let task = GetItemCategories::new(public_actor(), db.service(), db.manager().store());

    let result = db.runner().run_single(TaskNode::new(task, missing)).await;
    assert_eq!(result, Err(TaskError::ItemNotFound(missing)));
}

#[tokio::test]
async fn test_ids_with_tag_skip_private_items() {
    let db = TestDb::new().await;
    let tag = create_category(&db, "tour").await;
    let public = ItemBuilder::folder("public")
        .tagged(db.public_tag())
        .tagged(tag)
        .build(&db)
        .await;
    let _private = ItemBuilder::folder("private").tagged(tag).build(&db).await;
    let task = GetPublicItemIdsWithTag::new(public_actor(), db.service());

    let ids = db.runner().run_single(TaskNode::new(task, tag)).await.unwrap();
    assert_eq!(ids, TaskOutcome::Completed(vec![public.id]));
}

#[tokio::test]
async fn test_reject_public_edit_touches_nothing() {
    let db = TestDb::new().await;
    let public = ItemBuilder::folder("public").tagged(db.public_tag()).build(&db).await;
    let before = db.item_count().await;

    let task = RejectPublicEdit::new(public_actor());
    let result = db.runner().run_single(TaskNode::new(task, public.id)).await;

    assert!(matches!(result, Err(TaskError::CannotEditPublicItem(id)) if id == public.id));
    assert_eq!(db.item_count().await, before);
    assert_eq!(find_item(&db, &public).await, Some(public));
}
