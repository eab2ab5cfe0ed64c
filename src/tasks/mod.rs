//! # Tasks
//!
//! Concrete tasks of the public surface plus the primitive item tasks the
//! store's task manager hands out. Each task captures its actor and
//! collaborators when constructed and gets its input from a
//! [`TaskNode`](crate::execution::TaskNode).

pub mod category_tasks;
pub mod file_location;
pub mod get_public_item;
pub mod item_tasks;
pub mod merge_item_memberships;
pub mod reject_public_edit;

pub use category_tasks::{GetItemCategories, GetItemsByCategory, GetPublicItemIdsWithTag};
pub use file_location::{FileLocation, PathAndMimeType, ThumbnailSize};
pub use get_public_item::GetPublicItem;
pub use item_tasks::{CopyItem, GetItem, GetItemChildren};
pub use merge_item_memberships::MergeItemMembershipsIntoItems;
pub use reject_public_edit::RejectPublicEdit;
