//! # Data Models
//!
//! Read models of the generic item store together with the identity types the
//! task layer passes around. Each model owns its SQL, in the same way the
//! task runner hands one connection to every query of a sequence.
//!
//! - [`item`] - Items and their dot-separated tree paths
//! - [`tag`] - Tags and the item/tag association
//! - [`item_membership`] - Permission grants inherited down the tree
//! - [`member`] - Members and the request actor

pub mod item;
pub mod item_membership;
pub mod member;
pub mod tag;

use crate::macros::uuid_newtype;

uuid_newtype!(
    /// Identifier of an item in the store
    ItemId
);

uuid_newtype!(
    /// Identifier of a tag (public, published, or a category)
    TagId
);

uuid_newtype!(
    /// Identifier of a member
    MemberId
);

pub use item::{Item, ItemView, OneOrMany};
pub use item_membership::{ItemMembership, PermissionLevel};
pub use member::{Actor, Member};
pub use tag::{ItemTag, Tag};
