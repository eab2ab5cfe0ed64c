pub mod public_item_service;

pub use public_item_service::PublicItemService;
