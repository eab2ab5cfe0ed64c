//! # Handlers
//!
//! Transport-agnostic request handlers. An HTTP layer maps each route onto
//! one method and turns [`TaskError`](crate::error::TaskError) into a status
//! with [`TaskError::status_code`](crate::error::TaskError::status_code).

pub mod public_items_handler;

pub use public_items_handler::PublicItemsHandler;
