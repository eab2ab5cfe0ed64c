#![allow(clippy::doc_markdown)] // Allow technical terms like SQLite, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Public Items
//!
//! Read-mostly, permission-gated view over a hierarchical item store.
//!
//! ## Overview
//!
//! Items carrying the configured **public** tag, directly or through an
//! ancestor, are visible to unauthenticated callers. A second **published**
//! tag additionally gates category browsing. Every request is answered by a
//! small pipeline of tasks that check visibility before returning or copying
//! anything.
//!
//! ## Architecture
//!
//! - A [`Task`](execution::Task) is one unit of database work. It runs on the
//!   connection it is handed and never opens transactions itself.
//! - A [`TaskNode`](execution::TaskNode) carries a task's input, either given
//!   up front or bound lazily to earlier results, its skip flag and its
//!   lifecycle status.
//! - A [`Sequence`](execution::Sequence) runs nodes in order on one
//!   transaction and stops at the first failure.
//! - The [`TaskRunner`](execution::TaskRunner) owns transaction scope and runs
//!   batches with per-entry failure isolation.
//!
//! ## Module Organization
//!
//! - [`models`] - Items, tags, memberships and the request actor
//! - [`database`] - Pool construction and schema migrations
//! - [`execution`] - Task lifecycle, sequences and the runner
//! - [`store`] - The generic item store seam and its primitive tasks
//! - [`services`] - Visibility predicates over tags
//! - [`tasks`] - Concrete tasks of the public surface
//! - [`handlers`] - One handler method per inbound route
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use public_items::config::ConfigLoader;
//! use public_items::database::{DatabaseConnection, DatabaseMigrations};
//! use public_items::handlers::PublicItemsHandler;
//! use public_items::models::ItemId;
//!
//! # async fn example(id: ItemId) -> Result<(), Box<dyn std::error::Error>> {
//! public_items::logging::init_structured_logging();
//!
//! let config = ConfigLoader::load()?;
//! let database = DatabaseConnection::new(&config).await?;
//! DatabaseMigrations::run_all(database.pool()).await?;
//!
//! let handler = PublicItemsHandler::from_config(database.pool().clone(), &config);
//! let item = handler.get_item(id, false, None).await?;
//! println!("{}", item.item.name);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod logging;
pub(crate) mod macros;
pub mod models;
pub mod services;
pub mod store;
pub mod tasks;

pub use config::{ConfigLoader, PublicItemsConfig};
pub use error::{Result, TaskError};
pub use execution::{Sequence, Task, TaskNode, TaskOutcome, TaskRunner, TaskStatus};
pub use handlers::PublicItemsHandler;
pub use models::{Actor, Item, ItemId, ItemView, Member, MemberId, TagId};
pub use services::PublicItemService;
pub use store::{CopyOptions, ItemStore, ItemTaskManager, SqliteItemStore};
