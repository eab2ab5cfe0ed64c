//! # Database Operations
//!
//! Connection pooling and schema setup for the SQLite-backed item store.
//!
//! - [`connection`] - Pool construction from configuration
//! - [`migrations`] - Idempotent schema creation

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::DatabaseMigrations;
