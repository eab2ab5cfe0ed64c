//! # Schema Migrations
//!
//! Idempotent schema for the item store tables read by the public surface.
//! Every statement uses `IF NOT EXISTS`, so running the migrations on an
//! already-initialized database is a no-op.

use sqlx::SqlitePool;
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    item_type TEXT NOT NULL,
    description TEXT,
    path TEXT NOT NULL UNIQUE,
    extra TEXT NOT NULL DEFAULT '{}',
    creator BLOB,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id BLOB PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS item_tags (
    item_id BLOB NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    tag_id BLOB NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (item_id, tag_id)
);

CREATE TABLE IF NOT EXISTS item_memberships (
    id INTEGER PRIMARY KEY,
    item_path TEXT NOT NULL,
    member_id BLOB NOT NULL,
    permission TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (item_path, member_id)
);

CREATE INDEX IF NOT EXISTS idx_items_path ON items(path);
CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);
CREATE INDEX IF NOT EXISTS idx_item_memberships_member ON item_memberships(member_id)
"#;

/// Manages the item store schema.
pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Create all tables and indexes
    pub async fn run_all(pool: &SqlitePool) -> anyhow::Result<()> {
        for statement in SCHEMA.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(pool).await?;
            }
        }

        debug!("Item store schema is up to date");
        Ok(())
    }
}
