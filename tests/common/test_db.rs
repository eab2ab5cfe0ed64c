//! Temporary SQLite databases with the schema and gating tags in place.

#![allow(dead_code)] // Not every test binary uses every helper

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};
use tempfile::TempDir;

use public_items::database::{DatabaseConnection, DatabaseMigrations};
use public_items::models::{Tag, TagId};
use public_items::{
    ItemTaskManager, PublicItemService, PublicItemsConfig, PublicItemsHandler, TaskRunner,
};

pub struct TestDb {
    pub pool: SqlitePool,
    pub config: PublicItemsConfig,
    // dropped last so the database file outlives the pool
    _dir: TempDir,
}

impl TestDb {
    /// Database with both a public and a published tag configured
    pub async fn new() -> Self {
        Self::setup(true).await
    }

    /// Database whose configuration has no published tag
    pub async fn without_published_tag() -> Self {
        Self::setup(false).await
    }

    async fn setup(with_published: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("public_items.db").display());

        let published = with_published.then(TagId::new);
        let config = PublicItemsConfig::new(TagId::new(), published).with_database_url(url);
        config.validate().expect("Test configuration should be valid");

        let database = DatabaseConnection::new(&config)
            .await
            .expect("Failed to open test database");
        let pool = database.pool().clone();
        DatabaseMigrations::run_all(&pool)
            .await
            .expect("Failed to run migrations");

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        Tag::create_with_id(&mut conn, config.public_tag_id, "public")
            .await
            .expect("Failed to create public tag");
        if let Some(published) = config.published_tag_id {
            Tag::create_with_id(&mut conn, published, "published")
                .await
                .expect("Failed to create published tag");
        }

        Self {
            pool,
            config,
            _dir: dir,
        }
    }

    pub async fn conn(&self) -> PoolConnection<Sqlite> {
        self.pool.acquire().await.expect("Failed to acquire connection")
    }

    pub fn public_tag(&self) -> TagId {
        self.config.public_tag_id
    }

    pub fn published_tag(&self) -> TagId {
        self.config
            .published_tag_id
            .expect("Test database has no published tag")
    }

    pub fn runner(&self) -> TaskRunner {
        TaskRunner::from_config(self.pool.clone(), &self.config)
    }

    pub fn service(&self) -> PublicItemService {
        PublicItemService::from_config(&self.config)
    }

    pub fn manager(&self) -> ItemTaskManager {
        ItemTaskManager::default()
    }

    pub fn handler(&self) -> PublicItemsHandler {
        PublicItemsHandler::from_config(self.pool.clone(), &self.config)
    }

    /// Number of rows in the items table
    pub async fn item_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count items")
    }
}
