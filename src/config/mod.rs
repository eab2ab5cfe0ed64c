//! # Public Items Configuration
//!
//! Construction-time settings for the public surface: which tags gate
//! visibility, which identity stands in for anonymous callers, where files
//! and thumbnails live, and how the database pool is sized.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use public_items::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Optional file layered under PUBLIC_ITEMS__* environment variables
//! let config = ConfigLoader::load()?;
//! println!("public tag: {}", config.public_tag_id);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MemberId, TagId};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

fn default_database_url() -> String {
    "sqlite://public_items.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_public_actor_id() -> MemberId {
    MemberId(Uuid::nil())
}

fn default_files_path_prefix() -> String {
    "files".to_string()
}

fn default_thumbnails_path_prefix() -> String {
    "thumbnails".to_string()
}

fn default_batch_concurrency() -> usize {
    8
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PublicItemsConfig {
    /// SQLite connection url
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a connection waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Tag whose presence on an item or ancestor makes it public
    pub public_tag_id: TagId,

    /// Tag additionally required by category browsing
    #[serde(default)]
    pub published_tag_id: Option<TagId>,

    /// Identity used when no member is authenticated
    #[serde(default = "default_public_actor_id")]
    pub public_actor_id: MemberId,

    #[serde(default = "default_files_path_prefix")]
    pub files_path_prefix: String,

    #[serde(default = "default_thumbnails_path_prefix")]
    pub thumbnails_path_prefix: String,

    /// Upper bound on tasks a batch runs at once
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

impl PublicItemsConfig {
    /// Configuration with defaults for everything but the gating tags
    pub fn new(public_tag_id: TagId, published_tag_id: Option<TagId>) -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            public_tag_id,
            published_tag_id,
            public_actor_id: default_public_actor_id(),
            files_path_prefix: default_files_path_prefix(),
            thumbnails_path_prefix: default_thumbnails_path_prefix(),
            batch_concurrency: default_batch_concurrency(),
        }
    }

    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database_url",
                "database configuration",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        if self.batch_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "batch_concurrency",
                "0",
                "batch concurrency must be greater than 0",
            ));
        }

        if self.published_tag_id == Some(self.public_tag_id) {
            return Err(ConfigurationError::invalid_value(
                "published_tag_id",
                self.public_tag_id.to_string(),
                "published tag must differ from the public tag",
            ));
        }

        Ok(())
    }
}
