//! Storage locations for files and thumbnails.
//!
//! Tasks here only compute where content lives; streaming happens outside
//! any transaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::fmt;

use crate::error::{Result, TaskError};
use crate::execution::Task;
use crate::models::Item;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";
const THUMBNAIL_MIMETYPE: &str = "image/jpeg";

/// Where a file lives in storage and how to serve it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub path: String,
    pub mimetype: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSize {
    Small,
    Medium,
    Large,
    Original,
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
            Self::Original => write!(f, "original"),
        }
    }
}

impl std::str::FromStr for ThumbnailSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "original" => Ok(Self::Original),
            _ => Err(format!("Invalid thumbnail size: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
enum Location {
    File { prefix: String },
    Thumbnail { prefix: String, size: ThumbnailSize },
}

fn join(prefix: &str, rest: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        rest.trim_start_matches('/')
    )
}

/// File metadata lives under `extra.<item type>`, e.g. `extra.file.path`.
fn file_location(item: &Item, prefix: &str) -> Result<FileLocation> {
    let metadata = item
        .extra
        .get(&item.item_type)
        .ok_or_else(|| TaskError::invalid_item(item.id, "item has no file metadata"))?;

    let path = metadata
        .get("path")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| TaskError::invalid_item(item.id, "file metadata has no path"))?;

    let mimetype = metadata
        .get("mimetype")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(DEFAULT_MIMETYPE);

    Ok(FileLocation {
        path: join(prefix, path),
        mimetype: mimetype.to_string(),
    })
}

/// Decorates a task producing an [`Item`] so it produces that item's
/// storage location instead.
#[derive(Debug, Clone)]
pub struct PathAndMimeType<T> {
    inner: T,
    location: Location,
}

impl<T> PathAndMimeType<T> {
    /// Location of the item's file under `prefix`
    pub fn file(inner: T, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            location: Location::File {
                prefix: prefix.into(),
            },
        }
    }

    /// Location of the item's thumbnail of `size` under `prefix`
    pub fn thumbnail(inner: T, prefix: impl Into<String>, size: ThumbnailSize) -> Self {
        Self {
            inner,
            location: Location::Thumbnail {
                prefix: prefix.into(),
                size,
            },
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn locate(&self, item: &Item) -> Result<FileLocation> {
        match &self.location {
            Location::File { prefix } => file_location(item, prefix),
            Location::Thumbnail { prefix, size } => Ok(FileLocation {
                path: join(prefix, &format!("{}/{size}", item.id)),
                mimetype: THUMBNAIL_MIMETYPE.to_string(),
            }),
        }
    }
}

#[async_trait]
impl<T> Task for PathAndMimeType<T>
where
    T: Task<Output = Item>,
{
    type Input = T::Input;
    type Output = FileLocation;

    fn name(&self) -> &'static str {
        match self.location {
            Location::File { .. } => "get-file-location",
            Location::Thumbnail { .. } => "get-thumbnail-location",
        }
    }

    fn message(&self) -> String {
        format!("{} (location)", self.inner.message())
    }

    async fn run(&self, input: T::Input, conn: &mut SqliteConnection) -> Result<FileLocation> {
        let item = self.inner.run(input, conn).await?;
        self.locate(&item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;
    use chrono::Utc;
    use serde_json::json;

    struct Fixed(Item);

    #[async_trait]
    impl Task for Fixed {
        type Input = ();
        type Output = Item;

        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn run(&self, _input: (), _conn: &mut SqliteConnection) -> Result<Item> {
            Ok(self.0.clone())
        }
    }

    fn item(item_type: &str, extra: serde_json::Value) -> Item {
        let id = ItemId::new();
        Item {
            id,
            name: "report".to_string(),
            item_type: item_type.to_string(),
            description: None,
            path: id.to_string(),
            extra,
            creator: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_location_reads_type_metadata() {
        let file = item(
            "file",
            json!({ "file": { "path": "/2024/report.pdf", "mimetype": "application/pdf" } }),
        );
        let location = file_location(&file, "files/").unwrap();
        assert_eq!(location.path, "files/2024/report.pdf");
        assert_eq!(location.mimetype, "application/pdf");
    }

    #[test]
    fn test_missing_metadata_is_invalid_item() {
        let folder = item("folder", json!({ "folder": {} }));
        let result = file_location(&folder, "files");
        assert!(matches!(result, Err(TaskError::InvalidItem { .. })));

        let no_type = item("document", json!({}));
        assert!(file_location(&no_type, "files").is_err());
    }

    #[test]
    fn test_thumbnail_size_strings() {
        assert_eq!(ThumbnailSize::Medium.to_string(), "medium");
        assert_eq!("large".parse::<ThumbnailSize>().unwrap(), ThumbnailSize::Large);
        assert!("huge".parse::<ThumbnailSize>().is_err());
    }

    #[tokio::test]
    async fn test_decorator_wraps_inner_result() {
        use sqlx::Connection;

        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        let image = item("file", json!({ "file": { "path": "img.png" } }));
        let id = image.id;

        let file = PathAndMimeType::file(Fixed(image.clone()), "files");
        let location = file.run((), &mut conn).await.unwrap();
        assert_eq!(location.path, "files/img.png");
        assert_eq!(location.mimetype, DEFAULT_MIMETYPE);

        let thumbnail =
            PathAndMimeType::thumbnail(Fixed(image), "thumbnails", ThumbnailSize::Small);
        assert_eq!(thumbnail.name(), "get-thumbnail-location");
        let location = thumbnail.run((), &mut conn).await.unwrap();
        assert_eq!(location.path, format!("thumbnails/{id}/small"));
        assert_eq!(location.mimetype, "image/jpeg");
    }
}
