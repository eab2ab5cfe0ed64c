//! Error types for the public item surface.
//!

use thiserror::Error;

use crate::models::ItemId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),
    /// The item exists but is not visible to the public surface. Kept apart
    /// from `ItemNotFound` so callers can choose whether to reveal existence.
    #[error("Item {0} is not public")]
    ItemNotPublic(ItemId),
    #[error("Cannot edit public item {0}")]
    CannotEditPublicItem(ItemId),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid item {item_id}: {reason}")]
    InvalidItem { item_id: ItemId, reason: String },
    #[error("Task {0} was already executed")]
    AlreadyExecuted(&'static str),
    #[error("Result of task #{index} is unavailable: {reason}")]
    ResultUnavailable { index: usize, reason: String },
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl TaskError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn invalid_item(item_id: ItemId, reason: impl Into<String>) -> Self {
        Self::InvalidItem {
            item_id,
            reason: reason.into(),
        }
    }

    /// HTTP status an outer transport should answer with.
    ///
    /// Not-found and not-public share 404 so private items cannot be discovered.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ItemNotFound(_) | Self::ItemNotPublic(_) => 404,
            Self::CannotEditPublicItem(_) | Self::Forbidden(_) => 403,
            Self::InvalidItem { .. } => 400,
            Self::AlreadyExecuted(_)
            | Self::ResultUnavailable { .. }
            | Self::DatabaseError(_)
            | Self::ConfigurationError(_) => 500,
        }
    }

    /// Stable machine-readable code for response bodies and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Self::ItemNotPublic(_) => "ITEM_NOT_PUBLIC",
            Self::CannotEditPublicItem(_) => "CANNOT_EDIT_PUBLIC_ITEM",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidItem { .. } => "INVALID_ITEM",
            Self::AlreadyExecuted(_) => "TASK_ALREADY_EXECUTED",
            Self::ResultUnavailable { .. } => "TASK_RESULT_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::ConfigurationError(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<sqlx::Error> for TaskError {
    fn from(err: sqlx::Error) -> Self {
        TaskError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(error: serde_json::Error) -> Self {
        TaskError::DatabaseError(format!("JSON serialization error: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
