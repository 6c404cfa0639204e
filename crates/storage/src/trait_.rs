//! Storage trait abstraction.

use async_trait::async_trait;
use reviewgate_core::ReviewId;

use crate::model::{ReviewFilter, StoredReview};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sheet export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Storage abstraction for review data.
///
/// Writes and deletes are staged until [`Storage::commit`]; reads see staged
/// changes. [`Storage::rollback`] discards everything staged since the last
/// commit.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Save a review (create or update).
    async fn save_review(&mut self, review: &StoredReview) -> Result<()>;

    /// Load a review by ID.
    async fn load_review(&self, id: ReviewId) -> Result<Option<StoredReview>>;

    /// List reviews matching the filter, oldest first.
    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<StoredReview>>;

    /// Delete a review and its raw response, if any.
    async fn delete_review(&mut self, id: ReviewId) -> Result<()>;

    /// Keep the raw LLM response for a review; returns the stored file name.
    async fn save_response(&mut self, id: ReviewId, response: &str) -> Result<String>;

    /// Load a raw LLM response by file name.
    async fn load_response(&self, file_name: &str) -> Result<Option<String>>;

    /// Apply staged changes.
    async fn commit(&mut self, message: &str) -> Result<()>;

    /// Discard staged changes.
    async fn rollback(&mut self) -> Result<()>;
}
