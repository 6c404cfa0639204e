//! JSON file storage implementation.
//!
//! Stores each review as a JSON file in `reviews/`, raw LLM responses as text
//! in `responses/`, and keeps a small per-review meta marker
//! (version + updated_at) under `meta/reviews/`.
//!
//! Writes and deletes are staged in memory. Reads see staged changes;
//! `commit` applies them to disk in order and `rollback` drops them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use reviewgate_core::ReviewId;
use tokio::fs;

use crate::model::{ReviewFilter, StoredReview};
use super::{Result, Storage, StorageError};

/// A change waiting for `commit`.
#[derive(Debug, Clone)]
enum PendingOp {
    SaveReview {
        review: StoredReview,
        json: String,
    },
    SaveResponse {
        file_name: String,
        contents: String,
    },
    DeleteReview {
        id: ReviewId,
        response_file: Option<String>,
    },
}

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    pending: Vec<PendingOp>,
}

impl JsonStorage {
    /// Create storage, creating the subdirectories it needs.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("reviews")).await?;
        fs::create_dir_all(root.join("responses")).await?;
        fs::create_dir_all(root.join("meta").join("reviews")).await?;

        Ok(Self {
            root,
            pending: Vec::new(),
        })
    }

    /// Storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of staged changes not yet committed.
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }

    fn review_path(&self, id: ReviewId) -> PathBuf {
        self.root.join("reviews").join(format!("{}.json", id))
    }

    fn response_path(&self, file_name: &str) -> PathBuf {
        self.root.join("responses").join(file_name)
    }

    fn meta_path(&self, id: ReviewId) -> PathBuf {
        self.root.join("meta").join("reviews").join(format!("{}.meta.json", id))
    }

    /// Latest staged state of a review: `Some(None)` when deleted.
    fn staged_review(&self, id: ReviewId) -> Option<Option<&StoredReview>> {
        self.pending.iter().rev().find_map(|op| match op {
            PendingOp::SaveReview { review, .. } if review.id == id => Some(Some(review)),
            PendingOp::DeleteReview { id: deleted, .. } if *deleted == id => Some(None),
            _ => None,
        })
    }

    /// Latest staged state of a response file: `Some(None)` when deleted.
    fn staged_response(&self, file_name: &str) -> Option<Option<&str>> {
        self.pending.iter().rev().find_map(|op| match op {
            PendingOp::SaveResponse { file_name: name, contents } if name == file_name => {
                Some(Some(contents.as_str()))
            }
            PendingOp::DeleteReview { response_file: Some(name), .. } if name == file_name => Some(None),
            _ => None,
        })
    }

    async fn apply(&self, op: &PendingOp) -> Result<()> {
        match op {
            PendingOp::SaveReview { review, json } => {
                fs::write(self.review_path(review.id), json.as_bytes()).await?;
                let version = self.bump_version(review.id).await?;
                tracing::debug!("Wrote review {} ({}) v{}", review.id, review.document_id, version);
            }
            PendingOp::SaveResponse { file_name, contents } => {
                fs::write(self.response_path(file_name), contents.as_bytes()).await?;
            }
            PendingOp::DeleteReview { id, response_file } => {
                remove_if_exists(&self.review_path(*id)).await?;
                if let Some(file_name) = response_file {
                    remove_if_exists(&self.response_path(file_name)).await?;
                }
                remove_if_exists(&self.meta_path(*id)).await?;
                tracing::debug!("Removed review {}", id);
            }
        }
        Ok(())
    }

    /// Read and increment per-review version, return new version.
    async fn bump_version(&self, id: ReviewId) -> Result<u64> {
        let path = self.meta_path(id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_review(&mut self, review: &StoredReview) -> Result<()> {
        let json = serde_json::to_string_pretty(review)?;
        self.pending.push(PendingOp::SaveReview {
            review: review.clone(),
            json,
        });
        Ok(())
    }

    async fn load_review(&self, id: ReviewId) -> Result<Option<StoredReview>> {
        if let Some(staged) = self.staged_review(id) {
            return Ok(staged.cloned());
        }
        read_json(&self.review_path(id)).await
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<StoredReview>> {
        let mut by_id: BTreeMap<ReviewId, StoredReview> = list_dir::<StoredReview>(&self.root.join("reviews"))
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        for op in &self.pending {
            match op {
                PendingOp::SaveReview { review, .. } => {
                    by_id.insert(review.id, review.clone());
                }
                PendingOp::DeleteReview { id, .. } => {
                    by_id.remove(id);
                }
                PendingOp::SaveResponse { .. } => {}
            }
        }

        let mut reviews: Vec<StoredReview> = by_id
            .into_values()
            .filter(|r| filter.matches(r))
            .collect();
        reviews.sort_by(|a, b| a.reviewed_at.cmp(&b.reviewed_at).then(a.id.cmp(&b.id)));
        Ok(reviews)
    }

    async fn delete_review(&mut self, id: ReviewId) -> Result<()> {
        let Some(review) = self.load_review(id).await? else {
            return Err(StorageError::NotFound(format!("review {}", id)));
        };
        self.pending.push(PendingOp::DeleteReview {
            id,
            response_file: review.response_file,
        });
        Ok(())
    }

    async fn save_response(&mut self, id: ReviewId, response: &str) -> Result<String> {
        let file_name = format!("{}_response.txt", id);
        self.pending.push(PendingOp::SaveResponse {
            file_name: file_name.clone(),
            contents: response.to_string(),
        });
        Ok(file_name)
    }

    async fn load_response(&self, file_name: &str) -> Result<Option<String>> {
        if let Some(staged) = self.staged_response(file_name) {
            return Ok(staged.map(str::to_string));
        }
        match fs::read_to_string(self.response_path(file_name)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn commit(&mut self, message: &str) -> Result<()> {
        let count = self.pending.len();
        // Applied ops are dropped as they land; a failure leaves the rest staged.
        while let Some(op) = self.pending.first() {
            self.apply(op).await?;
            self.pending.remove(0);
        }
        tracing::info!("Committed {} change(s): {}", count, message);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            tracing::info!("Discarded {} staged change(s)", self.pending.len());
        }
        self.pending.clear();
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
