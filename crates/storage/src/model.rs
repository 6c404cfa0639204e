//! Persisted review model.

use std::collections::BTreeMap;
use reviewgate_core::{DocumentId, ReviewId, Rubric, Time};
use reviewgate_quality::{ReportedVerdict, ReviewOutcome};
use serde::{Deserialize, Serialize};

/// A review as kept in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReview {
    /// Unique identifier
    pub id: ReviewId,

    /// Reviewed document
    pub document_id: DocumentId,

    /// Paper title, when one was extracted
    pub title: Option<String>,

    /// Scoring outcome
    pub outcome: ReviewOutcome,

    /// Extracted field values by rubric key (accepted documents only)
    #[serde(default)]
    pub extracted: BTreeMap<String, String>,

    /// When the review was recorded
    pub reviewed_at: Time,

    /// Raw response file name under `responses/`, if saved
    #[serde(default)]
    pub response_file: Option<String>,
}

impl StoredReview {
    /// Wrap an outcome for storage.
    pub fn new(outcome: ReviewOutcome) -> Self {
        Self {
            id: ReviewId::new(),
            document_id: outcome.document_id().clone(),
            title: None,
            outcome,
            extracted: BTreeMap::new(),
            reviewed_at: chrono::Utc::now(),
            response_file: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach extracted values. Ignored unless the document was accepted.
    pub fn with_extracted(mut self, extracted: BTreeMap<String, String>) -> Self {
        if self.outcome.is_accepted() {
            self.extracted = extracted;
        } else if !extracted.is_empty() {
            tracing::debug!(
                "{}: not accepted, dropping {} extracted values",
                self.document_id,
                extracted.len()
            );
        }
        self
    }

    /// Reported verdict.
    pub fn verdict(&self) -> ReportedVerdict {
        self.outcome.verdict()
    }

    /// Title, falling back to the document id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.document_id.as_str())
    }

    /// Score the stored answers again against `rubric`.
    ///
    /// Returns whether the outcome changed. Extracted values are dropped if
    /// the review is no longer accepted.
    pub fn rescore(&mut self, rubric: &Rubric) -> bool {
        let rescored = self.outcome.rescore(rubric);
        let changed = rescored != self.outcome;
        if changed {
            tracing::warn!(
                "{}: stored verdict {} does not match the rubric, now {}",
                self.document_id,
                self.outcome.verdict(),
                rescored.verdict()
            );
        }
        self.outcome = rescored;
        if !self.outcome.is_accepted() {
            self.extracted.clear();
        }
        changed
    }

    /// Extraction keys an accepted review has no value for.
    ///
    /// Rejected and indeterminate reviews are never expected to carry
    /// extracted values, so they report nothing.
    pub fn missing_fields<'r>(&self, rubric: &'r Rubric) -> Vec<&'r str> {
        if !self.outcome.is_accepted() {
            return Vec::new();
        }
        rubric
            .data_extraction_fields()
            .iter()
            .map(|f| f.key.as_str())
            .filter(|key| {
                self.extracted
                    .get(*key)
                    .map_or(true, |value| value.trim().is_empty())
            })
            .collect()
    }
}

/// Filter for listing reviews.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    /// Keep only these verdicts
    pub verdict: Option<Vec<ReportedVerdict>>,

    /// Keep only this document
    pub document_id: Option<DocumentId>,
}

impl ReviewFilter {
    /// Whether a review passes the filter.
    pub fn matches(&self, review: &StoredReview) -> bool {
        if let Some(verdicts) = &self.verdict {
            if !verdicts.contains(&review.verdict()) {
                return false;
            }
        }
        if let Some(document_id) = &self.document_id {
            if &review.document_id != document_id {
                return false;
            }
        }
        true
    }
}
