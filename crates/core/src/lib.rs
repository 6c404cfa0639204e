//! reviewgate core data model.
//!
//! This crate defines the review rubric (quality questions, score scales,
//! cutoff, exclusions and data extraction fields), the per-document answer
//! mapping and the error taxonomy shared by the rest of the workspace.

#![warn(missing_docs)]

// Identities
mod id;

// Rubric and answers
mod rubric;
mod answers;

// Errors
mod error;

// Re-exports
pub use id::*;

pub use rubric::{
    Rubric, RubricDefinition, QuestionDefinition, QualityQuestion, ScoreScale,
    DataExtractionField, SCORE_EPSILON,
};
pub use answers::Answers;
pub use error::{SchemaError, ScoringError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
