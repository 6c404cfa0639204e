//! Review quality assessment.
//!
//! Rubric loading, score aggregation, the accept/reject gate and the review
//! engine that ties them together.

#![warn(missing_docs)]

pub mod loader;
pub mod aggregator;
pub mod gate;
pub mod record;
pub mod engine;

pub use loader::{load_rubric, load_rubric_str, LoadError};
pub use aggregator::{aggregate, ScoreSummary};
pub use gate::{decide, Verdict};
pub use record::{BatchSummary, ReportedVerdict, ReviewOutcome, ReviewRecord};
pub use engine::{score_document, DocumentAnswers, ReviewEngine};
