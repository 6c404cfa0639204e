//! LLM side of reviewgate.
//!
//! Builds the analysis prompt from a rubric, talks to an OpenAI-compatible
//! runtime, and turns replies into answers for the review engine.

#![warn(missing_docs)]

pub mod client;
pub mod prompt;
pub mod response;
pub mod reviewer;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiStatus, ChatCompletionClient, LlmClient, LlmConfig, SYSTEM_PROMPT};
pub use prompt::analysis_prompt;
pub use response::{ParsedResponse, QuestionAssessment, ResponseParser};
pub use reviewer::{DocumentReviewer, ResponseScorer, ReviewedDocument};
