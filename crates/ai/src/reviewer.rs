//! LLM-backed document review.

use std::collections::BTreeMap;
use anyhow::{Context, Result};
use reviewgate_core::DocumentId;
use reviewgate_quality::{DocumentAnswers, ReviewEngine, ReviewOutcome};
use tracing::info;

use crate::client::LlmClient;
use crate::prompt::analysis_prompt;
use crate::response::ResponseParser;

/// What came back from reviewing one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewedDocument {
    /// Scored or failed outcome
    pub outcome: ReviewOutcome,
    /// Values extracted from the response, keyed by rubric field
    pub extracted: BTreeMap<String, String>,
    /// Extracted title, if any
    pub title: Option<String>,
    /// The model's reply, unmodified
    pub raw_response: String,
}

/// Scores LLM replies against one rubric.
#[derive(Debug, Clone)]
pub struct ResponseScorer {
    engine: ReviewEngine,
    parser: ResponseParser,
}

impl ResponseScorer {
    /// Compile the response patterns for the engine's rubric.
    pub fn new(engine: ReviewEngine) -> Result<Self> {
        let parser = ResponseParser::new(engine.rubric())
            .context("Failed to compile response patterns")?;
        Ok(Self { engine, parser })
    }

    /// The engine in use.
    pub fn engine(&self) -> &ReviewEngine {
        &self.engine
    }

    /// Parse and score a reply that was already obtained.
    pub fn review_response(
        &self,
        document_id: impl Into<DocumentId>,
        response: String,
    ) -> ReviewedDocument {
        let parsed = self.parser.parse(&response);
        let title = parsed.title().map(str::to_string);
        let outcome = self
            .engine
            .review_outcome(DocumentAnswers::new(document_id, parsed.answers()));

        ReviewedDocument {
            outcome,
            extracted: parsed.extracted,
            title,
            raw_response: response,
        }
    }
}

/// Sends documents through an LLM and scores the replies.
pub struct DocumentReviewer<C: LlmClient> {
    scorer: ResponseScorer,
    prompt: String,
    client: C,
}

impl<C: LlmClient> DocumentReviewer<C> {
    /// Create a reviewer; the prompt is built once from the engine's rubric.
    pub fn new(engine: ReviewEngine, client: C) -> Result<Self> {
        let prompt = analysis_prompt(engine.rubric());
        Ok(Self {
            scorer: ResponseScorer::new(engine)?,
            prompt,
            client,
        })
    }

    /// The analysis prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The LLM client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Full message sent for a document.
    pub fn message_for(&self, text: &str) -> String {
        format!("{}\n\nDocument Content:\n{}", self.prompt, text)
    }

    /// Review one document's text.
    ///
    /// Only LLM failures are errors; a reply that cannot be scored becomes a
    /// failed outcome.
    pub async fn review_text(
        &self,
        document_id: impl Into<DocumentId>,
        text: &str,
    ) -> Result<ReviewedDocument> {
        let document_id = document_id.into();
        info!("Reviewing {} ({} chars)", document_id, text.len());

        let response = self
            .client
            .complete(&self.message_for(text))
            .await
            .with_context(|| format!("LLM request failed for {}", document_id))?;

        Ok(self.scorer.review_response(document_id, response))
    }
}
