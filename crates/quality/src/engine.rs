//! Review engine.
//!
//! Applies the rubric to documents: aggregate, then gate. One document's
//! failure is reported as that document's outcome and never stops a batch.

use std::sync::Arc;
use reviewgate_core::{Answers, DocumentId, Rubric, ScoringError};
use serde::{Deserialize, Serialize};

use crate::aggregator::aggregate;
use crate::gate::decide;
use crate::record::{BatchSummary, ReviewOutcome, ReviewRecord};

/// Answers collected for one document, as read from a batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnswers {
    /// Reviewed document
    pub document_id: DocumentId,

    /// Chosen score per question
    pub answers: Answers,
}

impl DocumentAnswers {
    /// Create a new entry.
    pub fn new(document_id: impl Into<DocumentId>, answers: Answers) -> Self {
        Self {
            document_id: document_id.into(),
            answers,
        }
    }
}

/// Score one document against a rubric.
pub fn score_document(
    rubric: &Rubric,
    document_id: DocumentId,
    answers: Answers,
) -> Result<ReviewRecord, ScoringError> {
    let summary = aggregate(rubric, &answers)?;
    let verdict = decide(summary.total_score, rubric.cutoff_score());
    Ok(ReviewRecord::new(document_id, answers, summary, verdict))
}

/// Scores documents against one shared rubric.
#[derive(Debug, Clone)]
pub struct ReviewEngine {
    rubric: Arc<Rubric>,
}

impl ReviewEngine {
    /// Create an engine for a validated rubric.
    pub fn new(rubric: impl Into<Arc<Rubric>>) -> Self {
        Self {
            rubric: rubric.into(),
        }
    }

    /// The rubric in use.
    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Score a single document.
    pub fn review(
        &self,
        document_id: impl Into<DocumentId>,
        answers: Answers,
    ) -> Result<ReviewRecord, ScoringError> {
        score_document(&self.rubric, document_id.into(), answers)
    }

    /// Score a single document, folding failure into the outcome.
    pub fn review_outcome(&self, document: DocumentAnswers) -> ReviewOutcome {
        review_to_outcome(&self.rubric, document)
    }

    /// Score documents one after another, in input order.
    pub fn review_batch(
        &self,
        documents: impl IntoIterator<Item = DocumentAnswers>,
    ) -> Vec<ReviewOutcome> {
        documents
            .into_iter()
            .map(|document| self.review_outcome(document))
            .collect()
    }

    /// Score documents on the blocking pool, sharing the rubric.
    ///
    /// Output order matches input order.
    pub async fn review_concurrently(
        &self,
        documents: Vec<DocumentAnswers>,
    ) -> Result<Vec<ReviewOutcome>, tokio::task::JoinError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let chunk_size = documents.len().div_ceil(workers).max(1);

        let mut handles = Vec::new();
        let mut documents = documents.into_iter().peekable();
        while documents.peek().is_some() {
            let chunk: Vec<DocumentAnswers> = documents.by_ref().take(chunk_size).collect();
            let rubric = Arc::clone(&self.rubric);
            handles.push(tokio::task::spawn_blocking(move || {
                chunk
                    .into_iter()
                    .map(|document| review_to_outcome(&rubric, document))
                    .collect::<Vec<_>>()
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.extend(handle.await?);
        }
        Ok(outcomes)
    }

    /// Score documents and tally the verdicts.
    pub fn review_and_summarize(
        &self,
        documents: impl IntoIterator<Item = DocumentAnswers>,
    ) -> (Vec<ReviewOutcome>, BatchSummary) {
        let outcomes = self.review_batch(documents);
        let summary = BatchSummary::from_outcomes(&outcomes);
        (outcomes, summary)
    }
}

fn review_to_outcome(rubric: &Rubric, document: DocumentAnswers) -> ReviewOutcome {
    let DocumentAnswers { document_id, answers } = document;
    match score_document(rubric, document_id.clone(), answers) {
        Ok(record) => {
            tracing::debug!(
                "{}: {} (total {} / {}, cutoff {})",
                document_id,
                record.verdict(),
                record.total_score(),
                record.max_possible_score(),
                rubric.cutoff_score()
            );
            ReviewOutcome::Scored(record)
        }
        Err(error) => {
            tracing::warn!("{}: scoring failed: {}", document_id, error);
            ReviewOutcome::Failed { document_id, error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Verdict;
    use crate::record::ReportedVerdict;
    use reviewgate_core::{QuestionDefinition, RubricDefinition};
    use serde_json::json;

    fn rubric(cutoff: f64) -> Rubric {
        let q = |id: &str| QuestionDefinition {
            id: id.to_string(),
            question: String::new(),
            scores: vec![json!(0.0), json!(0.5), json!(1.0)],
        };
        Rubric::from_definition(RubricDefinition {
            quality_assessment_questions: vec![q("Q1"), q("Q2"), q("Q3")],
            cutoff_score: Some(json!(cutoff)),
            excluding_questions: vec!["Q3".to_string()],
            data_extraction_fields: Vec::new(),
        })
        .unwrap()
    }

    fn answers(q1: f64, q2: f64, q3: f64) -> Answers {
        Answers::new().with("Q1", q1).with("Q2", q2).with("Q3", q3)
    }

    #[test]
    fn test_review_accepts_at_cutoff() {
        let engine = ReviewEngine::new(rubric(1.5));
        let record = engine.review("doc", answers(1.0, 0.5, 0.0)).unwrap();
        assert_eq!(record.total_score(), 1.5);
        assert_eq!(record.verdict(), Verdict::Accept);
    }

    #[test]
    fn test_excluded_answer_cannot_flip_verdict() {
        let engine = ReviewEngine::new(rubric(1.5));
        let low = engine.review("doc", answers(0.5, 0.5, 0.0)).unwrap();
        let high = engine.review("doc", answers(0.5, 0.5, 1.0)).unwrap();
        assert_eq!(low.verdict(), Verdict::Reject);
        assert_eq!(high.verdict(), Verdict::Reject);
        assert_eq!(high.answers().get("Q3"), Some(1.0));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let engine = ReviewEngine::new(rubric(1.0));
        let docs = vec![
            DocumentAnswers::new("ok", answers(1.0, 1.0, 0.0)),
            DocumentAnswers::new("missing", Answers::new().with("Q1", 1.0)),
            DocumentAnswers::new("bad", answers(1.0, 0.7, 0.0)),
            DocumentAnswers::new("low", answers(0.0, 0.5, 1.0)),
        ];
        let (outcomes, summary) = engine.review_and_summarize(docs);

        let verdicts: Vec<_> = outcomes.iter().map(|o| o.verdict()).collect();
        assert_eq!(
            verdicts,
            vec![
                ReportedVerdict::Accept,
                ReportedVerdict::Indeterminate,
                ReportedVerdict::Indeterminate,
                ReportedVerdict::Reject,
            ]
        );
        assert_eq!(
            outcomes[1].error(),
            Some(&ScoringError::MissingAnswer("Q2".into()))
        );
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.indeterminate, 2);
    }

    #[test]
    fn test_decimal_scales_reach_cutoff() {
        let q = |id: &str, top: f64| QuestionDefinition {
            id: id.to_string(),
            question: String::new(),
            scores: vec![json!(0.0), json!(top)],
        };
        let rubric = Rubric::from_definition(RubricDefinition {
            quality_assessment_questions: vec![q("A", 0.7), q("B", 0.1)],
            cutoff_score: Some(json!(0.8)),
            excluding_questions: Vec::new(),
            data_extraction_fields: Vec::new(),
        })
        .unwrap();
        assert!(rubric.cutoff_reachable());

        let engine = ReviewEngine::new(rubric);
        let record = engine
            .review("doc", Answers::new().with("A", 0.7).with("B", 0.1))
            .unwrap();
        assert!((record.total_score() - 0.8).abs() < 1e-9);
        assert_eq!(record.verdict(), Verdict::Accept);

        let short = engine
            .review("doc", Answers::new().with("A", 0.7).with("B", 0.0))
            .unwrap();
        assert_eq!(short.verdict(), Verdict::Reject);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let engine = ReviewEngine::new(rubric(1.0));
        let docs: Vec<_> = (0..50)
            .map(|i| {
                let q1 = [0.0, 0.5, 1.0][i % 3];
                let q2 = if i % 7 == 0 { 0.25 } else { 0.5 };
                DocumentAnswers::new(format!("doc-{}", i), answers(q1, q2, 1.0))
            })
            .collect();

        let sequential = engine.review_batch(docs.clone());
        let concurrent = engine.review_concurrently(docs).await.unwrap();
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_concurrent_empty() {
        let engine = ReviewEngine::new(rubric(1.0));
        assert!(engine.review_concurrently(Vec::new()).await.unwrap().is_empty());
    }
}
