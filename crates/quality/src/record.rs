//! Review records and outcomes.

use reviewgate_core::{Answers, DocumentId, Rubric, ScoringError};
use serde::{Deserialize, Serialize};

use crate::aggregator::ScoreSummary;
use crate::engine::score_document;
use crate::gate::Verdict;

/// Result of scoring one document.
///
/// Built only by the review engine and never mutated afterwards. Answers to
/// excluded questions are kept for reporting.
///
/// A deserialized record is taken as written; its totals and verdict are
/// only trustworthy after [`ReviewOutcome::rescore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    document_id: DocumentId,
    answers: Answers,
    total_score: f64,
    max_possible_score: f64,
    verdict: Verdict,
}

impl ReviewRecord {
    pub(crate) fn new(document_id: DocumentId, answers: Answers, summary: ScoreSummary, verdict: Verdict) -> Self {
        Self {
            document_id,
            answers,
            total_score: summary.total_score,
            max_possible_score: summary.max_possible_score,
            verdict,
        }
    }

    /// Reviewed document.
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Every answer, excluded questions included.
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// Sum of non-excluded answers.
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    /// Sum of non-excluded scale maxima.
    pub fn max_possible_score(&self) -> f64 {
        self.max_possible_score
    }

    /// Accept/reject decision.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }
}

/// Verdict as reported to users, including failed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportedVerdict {
    /// Accepted
    Accept,
    /// Rejected
    Reject,
    /// Scoring failed; neither accepted nor rejected
    Indeterminate,
}

impl ReportedVerdict {
    /// Upper-case label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::Indeterminate => "INDETERMINATE",
        }
    }
}

impl From<Verdict> for ReportedVerdict {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Self::Accept,
            Verdict::Reject => Self::Reject,
        }
    }
}

impl std::fmt::Display for ReportedVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportedVerdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept" | "accepted" => Ok(Self::Accept),
            "reject" | "rejected" => Ok(Self::Reject),
            "indeterminate" | "error" => Ok(Self::Indeterminate),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}

/// Per-document outcome of a review run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Scoring succeeded
    Scored(ReviewRecord),

    /// Scoring failed for this document only
    Failed {
        /// Document that failed
        document_id: DocumentId,
        /// Why it failed
        error: ScoringError,
    },
}

impl ReviewOutcome {
    /// Reviewed document.
    pub fn document_id(&self) -> &DocumentId {
        match self {
            Self::Scored(record) => record.document_id(),
            Self::Failed { document_id, .. } => document_id,
        }
    }

    /// Reported verdict; failures are indeterminate.
    pub fn verdict(&self) -> ReportedVerdict {
        match self {
            Self::Scored(record) => record.verdict().into(),
            Self::Failed { .. } => ReportedVerdict::Indeterminate,
        }
    }

    /// The record, if scoring succeeded.
    pub fn record(&self) -> Option<&ReviewRecord> {
        match self {
            Self::Scored(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }

    /// The error, if scoring failed.
    pub fn error(&self) -> Option<&ScoringError> {
        match self {
            Self::Scored(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Whether the document was accepted.
    pub fn is_accepted(&self) -> bool {
        self.verdict() == ReportedVerdict::Accept
    }

    /// Score the stored answers again against `rubric`.
    ///
    /// Failed outcomes have no answers to score and are returned unchanged.
    pub fn rescore(&self, rubric: &Rubric) -> ReviewOutcome {
        match self {
            Self::Scored(record) => {
                match score_document(rubric, record.document_id.clone(), record.answers.clone()) {
                    Ok(rescored) => Self::Scored(rescored),
                    Err(error) => Self::Failed {
                        document_id: record.document_id.clone(),
                        error,
                    },
                }
            }
            Self::Failed { .. } => self.clone(),
        }
    }
}

/// Counts over a batch of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Documents reviewed
    pub documents: usize,
    /// Accepted documents
    pub accepted: usize,
    /// Rejected documents
    pub rejected: usize,
    /// Documents whose scoring failed
    pub indeterminate: usize,
}

impl BatchSummary {
    /// Tally verdicts. Failed documents are never counted as accepted or rejected.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ReviewOutcome>) -> Self {
        outcomes.into_iter().fold(Self::default(), |mut acc, outcome| {
            acc.record(outcome.verdict());
            acc
        })
    }

    /// Count one verdict.
    pub fn record(&mut self, verdict: ReportedVerdict) {
        self.documents += 1;
        match verdict {
            ReportedVerdict::Accept => self.accepted += 1,
            ReportedVerdict::Reject => self.rejected += 1,
            ReportedVerdict::Indeterminate => self.indeterminate += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, verdict: Verdict) -> ReviewOutcome {
        ReviewOutcome::Scored(ReviewRecord::new(
            id.into(),
            Answers::new(),
            ScoreSummary {
                total_score: 1.0,
                max_possible_score: 2.0,
            },
            verdict,
        ))
    }

    #[test]
    fn test_failed_outcome_is_indeterminate() {
        let outcome = ReviewOutcome::Failed {
            document_id: "paper.pdf".into(),
            error: ScoringError::MissingAnswer("QE1".into()),
        };
        assert_eq!(outcome.verdict(), ReportedVerdict::Indeterminate);
        assert!(!outcome.is_accepted());
        assert!(outcome.record().is_none());
        assert_eq!(outcome.document_id().as_str(), "paper.pdf");
    }

    #[test]
    fn test_summary_excludes_failures_from_acceptance() {
        let outcomes = vec![
            scored("a", Verdict::Accept),
            scored("b", Verdict::Reject),
            ReviewOutcome::Failed {
                document_id: "c".into(),
                error: ScoringError::UnknownQuestion("QX".into()),
            },
            scored("d", Verdict::Accept),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                documents: 4,
                accepted: 2,
                rejected: 1,
                indeterminate: 1
            }
        );
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(scored("a", Verdict::Accept)).unwrap();
        assert_eq!(json["status"], "scored");
        assert_eq!(json["verdict"], "ACCEPT");
        assert_eq!(json["document_id"], "a");

        let back: ReviewOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back.verdict(), ReportedVerdict::Accept);
    }

    #[test]
    fn test_rescore_corrects_edited_record() {
        use reviewgate_core::{QuestionDefinition, RubricDefinition};

        let rubric = Rubric::from_definition(RubricDefinition {
            quality_assessment_questions: vec![QuestionDefinition {
                id: "QE1".to_string(),
                question: String::new(),
                scores: vec![serde_json::json!(0.0), serde_json::json!(1.0)],
            }],
            cutoff_score: Some(serde_json::json!(1.0)),
            ..Default::default()
        })
        .unwrap();

        // Hand-edited file: answer 0.0 but claims a full score and ACCEPT.
        let edited: ReviewOutcome = serde_json::from_value(serde_json::json!({
            "status": "scored",
            "document_id": "paper.pdf",
            "answers": {"QE1": 0.0},
            "total_score": 1.0,
            "max_possible_score": 1.0,
            "verdict": "ACCEPT"
        }))
        .unwrap();
        assert!(edited.is_accepted());

        let rescored = edited.rescore(&rubric);
        assert_eq!(rescored.verdict(), ReportedVerdict::Reject);
        assert_eq!(rescored.record().unwrap().total_score(), 0.0);

        let unknown: ReviewOutcome = serde_json::from_value(serde_json::json!({
            "status": "scored",
            "document_id": "paper.pdf",
            "answers": {"QX": 1.0},
            "total_score": 1.0,
            "max_possible_score": 1.0,
            "verdict": "ACCEPT"
        }))
        .unwrap();
        assert_eq!(unknown.rescore(&rubric).verdict(), ReportedVerdict::Indeterminate);
    }

    #[test]
    fn test_parse_reported_verdict() {
        assert_eq!("accept".parse::<ReportedVerdict>(), Ok(ReportedVerdict::Accept));
        assert_eq!("ERROR".parse::<ReportedVerdict>(), Ok(ReportedVerdict::Indeterminate));
        assert!("maybe".parse::<ReportedVerdict>().is_err());
    }
}
