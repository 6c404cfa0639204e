//! Error taxonomy for rubric loading and document scoring.

use serde::{Deserialize, Serialize};
use crate::id::QuestionId;

/// A rubric definition failed validation.
///
/// Fatal to the loading operation: the rubric file must be fixed.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SchemaError {
    /// The rubric defines no quality assessment questions.
    #[error("rubric defines no quality assessment questions")]
    NoQuestions,

    /// A question has an empty id.
    #[error("question #{index} has an empty id")]
    EmptyQuestionId {
        /// Zero-based position in `quality_assessment_questions`
        index: usize,
    },

    /// Two questions share an id.
    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(String),

    /// A score scale is empty, non-numeric, not strictly ascending or does not start at 0.0.
    #[error("invalid score scale for {question_id}: {reason}")]
    InvalidScoreScale {
        /// Offending question
        question_id: String,
        /// What is wrong with the scale
        reason: String,
    },

    /// `cutoff_score` is absent or not a number.
    #[error("cutoff_score is missing or not numeric")]
    MissingCutoff,

    /// `excluding_questions` names an id that no question has.
    #[error("excluded question {0} is not defined in quality_assessment_questions")]
    UnknownExcludedQuestion(String),

    /// Two data extraction fields share a key.
    #[error("duplicate data extraction field key: {0}")]
    DuplicateFieldKey(String),
}

/// Scoring a single document failed.
///
/// Scoped to that document; other documents in a batch are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum ScoringError {
    /// A rubric question has no answer.
    #[error("missing answer for {0}")]
    MissingAnswer(QuestionId),

    /// An answer is not one of the question's permitted scores.
    #[error("score {value} is not permitted for {question_id}")]
    InvalidScoreValue {
        /// Offending question
        question_id: QuestionId,
        /// Value supplied
        value: f64,
    },

    /// An answer refers to a question the rubric does not define.
    #[error("answer given for unknown question {0}")]
    UnknownQuestion(QuestionId),
}

impl ScoringError {
    /// The question the error is about.
    pub fn question_id(&self) -> &QuestionId {
        match self {
            Self::MissingAnswer(id) | Self::UnknownQuestion(id) => id,
            Self::InvalidScoreValue { question_id, .. } => question_id,
        }
    }
}
