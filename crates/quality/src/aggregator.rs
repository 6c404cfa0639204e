//! Score aggregation.
//!
//! Turns one document's answers into a total and a maximum-possible score.
//! Excluded questions must still be answered with a permitted value, but they
//! contribute to neither sum.

use reviewgate_core::{Answers, Rubric, ScoringError};
use serde::{Deserialize, Serialize};

/// Aggregated scores for one document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Sum of answers to non-excluded questions
    pub total_score: f64,

    /// Sum of scale maxima of non-excluded questions
    pub max_possible_score: f64,
}

/// Aggregate `answers` against `rubric`.
///
/// Validation walks the rubric in definition order, so the reported error is
/// the same however the answers were built. Sums are also taken in rubric
/// order.
pub fn aggregate(rubric: &Rubric, answers: &Answers) -> Result<ScoreSummary, ScoringError> {
    let mut total_score = 0.0;
    let mut max_possible_score = 0.0;

    for question in rubric.questions() {
        let id = question.id();
        let value = answers
            .get(id.as_str())
            .ok_or_else(|| ScoringError::MissingAnswer(id.clone()))?;

        if !question.scores().contains(value) {
            return Err(ScoringError::InvalidScoreValue {
                question_id: id.clone(),
                value,
            });
        }

        if rubric.is_excluded(id.as_str()) {
            continue;
        }

        total_score += value;
        max_possible_score += question.scores().max();
    }

    if let Some((unknown, _)) = answers.iter().find(|(id, _)| rubric.question(id.as_str()).is_none()) {
        return Err(ScoringError::UnknownQuestion(unknown.clone()));
    }

    Ok(ScoreSummary {
        total_score,
        max_possible_score,
    })
}
