//! Shared fixtures for storage tests.

use reviewgate_core::{Answers, DataExtractionField, QuestionDefinition, Rubric, RubricDefinition};
use reviewgate_quality::{score_document, ReviewOutcome};
use serde_json::json;

/// Two questions, cutoff 2.0, fields TITLE and YEAR.
pub(crate) fn rubric() -> Rubric {
    Rubric::from_definition(RubricDefinition {
        quality_assessment_questions: vec![
            QuestionDefinition {
                id: "QE1".to_string(),
                question: "Sound method?".to_string(),
                scores: vec![json!(0.0), json!(0.5), json!(1.0)],
            },
            QuestionDefinition {
                id: "QE2".to_string(),
                question: "Clear results?".to_string(),
                scores: vec![json!(0.0), json!(1.0)],
            },
        ],
        cutoff_score: Some(json!(2.0)),
        excluding_questions: Vec::new(),
        data_extraction_fields: vec![
            DataExtractionField {
                key: "TITLE".to_string(),
                description: "Title".to_string(),
            },
            DataExtractionField {
                key: "YEAR".to_string(),
                description: "Year".to_string(),
            },
        ],
    })
    .unwrap()
}

/// Score with QE2 = 1.0: `qe1` 1.0 accepts, 0.0/0.5 reject, anything else fails.
pub(crate) fn outcome(rubric: &Rubric, document: &str, qe1: f64) -> ReviewOutcome {
    let answers = Answers::new().with("QE1", qe1).with("QE2", 1.0);
    match score_document(rubric, document.into(), answers) {
        Ok(record) => ReviewOutcome::Scored(record),
        Err(error) => ReviewOutcome::Failed {
            document_id: document.into(),
            error,
        },
    }
}
