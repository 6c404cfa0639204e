//! Shared fixtures for ai tests.

use reviewgate_core::{DataExtractionField, QuestionDefinition, Rubric, RubricDefinition};
use serde_json::json;

fn question(id: &str, text: &str, scores: &[f64]) -> QuestionDefinition {
    QuestionDefinition {
        id: id.to_string(),
        question: text.to_string(),
        scores: scores.iter().map(|s| json!(s)).collect(),
    }
}

fn field(key: &str, description: &str) -> DataExtractionField {
    DataExtractionField {
        key: key.to_string(),
        description: description.to_string(),
    }
}

/// QE1 [0, 0.5, 1], QE2 [0, 1, 2], QE3 [0, 1] excluded; cutoff 2.0.
pub(crate) fn rubric() -> Rubric {
    Rubric::from_definition(RubricDefinition {
        quality_assessment_questions: vec![
            question("QE1", "Is the method sound?", &[0.0, 0.5, 1.0]),
            question("QE2", "Are results compared?", &[0.0, 1.0, 2.0]),
            question("QE3", "Is data public?", &[0.0, 1.0]),
        ],
        cutoff_score: Some(json!(2.0)),
        excluding_questions: vec!["QE3".to_string()],
        data_extraction_fields: vec![
            field("AUTHOR", "First author"),
            field("YEAR", "Publication year"),
            field("TITLE", "Full title"),
            field("NUMBER OF MANIPULATORS", "Robots in the cell"),
        ],
    })
    .unwrap()
}
