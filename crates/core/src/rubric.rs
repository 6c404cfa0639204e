//! Review rubric - quality questions, score scales, cutoff and extraction fields.
//!
//! A [`RubricDefinition`] is the literal shape of a rubric file. It becomes a
//! [`Rubric`] only through [`Rubric::from_definition`], which runs the schema
//! checks in a fixed order and stops at the first failure. A `Rubric` has no
//! mutation API; share it by reference or `Arc`.

use std::collections::{BTreeSet, HashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::SchemaError;
use crate::id::QuestionId;

/// Tolerance used when matching an answer against a score scale.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Raw rubric document as found in `review_data.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RubricDefinition {
    /// Quality assessment questions
    #[serde(default)]
    pub quality_assessment_questions: Vec<QuestionDefinition>,

    /// Minimum total score for acceptance
    #[serde(default)]
    pub cutoff_score: Option<Value>,

    /// Question ids left out of the decision score
    #[serde(default)]
    pub excluding_questions: Vec<String>,

    /// Fields to extract from each document
    #[serde(default)]
    pub data_extraction_fields: Vec<DataExtractionField>,
}

/// Raw quality question entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// Short identifier, e.g. "QE1"
    #[serde(default)]
    pub id: String,

    /// Question text
    #[serde(default)]
    pub question: String,

    /// Permitted scores, kept untyped until validated
    #[serde(default)]
    pub scores: Vec<Value>,
}

/// A named piece of information to pull out of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataExtractionField {
    /// Field key (upper case by convention)
    pub key: String,

    /// Guidance on what to extract
    #[serde(default)]
    pub description: String,
}

/// Validated, strictly ascending score scale starting at 0.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreScale(Vec<f64>);

impl ScoreScale {
    /// Validate raw scale values.
    fn parse(question_id: &str, raw: &[Value]) -> Result<Self, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidScoreScale {
            question_id: question_id.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("scores must not be empty".to_string()));
        }

        let mut values = Vec::with_capacity(raw.len());
        for value in raw {
            match value.as_f64() {
                Some(v) if v.is_finite() => values.push(v),
                _ => return Err(invalid(format!("score {} is not a number", value))),
            }
        }

        if values[0] != 0.0 {
            return Err(invalid(format!("first score must be 0.0, got {}", values[0])));
        }

        if let Some(pair) = values.windows(2).find(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "scores must be strictly ascending ({} is followed by {})",
                pair[0], pair[1]
            )));
        }

        Ok(Self(values))
    }

    /// Permitted values in ascending order.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Lowest permitted value (always 0.0).
    pub fn min(&self) -> f64 {
        self.0[0]
    }

    /// Highest permitted value.
    pub fn max(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Whether `value` is one of the permitted scores.
    pub fn contains(&self, value: f64) -> bool {
        self.0.iter().any(|s| (s - value).abs() <= SCORE_EPSILON)
    }
}

/// A validated quality assessment question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityQuestion {
    id: QuestionId,
    question: String,
    scores: ScoreScale,
}

impl QualityQuestion {
    /// Question id.
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Question text.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Permitted scores.
    pub fn scores(&self) -> &ScoreScale {
        &self.scores
    }
}

/// A validated review rubric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rubric {
    questions: Vec<QualityQuestion>,
    cutoff_score: f64,
    excluding_questions: BTreeSet<QuestionId>,
    data_extraction_fields: Vec<DataExtractionField>,
}

impl Rubric {
    /// Validate a raw definition.
    ///
    /// Checks run in this order and the first failure is returned:
    /// question ids, score scales, cutoff, excluded ids, field keys.
    pub fn from_definition(definition: RubricDefinition) -> Result<Self, SchemaError> {
        let RubricDefinition {
            quality_assessment_questions,
            cutoff_score,
            excluding_questions,
            data_extraction_fields,
        } = definition;

        if quality_assessment_questions.is_empty() {
            return Err(SchemaError::NoQuestions);
        }

        // 1. ids
        let mut seen = HashSet::new();
        for (index, q) in quality_assessment_questions.iter().enumerate() {
            let id = q.id.trim();
            if id.is_empty() {
                return Err(SchemaError::EmptyQuestionId { index });
            }
            if !seen.insert(id) {
                return Err(SchemaError::DuplicateQuestionId(id.to_string()));
            }
        }

        // 2. scales
        let mut questions = Vec::with_capacity(quality_assessment_questions.len());
        for q in &quality_assessment_questions {
            let id = q.id.trim();
            let scores = ScoreScale::parse(id, &q.scores)?;
            questions.push(QualityQuestion {
                id: QuestionId::new(id),
                question: q.question.trim().to_string(),
                scores,
            });
        }

        // 3. cutoff
        let cutoff_score = cutoff_score
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .ok_or(SchemaError::MissingCutoff)?;

        // 4. exclusions
        let mut excluded = BTreeSet::new();
        for raw in &excluding_questions {
            let id = raw.trim();
            if !seen.contains(id) {
                return Err(SchemaError::UnknownExcludedQuestion(id.to_string()));
            }
            excluded.insert(QuestionId::new(id));
        }

        // 5. field keys
        let mut keys = HashSet::new();
        for field in &data_extraction_fields {
            if !keys.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateFieldKey(field.key.clone()));
            }
        }

        Ok(Self {
            questions,
            cutoff_score,
            excluding_questions: excluded,
            data_extraction_fields,
        })
    }

    /// All questions in definition order.
    pub fn questions(&self) -> &[QualityQuestion] {
        &self.questions
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&QualityQuestion> {
        self.questions.iter().find(|q| q.id.as_str() == id)
    }

    /// Acceptance threshold (inclusive).
    pub fn cutoff_score(&self) -> f64 {
        self.cutoff_score
    }

    /// Ids left out of the decision score.
    pub fn excluding_questions(&self) -> &BTreeSet<QuestionId> {
        &self.excluding_questions
    }

    /// Whether a question is excluded from the decision score.
    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluding_questions.contains(id)
    }

    /// Questions that count toward the decision score, in definition order.
    pub fn scored_questions(&self) -> impl Iterator<Item = &QualityQuestion> {
        self.questions.iter().filter(|q| !self.is_excluded(q.id.as_str()))
    }

    /// Sum of the scale maxima of every non-excluded question.
    pub fn max_possible_score(&self) -> f64 {
        self.scored_questions().map(|q| q.scores.max()).sum()
    }

    /// Whether a document can reach the cutoff at all.
    ///
    /// Uses the same [`SCORE_EPSILON`] slack as the accept decision.
    pub fn cutoff_reachable(&self) -> bool {
        self.max_possible_score() + SCORE_EPSILON >= self.cutoff_score
    }

    /// Data extraction schema in definition order.
    pub fn data_extraction_fields(&self) -> &[DataExtractionField] {
        &self.data_extraction_fields
    }

    /// Copy of this rubric with a different exclusion set.
    ///
    /// Used for what-if comparisons; ids are checked as in [`Rubric::from_definition`].
    pub fn with_exclusions<I, S>(&self, ids: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut excluded = BTreeSet::new();
        for id in ids {
            let id = id.as_ref().trim();
            if self.question(id).is_none() {
                return Err(SchemaError::UnknownExcludedQuestion(id.to_string()));
            }
            excluded.insert(QuestionId::new(id));
        }
        Ok(Self {
            excluding_questions: excluded,
            ..self.clone()
        })
    }
}
