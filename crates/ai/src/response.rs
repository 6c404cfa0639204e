//! LLM response parsing.
//!
//! A response is expected to answer each question as
//!
//! ```text
//! QE1: brief justification
//! QE1 Score: 1.0
//! ```
//!
//! followed by a `Data Extraction:` section of `Key: value` lines. Quotes and
//! markdown emphasis are ignored. Nothing is invented: a question without a
//! parsable score is simply left out of the answers.

use std::collections::BTreeMap;
use regex::Regex;
use reviewgate_core::{Answers, QuestionId, Rubric};

/// One parsed quality assessment answer.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAssessment {
    /// Question answered
    pub question_id: QuestionId,
    /// Justification given by the model
    pub rationale: String,
    /// Score given by the model
    pub score: f64,
}

/// Everything pulled out of one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Answers in rubric order
    pub assessments: Vec<QuestionAssessment>,
    /// Extracted values keyed by rubric field key
    pub extracted: BTreeMap<String, String>,
    /// Extracted values whose key matched no rubric field
    pub extra: BTreeMap<String, String>,
}

impl ParsedResponse {
    /// Scores as an answer mapping for the review engine.
    pub fn answers(&self) -> Answers {
        self.assessments
            .iter()
            .map(|a| (a.question_id.clone(), a.score))
            .collect()
    }

    /// Paper title, if one was extracted.
    pub fn title(&self) -> Option<&str> {
        self.extracted
            .iter()
            .chain(self.extra.iter())
            .find(|(key, _)| normalize_key(key) == "TITLE")
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }
}

/// Parses responses for one rubric.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    questions: Vec<(QuestionId, Regex)>,
    field_keys: Vec<(String, String)>,
    section: Regex,
}

impl ResponseParser {
    /// Compile the per-question patterns for `rubric`.
    pub fn new(rubric: &Rubric) -> Result<Self, regex::Error> {
        let mut questions = Vec::with_capacity(rubric.questions().len());
        for question in rubric.questions() {
            let id = regex::escape(question.id().as_str());
            let pattern = format!(
                r"(?s)\b{id}\s*:\s*(.*?)\s*\b{id}\s+(?i:score)\s*:\s*([0-9]+(?:\.[0-9]+)?)"
            );
            questions.push((question.id().clone(), Regex::new(&pattern)?));
        }

        let field_keys = rubric
            .data_extraction_fields()
            .iter()
            .map(|f| (normalize_key(&f.key), f.key.clone()))
            .collect();

        Ok(Self {
            questions,
            field_keys,
            section: Regex::new(r"(?is)data\s+extraction\s*:\s*(.*)\z")?,
        })
    }

    /// Parse one response.
    pub fn parse(&self, response: &str) -> ParsedResponse {
        let text = clean(response);
        let mut parsed = ParsedResponse::default();

        for (id, pattern) in &self.questions {
            let Some(caps) = pattern.captures(&text) else {
                tracing::debug!("No score found for {}", id);
                continue;
            };
            let Ok(score) = caps[2].parse::<f64>() else {
                continue;
            };
            parsed.assessments.push(QuestionAssessment {
                question_id: id.clone(),
                rationale: caps[1].trim().to_string(),
                score,
            });
        }

        if let Some(caps) = self.section.captures(&text) {
            for line in caps[1].lines() {
                let line = line.trim().trim_start_matches(|c: char| c == '-' || c == '•').trim();
                let Some((key, value)) = line.split_once(':') else {
                    continue;
                };
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                let value = value.trim().to_string();
                let normalized = normalize_key(key);
                match self.field_keys.iter().find(|(n, _)| *n == normalized) {
                    Some((_, rubric_key)) => {
                        parsed.extracted.insert(rubric_key.clone(), value);
                    }
                    None => {
                        parsed.extra.insert(key.to_string(), value);
                    }
                }
            }
        }

        tracing::debug!(
            "Parsed {} of {} scores and {} extraction values",
            parsed.assessments.len(),
            self.questions.len(),
            parsed.extracted.len()
        );
        parsed
    }
}

/// Drop quotes and markdown emphasis the model tends to add.
fn clean(response: &str) -> String {
    response.chars().filter(|c| !matches!(c, '"' | '*')).collect()
}

/// Upper case, underscores as spaces, single spaces.
fn normalize_key(key: &str) -> String {
    key.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rubric;

    const RESPONSE: &str = r#"
    "QE1: The methodology is tailored to disassembly tasks."
    "QE1 Score: 1.0"

    "QE2: Comparative results against MOEA/D and NSGA-II are presented."
    "QE2 Score: 2"

    **QE3**: No mention of public data.
    **QE3 Score**: 0.0

    "Data Extraction:"
    "Author: SiQi Lei et al."
    "Year: 2021"
    "Title: Constrained decomposition for disassembly line balancing"
    "Number_of_manipulators: Not specified"
    "Vision System: Not mentioned."
    "#;

    #[test]
    fn test_parse_scores() {
        let parser = ResponseParser::new(&rubric()).unwrap();
        let parsed = parser.parse(RESPONSE);

        assert_eq!(parsed.assessments.len(), 3);
        assert_eq!(parsed.assessments[0].rationale, "The methodology is tailored to disassembly tasks.");
        let answers = parsed.answers();
        assert_eq!(answers.get("QE1"), Some(1.0));
        assert_eq!(answers.get("QE2"), Some(2.0));
        assert_eq!(answers.get("QE3"), Some(0.0));
    }

    #[test]
    fn test_parse_extraction() {
        let parser = ResponseParser::new(&rubric()).unwrap();
        let parsed = parser.parse(RESPONSE);

        assert_eq!(parsed.extracted.get("AUTHOR").map(String::as_str), Some("SiQi Lei et al."));
        assert_eq!(parsed.extracted.get("YEAR").map(String::as_str), Some("2021"));
        assert_eq!(
            parsed.extracted.get("NUMBER OF MANIPULATORS").map(String::as_str),
            Some("Not specified")
        );
        assert_eq!(parsed.extra.get("Vision System").map(String::as_str), Some("Not mentioned."));
        assert_eq!(parsed.title(), Some("Constrained decomposition for disassembly line balancing"));
    }

    #[test]
    fn test_missing_score_is_not_invented() {
        let parser = ResponseParser::new(&rubric()).unwrap();
        let parsed = parser.parse("QE1: fine\nQE1 Score: 0.5\nQE2: no score given\n");
        let answers = parsed.answers();
        assert_eq!(answers.len(), 1);
        assert!(!answers.contains("QE2"));
        assert!(parsed.extracted.is_empty());
        assert_eq!(parsed.title(), None);
    }

    #[test]
    fn test_similar_ids_do_not_collide() {
        let parser = ResponseParser::new(&rubric()).unwrap();
        let parsed = parser.parse("QE10: other\nQE10 Score: 9\nQE1: ok\nQE1 Score: 0.5\n");
        assert_eq!(parsed.answers().get("QE1"), Some(0.5));
        assert_eq!(parsed.assessments.len(), 1);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("use_of  cad model"), "USE OF CAD MODEL");
    }
}
