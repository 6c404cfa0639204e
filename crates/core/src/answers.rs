//! Per-document answer mapping.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::id::QuestionId;

/// Chosen score per question for one document.
///
/// Keyed by [`QuestionId`]; iteration is always in id order regardless of
/// insertion order. Completeness against a rubric is checked when scoring,
/// not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<QuestionId, f64>);

impl Answers {
    /// Create an empty answer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer for a question.
    pub fn insert(&mut self, question: impl Into<QuestionId>, score: f64) -> Option<f64> {
        self.0.insert(question.into(), score)
    }

    /// Builder-style insert.
    pub fn with(mut self, question: impl Into<QuestionId>, score: f64) -> Self {
        self.insert(question, score);
        self
    }

    /// Answer for a question, if given.
    pub fn get(&self, question: &str) -> Option<f64> {
        self.0.get(question).copied()
    }

    /// Whether a question was answered.
    pub fn contains(&self, question: &str) -> bool {
        self.0.contains_key(question)
    }

    /// Remove the answer for a question.
    pub fn remove(&mut self, question: &str) -> Option<f64> {
        self.0.remove(question)
    }

    /// Iterate over (question, score) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, f64)> {
        self.0.iter().map(|(id, score)| (id, *score))
    }

    /// Number of answered questions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no question was answered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<Q: Into<QuestionId>> FromIterator<(Q, f64)> for Answers {
    fn from_iter<I: IntoIterator<Item = (Q, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(q, s)| (q.into(), s)).collect())
    }
}

impl<Q: Into<QuestionId>> Extend<(Q, f64)> for Answers {
    fn extend<I: IntoIterator<Item = (Q, f64)>>(&mut self, iter: I) {
        for (q, s) in iter {
            self.insert(q, s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_ignores_insertion_order() {
        let a: Answers = [("QE2", 1.0), ("QE1", 0.5)].into_iter().collect();
        let b: Answers = [("QE1", 0.5), ("QE2", 1.0)].into_iter().collect();
        assert_eq!(a, b);
        let ids: Vec<_> = a.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["QE1", "QE2"]);
    }

    #[test]
    fn deserializes_from_plain_map() {
        let answers: Answers = serde_json::from_str(r#"{"QE1": 1.0, "QE3": 0}"#).unwrap();
        assert_eq!(answers.get("QE1"), Some(1.0));
        assert_eq!(answers.get("QE3"), Some(0.0));
        assert!(!answers.contains("QE2"));
    }
}
