//! Decision gate.

use reviewgate_core::SCORE_EPSILON;
use serde::{Deserialize, Serialize};

/// Outcome of comparing a total score with the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Total score reached the cutoff
    Accept,
    /// Total score is below the cutoff
    Reject,
}

impl Verdict {
    /// Upper-case label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept when `total_score >= cutoff_score`; the boundary accepts.
///
/// Totals are float sums, so a total within [`SCORE_EPSILON`] below the
/// cutoff counts as reaching it.
pub fn decide(total_score: f64, cutoff_score: f64) -> Verdict {
    if total_score + SCORE_EPSILON >= cutoff_score {
        Verdict::Accept
    } else {
        Verdict::Reject
    }
}
