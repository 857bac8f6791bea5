//! Challenge definition types.
//!
//! A definition is either a flat single-answer question or a nested
//! "big question" made of ordered subquestions. Exactly one of the two
//! shapes is authoritative per definition — the loader rejects records
//! that carry both or neither, so the rest of the code can branch on the
//! [`ChallengeBody`] tag without probing for field presence.

use serde::{Deserialize, Serialize};

/// How a submitted answer is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSpec {
    /// Case-insensitive equality against a stored literal.
    Exact { value: String },

    /// Regular-expression match. The pattern may start with the inline
    /// `(?i)` marker, which forces the case-insensitive flag; `flags` may
    /// also carry an `i`.
    Regex {
        pattern: String,
        #[serde(default)]
        flags: String,
    },
}

/// One step of a nested challenge, with its own time budget, per-role
/// views, and answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subquestion {
    pub time_limit_sec: u64,
    pub view_a: String,
    pub view_b: String,
    pub answer: AnswerSpec,
}

/// The content shape of a challenge.
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeBody {
    /// One question, one answer.
    Flat { answer: AnswerSpec },
    /// An ordered, non-empty sequence of subquestions answered in turn.
    Nested { subquestions: Vec<Subquestion> },
}

/// An immutable challenge definition from the external data file.
///
/// `view_a`/`view_b` are the per-role texts. For a nested challenge they
/// introduce the big question; each subquestion then carries its own pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeDefinition {
    pub title: String,
    /// Difficulty tag (`easy`, `normal`, `hard`, `expert`), matched
    /// case-insensitively by the catalog filter.
    pub level: String,
    pub base_score: u32,
    pub time_limit_sec: u64,
    pub view_a: String,
    pub view_b: String,
    pub body: ChallengeBody,
}

impl ChallengeDefinition {
    /// Whether this is a nested big-question challenge.
    pub fn is_nested(&self) -> bool {
        matches!(self.body, ChallengeBody::Nested { .. })
    }

    /// Number of subquestions (0 for flat challenges).
    pub fn subquestion_count(&self) -> usize {
        match &self.body {
            ChallengeBody::Flat { .. } => 0,
            ChallengeBody::Nested { subquestions } => subquestions.len(),
        }
    }
}
