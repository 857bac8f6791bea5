//! The load-once challenge store.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use crate::{AnswerSpec, ChallengeBody, ChallengeDefinition, Subquestion};

/// On-disk record shape. `answer` and `subquestions` are both optional in
/// the file; validation enforces that exactly one is present.
#[derive(Debug, Deserialize)]
struct RawChallenge {
    title: String,
    level: String,
    base_score: u32,
    time_limit_sec: u64,
    view_a: String,
    view_b: String,
    #[serde(default)]
    answer: Option<AnswerSpec>,
    #[serde(default)]
    subquestions: Option<Vec<Subquestion>>,
}

impl RawChallenge {
    fn validate(self) -> Result<ChallengeDefinition, &'static str> {
        let body = match (self.answer, self.subquestions) {
            (Some(_), Some(_)) => return Err("carries both an answer and subquestions"),
            (None, None) => return Err("carries neither an answer nor subquestions"),
            (Some(answer), None) => ChallengeBody::Flat { answer },
            (None, Some(subquestions)) => {
                if subquestions.is_empty() {
                    return Err("subquestion sequence is empty");
                }
                ChallengeBody::Nested { subquestions }
            }
        };
        Ok(ChallengeDefinition {
            title: self.title,
            level: self.level,
            base_score: self.base_score,
            time_limit_sec: self.time_limit_sec,
            view_a: self.view_a,
            view_b: self.view_b,
            body,
        })
    }
}

/// Immutable, in-memory list of challenge definitions.
///
/// Loaded once at process start and read-only thereafter. Indices into the
/// catalog are stable for the process lifetime, which is what makes the
/// rooms' used-index bookkeeping sound.
#[derive(Debug, Clone, Default)]
pub struct ChallengeCatalog {
    entries: Vec<ChallengeDefinition>,
}

impl ChallengeCatalog {
    /// Loads the catalog from a JSON file.
    ///
    /// Degrades rather than fails: an unreadable or unparsable file yields
    /// an empty catalog with a logged error, and individually invalid
    /// records are skipped with a diagnostic while the rest load.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!(target: "catalog", path = %path.display(), error = %e, "cannot read challenge file, starting with an empty catalog");
                return Self::default();
            }
        };

        let raw: Vec<RawChallenge> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                error!(target: "catalog", path = %path.display(), error = %e, "cannot parse challenge file, starting with an empty catalog");
                return Self::default();
            }
        };

        let mut entries = Vec::with_capacity(raw.len());
        for (pos, record) in raw.into_iter().enumerate() {
            let title = record.title.clone();
            match record.validate() {
                Ok(def) => entries.push(def),
                Err(reason) => {
                    error!(target: "catalog", %pos, %title, %reason, "skipping invalid challenge record");
                }
            }
        }

        let catalog = Self { entries };
        for (level, count) in catalog.inventory() {
            info!(target: "catalog", %level, count, "startup challenge inventory");
        }
        catalog
    }

    /// Builds a catalog from already-validated definitions.
    pub fn from_entries(entries: Vec<ChallengeDefinition>) -> Self {
        Self { entries }
    }

    /// Total number of definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a definition by index.
    pub fn get(&self, index: usize) -> Option<&ChallengeDefinition> {
        self.entries.get(index)
    }

    /// Returns `(index, definition)` pairs whose level is in `levels`
    /// (case-insensitive) and whose index is not in `used`.
    pub fn eligible<'a>(
        &'a self,
        levels: &[&str],
        used: &HashSet<usize>,
    ) -> Vec<(usize, &'a ChallengeDefinition)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, def)| {
                !used.contains(i)
                    && levels.iter().any(|l| def.level.eq_ignore_ascii_case(l))
            })
            .collect()
    }

    /// Count of definitions per level tag (lowercased).
    fn inventory(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for def in &self.entries {
            let level = def.level.to_lowercase();
            match counts.iter_mut().find(|(l, _)| *l == level) {
                Some((_, n)) => *n += 1,
                None => counts.push((level, 1)),
            }
        }
        counts
    }
}
