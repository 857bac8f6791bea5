//! Challenge content for pairquiz: definitions, answer matching, scoring.
//!
//! The catalog is loaded once at startup from a JSON file and is read-only
//! afterwards. Everything here is synchronous leaf logic — no channels, no
//! tasks — so the room layer can call it inline while holding its state.
//!
//! # Key types
//!
//! - [`ChallengeCatalog`] — load-once store with difficulty filtering
//! - [`ChallengeDefinition`] / [`ChallengeBody`] — flat or nested content
//! - [`AnswerSpec`] + [`matches_answer`] — exact/regex answer evaluation
//! - [`ScoringPolicy`] — time-pressure scoring with the Hard multiplier

mod catalog;
mod matcher;
mod scoring;
mod types;

pub use catalog::ChallengeCatalog;
pub use matcher::matches_answer;
pub use scoring::ScoringPolicy;
pub use types::{AnswerSpec, ChallengeBody, ChallengeDefinition, Subquestion};
