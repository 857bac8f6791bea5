//! Answer evaluation.

use regex::RegexBuilder;

use crate::AnswerSpec;

/// Inline marker that forces case-insensitive matching when it prefixes a
/// pattern.
const CASE_INSENSITIVE_MARKER: &str = "(?i)";

/// Evaluates a submitted string against an answer specification.
///
/// Input is trimmed first. Exact specs compare case-insensitively against
/// the stored literal. Regex specs strip a leading `(?i)` marker (forcing
/// the case-insensitive flag) and honor an `i` in the flags string. A
/// pattern that fails to compile is a non-match, never an error — one bad
/// record must not take down the round.
pub fn matches_answer(spec: &AnswerSpec, submitted: &str) -> bool {
    let submitted = submitted.trim();
    match spec {
        AnswerSpec::Exact { value } => {
            submitted.to_lowercase() == value.trim().to_lowercase()
        }
        AnswerSpec::Regex { pattern, flags } => {
            let (pattern, inline_ci) = match pattern.strip_prefix(CASE_INSENSITIVE_MARKER) {
                Some(rest) => (rest, true),
                None => (pattern.as_str(), false),
            };
            let case_insensitive = inline_ci || flags.contains('i');
            match RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
            {
                Ok(re) => re.is_match(submitted),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed answer pattern, treating as non-match");
                    false
                }
            }
        }
    }
}
