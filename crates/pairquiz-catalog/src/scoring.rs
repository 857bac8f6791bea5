//! Time-pressure scoring.

use pairquiz_protocol::Mode;

/// Converts elapsed time and base score into a final point value.
///
/// The formula rewards speed linearly and floors at zero:
///
/// ```text
/// elapsed = time_limit_sec - floor(remain_ms / 1000)
/// score   = max(0, base_score - elapsed)
/// ```
///
/// Hard mode doubles the result.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// Multiplier applied to Hard-mode scores.
    pub hard_multiplier: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self { hard_multiplier: 2 }
    }
}

impl ScoringPolicy {
    /// Base formula, mode-independent.
    ///
    /// A reported `remain_ms` above the time limit clamps elapsed to zero
    /// rather than awarding more than the base score.
    pub fn score(&self, base_score: u32, time_limit_sec: u64, remain_ms: u64) -> u32 {
        let remain_sec = remain_ms / 1000;
        let elapsed = time_limit_sec.saturating_sub(remain_sec);
        base_score.saturating_sub(elapsed.min(u64::from(u32::MAX)) as u32)
    }

    /// Applies the mode multiplier on top of [`score`](Self::score).
    pub fn score_for_mode(
        &self,
        mode: Mode,
        base_score: u32,
        time_limit_sec: u64,
        remain_ms: u64,
    ) -> u32 {
        let score = self.score(base_score, time_limit_sec, remain_ms);
        match mode {
            Mode::Hard => score.saturating_mul(self.hard_multiplier),
            Mode::Easy | Mode::Normal => score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_rewards_speed() {
        // base 100, limit 60s, 45s remaining -> elapsed 15 -> 85.
        let policy = ScoringPolicy::default();
        assert_eq!(policy.score(100, 60, 45_000), 85);
    }

    #[test]
    fn test_score_floors_remain_ms() {
        // 45_999 ms still floors to 45 whole seconds.
        let policy = ScoringPolicy::default();
        assert_eq!(policy.score(100, 60, 45_999), 85);
    }

    #[test]
    fn test_score_never_negative() {
        // base 10, limit 60s, answered at the buzzer: elapsed 60 > base.
        let policy = ScoringPolicy::default();
        assert_eq!(policy.score(10, 60, 0), 0);
    }

    #[test]
    fn test_score_clamps_remain_above_limit() {
        // A client reporting more time than the limit gets the base score,
        // not a bonus.
        let policy = ScoringPolicy::default();
        assert_eq!(policy.score(100, 60, 120_000), 100);
    }

    #[test]
    fn test_hard_mode_doubles() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.score_for_mode(Mode::Hard, 100, 60, 45_000), 170);
        assert_eq!(policy.score_for_mode(Mode::Normal, 100, 60, 45_000), 85);
        assert_eq!(policy.score_for_mode(Mode::Easy, 100, 60, 45_000), 85);
    }
}
