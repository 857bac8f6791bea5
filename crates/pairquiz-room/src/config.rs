//! Game rule configuration.

use std::time::Duration;

use pairquiz_catalog::ScoringPolicy;
use pairquiz_protocol::Mode;

// ---------------------------------------------------------------------------
// DifficultyTable
// ---------------------------------------------------------------------------

/// Maps a room mode to the set of challenge level tags it accepts.
///
/// Two tables exist in the wild; which one a deployment wants is a
/// configuration choice, so both are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyTable {
    /// One level per mode: Easy→easy, Normal→normal, Hard→hard.
    #[default]
    Strict,
    /// The historical two-tier filter: Hard draws from {hard, expert},
    /// everything else from {easy, normal}.
    TwoTier,
}

impl DifficultyTable {
    /// The level tags accepted for `mode`.
    pub fn accepted(&self, mode: Mode) -> &'static [&'static str] {
        match self {
            DifficultyTable::Strict => match mode {
                Mode::Easy => &["easy"],
                Mode::Normal => &["normal"],
                Mode::Hard => &["hard"],
            },
            DifficultyTable::TwoTier => match mode {
                Mode::Hard => &["hard", "expert"],
                Mode::Easy | Mode::Normal => &["easy", "normal"],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// RuleConfig
// ---------------------------------------------------------------------------

/// The fixed rules a room plays under.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Rounds per game.
    pub round_limit: u32,

    /// Delay between readiness completion and the first round.
    pub ready_start_delay: Duration,

    /// Delay between a concluded round and the next one.
    pub next_round_delay: Duration,

    /// Starting lives in Normal mode.
    pub normal_lives: u32,

    /// Starting lives in Hard mode.
    pub hard_lives: u32,

    /// Simultaneous connections allowed per room (players only; there are
    /// no spectators).
    pub room_capacity: usize,

    /// Chat messages are truncated to this many characters.
    pub chat_max_chars: usize,

    /// A room never joined by anyone is deleted after this grace period.
    pub disuse_grace: Duration,

    /// Mode → accepted challenge levels.
    pub difficulty_table: DifficultyTable,

    /// Time-pressure scoring.
    pub scoring: ScoringPolicy,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            round_limit: 3,
            ready_start_delay: Duration::from_millis(1500),
            next_round_delay: Duration::from_millis(1500),
            normal_lives: 5,
            hard_lives: 3,
            room_capacity: 2,
            chat_max_chars: 500,
            disuse_grace: Duration::from_secs(60),
            difficulty_table: DifficultyTable::default(),
            scoring: ScoringPolicy::default(),
        }
    }
}

impl RuleConfig {
    /// Lives a game starts with under `mode`. Easy plays without lives.
    pub fn initial_lives(&self, mode: Mode) -> Option<u32> {
        match mode {
            Mode::Easy => None,
            Mode::Normal => Some(self.normal_lives),
            Mode::Hard => Some(self.hard_lives),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RuleConfig::default();
        assert_eq!(rules.round_limit, 3);
        assert_eq!(rules.room_capacity, 2);
        assert_eq!(rules.next_round_delay, Duration::from_millis(1500));
        assert_eq!(rules.disuse_grace, Duration::from_secs(60));
    }

    #[test]
    fn test_initial_lives_per_mode() {
        let rules = RuleConfig::default();
        assert_eq!(rules.initial_lives(Mode::Easy), None);
        assert_eq!(rules.initial_lives(Mode::Normal), Some(5));
        assert_eq!(rules.initial_lives(Mode::Hard), Some(3));
    }

    #[test]
    fn test_strict_table_maps_one_level_per_mode() {
        let table = DifficultyTable::Strict;
        assert_eq!(table.accepted(Mode::Easy), &["easy"]);
        assert_eq!(table.accepted(Mode::Normal), &["normal"]);
        assert_eq!(table.accepted(Mode::Hard), &["hard"]);
    }

    #[test]
    fn test_two_tier_table() {
        let table = DifficultyTable::TwoTier;
        assert_eq!(table.accepted(Mode::Hard), &["hard", "expert"]);
        assert_eq!(table.accepted(Mode::Easy), &["easy", "normal"]);
        assert_eq!(table.accepted(Mode::Normal), &["easy", "normal"]);
    }
}
