//! Mutable room state, owned exclusively by the room actor.

use std::collections::{HashMap, HashSet};

use pairquiz_catalog::{AnswerSpec, ChallengeBody, ChallengeDefinition};
use pairquiz_protocol::{Mode, Occupancy, Role, RoomId, RoomStatus};
use pairquiz_timer::RoundTimer;
use pairquiz_transport::ConnectionId;

// ---------------------------------------------------------------------------
// PlayerSlots
// ---------------------------------------------------------------------------

/// The two role slots. Each holds at most one connection, and a connection
/// holds at most one slot.
#[derive(Debug, Default)]
pub(crate) struct PlayerSlots {
    a: Option<ConnectionId>,
    b: Option<ConnectionId>,
}

impl PlayerSlots {
    /// The connection occupying `role`.
    pub fn get(&self, role: Role) -> Option<ConnectionId> {
        match role {
            Role::A => self.a,
            Role::B => self.b,
        }
    }

    /// Occupies `role` with `conn`.
    pub fn set(&mut self, role: Role, conn: ConnectionId) {
        match role {
            Role::A => self.a = Some(conn),
            Role::B => self.b = Some(conn),
        }
    }

    /// The role `conn` occupies, if any.
    pub fn role_of(&self, conn: ConnectionId) -> Option<Role> {
        if self.a == Some(conn) {
            Some(Role::A)
        } else if self.b == Some(conn) {
            Some(Role::B)
        } else {
            None
        }
    }

    /// Picks a free slot: the preferred role if it is free, otherwise the
    /// first free slot in order A then B.
    pub fn free_slot(&self, preferred: Option<Role>) -> Option<Role> {
        if let Some(role) = preferred {
            if self.get(role).is_none() {
                return Some(role);
            }
        }
        if self.a.is_none() {
            Some(Role::A)
        } else if self.b.is_none() {
            Some(Role::B)
        } else {
            None
        }
    }

    /// Frees whichever slot `conn` occupies, returning the freed role.
    pub fn clear(&mut self, conn: ConnectionId) -> Option<Role> {
        let role = self.role_of(conn)?;
        match role {
            Role::A => self.a = None,
            Role::B => self.b = None,
        }
        Some(role)
    }

    /// Whether both slots are occupied.
    pub fn both_filled(&self) -> bool {
        self.a.is_some() && self.b.is_some()
    }

    /// Per-role occupancy snapshot for `roomUpdate`.
    pub fn occupancy(&self) -> Occupancy {
        Occupancy {
            a: self.a.is_some(),
            b: self.b.is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActiveChallenge
// ---------------------------------------------------------------------------

/// The challenge currently being played, plus the subquestion cursor when
/// the definition is nested.
#[derive(Debug)]
pub(crate) struct ActiveChallenge {
    pub index: usize,
    pub definition: ChallengeDefinition,
    /// Position in the subquestion sequence. `None` for flat challenges.
    cursor: Option<usize>,
}

impl ActiveChallenge {
    pub fn new(index: usize, definition: ChallengeDefinition) -> Self {
        let cursor = definition.is_nested().then_some(0);
        Self {
            index,
            definition,
            cursor,
        }
    }

    /// The answer spec currently in play. `None` when a nested cursor has
    /// run past the last subquestion.
    pub fn answer(&self) -> Option<&AnswerSpec> {
        match (&self.definition.body, self.cursor) {
            (ChallengeBody::Flat { answer }, _) => Some(answer),
            (ChallengeBody::Nested { subquestions }, Some(i)) => {
                subquestions.get(i).map(|s| &s.answer)
            }
            (ChallengeBody::Nested { .. }, None) => None,
        }
    }

    /// The view text for `role` at the current position.
    pub fn view(&self, role: Role) -> &str {
        match (&self.definition.body, self.cursor) {
            (ChallengeBody::Nested { subquestions }, Some(i)) if i < subquestions.len() => {
                match role {
                    Role::A => &subquestions[i].view_a,
                    Role::B => &subquestions[i].view_b,
                }
            }
            _ => match role {
                Role::A => &self.definition.view_a,
                Role::B => &self.definition.view_b,
            },
        }
    }

    /// Time budget of the current position: the subquestion's own limit
    /// when nested, otherwise the definition's.
    pub fn time_limit_sec(&self) -> u64 {
        match (&self.definition.body, self.cursor) {
            (ChallengeBody::Nested { subquestions }, Some(i)) if i < subquestions.len() => {
                subquestions[i].time_limit_sec
            }
            _ => self.definition.time_limit_sec,
        }
    }

    /// 1-based subquestion counter for the wire, `None` for flat.
    pub fn subquestion_number(&self) -> Option<u32> {
        self.cursor.map(|i| i as u32 + 1)
    }

    /// Moves to the next subquestion. Returns `true` when another
    /// subquestion remains to be answered; always `false` for flat.
    pub fn advance(&mut self) -> bool {
        match (&self.definition.body, &mut self.cursor) {
            (ChallengeBody::Nested { subquestions }, Some(i)) => {
                *i += 1;
                *i < subquestions.len()
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Everything a room knows. Mutated only by the room actor's handlers.
#[derive(Debug)]
pub(crate) struct RoomState {
    pub id: RoomId,
    pub slots: PlayerSlots,
    /// Joined connections not yet holding a role, in join order.
    pub waiting: Vec<ConnectionId>,
    pub status: RoomStatus,
    /// Mode requested at room creation; used when the first ready call
    /// carries none. Survives resets.
    pub default_mode: Option<Mode>,
    /// Mode fixed for the running game. Cleared on reset.
    pub mode: Option<Mode>,
    pub round: u32,
    pub cumulative_score: u32,
    pub lives: Option<u32>,
    /// Catalog indices already served this game.
    pub used: HashSet<usize>,
    pub current: Option<ActiveChallenge>,
    pub ready: HashMap<ConnectionId, bool>,
    /// At most one live countdown at a time.
    pub timer: Option<RoundTimer>,
    pub timer_generation: u64,
    /// Bumped on every reset/demotion; scheduled round starts carry the
    /// epoch they were created under and are discarded on mismatch.
    pub epoch: u64,
}

impl RoomState {
    pub fn new(id: RoomId, default_mode: Option<Mode>) -> Self {
        Self {
            id,
            slots: PlayerSlots::default(),
            waiting: Vec::new(),
            status: RoomStatus::Waiting,
            default_mode,
            mode: None,
            round: 0,
            cumulative_score: 0,
            lives: None,
            used: HashSet::new(),
            current: None,
            ready: HashMap::new(),
            timer: None,
            timer_generation: 0,
            epoch: 0,
        }
    }

    /// Stops and discards the live timer, if any. Safe with none running.
    pub fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }

    /// Full game reset back to `Waiting`: scores, round, lives, mode,
    /// used indices, readiness. Membership (slots, waiting set) survives —
    /// a finished game becomes a fresh room with the same people in it.
    pub fn reset_game(&mut self) {
        self.stop_timer();
        self.epoch += 1;
        self.status = RoomStatus::Waiting;
        self.mode = None;
        self.round = 0;
        self.cumulative_score = 0;
        self.lives = None;
        self.used.clear();
        self.current = None;
        self.ready.clear();
    }

    /// Readiness snapshot per role for `readyUpdate`.
    pub fn ready_snapshot(&self) -> Occupancy {
        let is_ready = |role| {
            self.slots
                .get(role)
                .is_some_and(|conn| self.ready.get(&conn).copied().unwrap_or(false))
        };
        Occupancy {
            a: is_ready(Role::A),
            b: is_ready(Role::B),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairquiz_catalog::Subquestion;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn flat_def() -> ChallengeDefinition {
        ChallengeDefinition {
            title: "Bridge".into(),
            level: "normal".into(),
            base_score: 100,
            time_limit_sec: 60,
            view_a: "north".into(),
            view_b: "south".into(),
            body: ChallengeBody::Flat {
                answer: AnswerSpec::Exact {
                    value: "bridge".into(),
                },
            },
        }
    }

    fn nested_def() -> ChallengeDefinition {
        ChallengeDefinition {
            title: "Relay".into(),
            level: "hard".into(),
            base_score: 80,
            time_limit_sec: 90,
            view_a: "relay intro A".into(),
            view_b: "relay intro B".into(),
            body: ChallengeBody::Nested {
                subquestions: vec![
                    Subquestion {
                        time_limit_sec: 20,
                        view_a: "first A".into(),
                        view_b: "first B".into(),
                        answer: AnswerSpec::Exact { value: "one".into() },
                    },
                    Subquestion {
                        time_limit_sec: 30,
                        view_a: "second A".into(),
                        view_b: "second B".into(),
                        answer: AnswerSpec::Exact { value: "two".into() },
                    },
                ],
            },
        }
    }

    #[test]
    fn test_free_slot_prefers_requested_role() {
        let slots = PlayerSlots::default();
        assert_eq!(slots.free_slot(Some(Role::B)), Some(Role::B));
        assert_eq!(slots.free_slot(None), Some(Role::A));
    }

    #[test]
    fn test_free_slot_falls_back_in_order_a_then_b() {
        let mut slots = PlayerSlots::default();
        slots.set(Role::A, conn(1));
        // Preferred A is taken, so B.
        assert_eq!(slots.free_slot(Some(Role::A)), Some(Role::B));
        slots.set(Role::B, conn(2));
        assert_eq!(slots.free_slot(None), None);
    }

    #[test]
    fn test_clear_frees_the_right_slot() {
        let mut slots = PlayerSlots::default();
        slots.set(Role::A, conn(1));
        slots.set(Role::B, conn(2));
        assert_eq!(slots.clear(conn(2)), Some(Role::B));
        assert_eq!(slots.get(Role::B), None);
        assert_eq!(slots.get(Role::A), Some(conn(1)));
        assert_eq!(slots.clear(conn(2)), None);
    }

    #[test]
    fn test_active_challenge_flat_positions() {
        let active = ActiveChallenge::new(0, flat_def());
        assert_eq!(active.subquestion_number(), None);
        assert_eq!(active.time_limit_sec(), 60);
        assert_eq!(active.view(Role::A), "north");
        assert_eq!(active.view(Role::B), "south");
        assert!(active.answer().is_some());
    }

    #[test]
    fn test_active_challenge_flat_never_advances() {
        let mut active = ActiveChallenge::new(0, flat_def());
        assert!(!active.advance());
        assert!(active.answer().is_some());
    }

    #[test]
    fn test_active_challenge_nested_walks_subquestions() {
        let mut active = ActiveChallenge::new(3, nested_def());
        assert_eq!(active.subquestion_number(), Some(1));
        assert_eq!(active.time_limit_sec(), 20);
        assert_eq!(active.view(Role::A), "first A");

        assert!(active.advance());
        assert_eq!(active.subquestion_number(), Some(2));
        assert_eq!(active.time_limit_sec(), 30);
        assert_eq!(active.view(Role::B), "second B");

        assert!(!active.advance());
        assert!(active.answer().is_none());
    }

    #[test]
    fn test_reset_game_clears_game_fields_but_keeps_membership() {
        let mut state = RoomState::new(RoomId::new("R1"), None);
        state.slots.set(Role::A, conn(1));
        state.slots.set(Role::B, conn(2));
        state.mode = Some(Mode::Hard);
        state.round = 3;
        state.cumulative_score = 240;
        state.lives = Some(1);
        state.used.insert(0);
        state.ready.insert(conn(1), true);
        state.status = RoomStatus::Between;
        let epoch = state.epoch;

        state.reset_game();

        assert_eq!(state.status, RoomStatus::Waiting);
        assert_eq!(state.mode, None);
        assert_eq!(state.round, 0);
        assert_eq!(state.cumulative_score, 0);
        assert_eq!(state.lives, None);
        assert!(state.used.is_empty());
        assert!(state.ready.is_empty());
        assert!(state.epoch > epoch);
        // Membership survives the reset.
        assert!(state.slots.both_filled());
    }

    #[test]
    fn test_ready_snapshot_tracks_roles() {
        let mut state = RoomState::new(RoomId::new("R1"), None);
        state.slots.set(Role::A, conn(1));
        state.slots.set(Role::B, conn(2));
        state.ready.insert(conn(2), true);
        let snapshot = state.ready_snapshot();
        assert!(!snapshot.a);
        assert!(snapshot.b);
    }
}
