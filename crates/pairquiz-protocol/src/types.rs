//! Core wire types for the pairquiz protocol.
//!
//! The wire format is JSON, one object per WebSocket text frame, internally
//! tagged with a `"type"` field in camelCase. Field names are camelCase too,
//! matching what a browser client sends and expects.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A short, opaque room identifier, unique within the process lifetime.
///
/// Newtype wrapper so a room id can't be confused with any other string on
/// an API boundary. `#[serde(transparent)]` keeps the wire form a plain
/// JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an already-generated identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// The two asymmetric participant roles. Each role sees its own view of a
/// challenge and never the counterpart's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    A,
    B,
}

impl Role {
    /// The counterpart role.
    pub fn other(self) -> Role {
        match self {
            Role::A => Role::B,
            Role::B => Role::A,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::A => write!(f, "A"),
            Role::B => write!(f, "B"),
        }
    }
}

/// Difficulty/ruleset selector, fixed per game once both players are ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Easy,
    Normal,
    Hard,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Easy => write!(f, "easy"),
            Mode::Normal => write!(f, "normal"),
            Mode::Hard => write!(f, "hard"),
        }
    }
}

/// Lifecycle status of a room.
///
/// ```text
/// Waiting → Playing → Between → Playing → … → (game end) → Waiting
/// ```
///
/// There is no terminal state: a finished game resets back to `Waiting`
/// and awaits a fresh readiness handshake or disuse deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Fewer than two players, or readiness incomplete.
    Waiting,
    /// A challenge is active and the round timer is running.
    Playing,
    /// A round concluded; the next one is scheduled.
    Between,
}

impl RoomStatus {
    /// Whether a challenge may currently be answered.
    pub fn is_playing(self) -> bool {
        matches!(self, RoomStatus::Playing)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Waiting => write!(f, "waiting"),
            RoomStatus::Playing => write!(f, "playing"),
            RoomStatus::Between => write!(f, "between"),
        }
    }
}

/// Machine-readable error codes surfaced in acknowledgement events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    RolesFull,
    NotPlaying,
    NoQuestion,
    NoSubquestion,
}

/// Per-role occupancy snapshot, used by `roomUpdate` (slot filled?) and
/// `readyUpdate` (slot ready?).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Occupancy {
    pub a: bool,
    pub b: bool,
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Events a client can send.
///
/// Optional fields use `#[serde(default)]` so a client may simply omit them;
/// an absent `answer` decodes to `None` and is treated as the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Create a new room, optionally pre-selecting a mode.
    CreateRoom {
        #[serde(default)]
        mode: Option<Mode>,
    },

    /// Join an existing room by id.
    JoinRoom { room_id: RoomId },

    /// Declare readiness (and optionally a preferred role and mode).
    /// The room is resolved from the connection's binding.
    PlayerReady {
        #[serde(default)]
        preferred_role: Option<Role>,
        #[serde(default)]
        mode: Option<Mode>,
    },

    /// Submit an answer for the active challenge. `remain_ms` is the
    /// client-observed remaining time, used for time-pressure scoring.
    SubmitAnswer {
        room_id: RoomId,
        #[serde(default)]
        answer: Option<String>,
        remain_ms: u64,
    },

    /// Free-form chat to the room. No acknowledgement.
    Chat { room_id: RoomId, message: String },

    /// Restart the game in place: score, round, lives, and mode reset,
    /// membership preserved.
    ContinueGame { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Events the server sends: per-request acknowledgements and room-scoped
/// broadcasts.
///
/// `gameStarted` and `newQuestion` are always unicast per role — the `view`
/// field is role-specific and must never reach the counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    // -- Acknowledgements --
    /// Reply to `createRoom`.
    RoomCreated { room_id: RoomId },

    /// Reply to `joinRoom`. `role_assigned` is always `null` here; roles
    /// are assigned by `playerReady`.
    JoinResult {
        ok: bool,
        role_assigned: Option<Role>,
        room_status: Option<RoomStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorCode>,
    },

    /// Reply to `playerReady`. `started` is true when this call completed
    /// the handshake and the first round has been scheduled.
    ReadyResult {
        ok: bool,
        role_assigned: Option<Role>,
        started: bool,
        mode: Option<Mode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorCode>,
    },

    /// Reply to `submitAnswer`.
    AnswerAck {
        ok: bool,
        correct: Option<bool>,
        score: Option<u32>,
        game_over: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorCode>,
    },

    // -- Room broadcasts --
    /// Membership snapshot, sent on every join/role-assignment/disconnect.
    RoomUpdate { players: Occupancy, waiting: usize },

    /// Readiness snapshot per role.
    ReadyUpdate { ready: Occupancy },

    /// Round 1 dispatch (game begins). Role-specific.
    GameStarted {
        title: String,
        view: String,
        base_score: u32,
        time_limit_sec: u64,
        lives: Option<u32>,
        mode: Mode,
        round: u32,
        cumulative_score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subquestion: Option<u32>,
    },

    /// Rounds 2+ and nested subquestion advances. Role-specific.
    NewQuestion {
        title: String,
        view: String,
        base_score: u32,
        time_limit_sec: u64,
        lives: Option<u32>,
        mode: Mode,
        round: u32,
        cumulative_score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subquestion: Option<u32>,
    },

    /// Countdown tick.
    Timer { remain_ms: u64 },

    /// The round timed out; the next one starts in `next_in_ms`.
    RoundTimeout { round: u32, next_in_ms: u64 },

    /// Lives changed (Normal/Hard only).
    LivesUpdate { lives: u32 },

    /// Broadcast on a correct submission.
    AnswerResult {
        correct: bool,
        score: Option<u32>,
        cumulative_score: Option<u32>,
    },

    /// Cumulative score changed.
    UpdateScore { cumulative_score: u32 },

    /// A nested challenge's final subquestion was answered.
    BigQuestionFinished {
        message: String,
        #[serde(rename = "totalscore")]
        total_score: u32,
    },

    /// The game ended (round limit or lives exhausted). The room resets
    /// to `waiting` immediately after this.
    GameFinished {
        message: String,
        #[serde(rename = "totalscore")]
        total_score: u32,
    },

    /// The room was reset in place by `continueGame`.
    RoomReset { message: String },

    /// Human-readable notice (diagnostics, corrective hints).
    System { message: String },

    /// Relayed chat message.
    Chat { from: String, message: String },
}

// =========================================================================
// Tests
// =========================================================================
