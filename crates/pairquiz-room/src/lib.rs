//! Room lifecycle and the round state machine for pairquiz.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! room state. All state mutation happens inside the actor's
//! command handlers, which run to completion without suspension points —
//! delayed work (the next-round delay, timer ticks) re-enters through the
//! same command channel and re-validates before acting.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates rooms, routes joins, sweeps unused rooms
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RuleConfig`] / [`DifficultyTable`] — the fixed game rules
//! - [`RoomError`] — room-level failures, mapped to wire error codes

mod config;
mod error;
mod registry;
mod room;
mod state;

pub use config::{DifficultyTable, RuleConfig};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{AnswerOutcome, EventSender, ReadyOutcome, RoomHandle, RoomInfo};
