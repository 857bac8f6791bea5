//! Room actor: an isolated Tokio task that owns one quiz session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel — no shared mutable state, just message passing.
//! Every handler runs to completion without awaiting, so the state is never
//! observed mid-mutation. Deferred work (the next-round delay, timer ticks)
//! re-enters through the same channel and is re-validated against the
//! room's epoch and timer generation before it acts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pairquiz_catalog::{ChallengeCatalog, matches_answer};
use pairquiz_protocol::{Mode, Occupancy, Role, RoomId, RoomStatus, ServerEvent};
use pairquiz_timer::{RoundTimer, TimerEvent};
use pairquiz_transport::ConnectionId;
use rand::seq::IndexedRandom;
use tokio::sync::{mpsc, oneshot};

use crate::state::{ActiveChallenge, RoomState};
use crate::{RoomError, RuleConfig};

/// Channel sender delivering server events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Result of a `playerReady` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyOutcome {
    /// The role this connection holds (kept or newly assigned).
    pub role: Role,
    /// Whether this call completed the handshake and scheduled round 1.
    pub started: bool,
    /// The mode the game is locked to.
    pub mode: Mode,
}

/// Result of a `submitAnswer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Points awarded (correct submissions only).
    pub score: Option<u32>,
    /// Whether this miss ended the game (lives reached zero).
    pub game_over: bool,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub players: Occupancy,
    pub waiting: usize,
    pub round: u32,
    pub cumulative_score: u32,
    pub lives: Option<u32>,
    pub mode: Option<Mode>,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add a connection to the room.
    Join {
        conn: ConnectionId,
        sender: EventSender,
        reply: oneshot::Sender<Result<RoomStatus, RoomError>>,
    },

    /// Remove a connection (disconnect).
    Leave { conn: ConnectionId },

    /// Declare readiness, optionally picking a role and mode.
    Ready {
        conn: ConnectionId,
        preferred_role: Option<Role>,
        mode: Option<Mode>,
        reply: oneshot::Sender<Result<ReadyOutcome, RoomError>>,
    },

    /// Submit an answer for the active challenge.
    Submit {
        conn: ConnectionId,
        answer: String,
        remain_ms: u64,
        reply: oneshot::Sender<Result<AnswerOutcome, RoomError>>,
    },

    /// Relay a chat message.
    Chat { conn: ConnectionId, message: String },

    /// Reset the game in place, keeping membership.
    Continue,

    /// Deferred round start. `epoch` is the room epoch at scheduling time;
    /// a mismatch means the room was reset or demoted in the interim.
    StartRound { epoch: u64 },

    /// A tick or expiration from the round timer.
    Timer(TimerEvent),

    /// Request the current room snapshot.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room actor.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's identifier.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }

    /// Adds a connection, returning the room's current status.
    pub async fn join(
        &self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<RoomStatus, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a connection (fire-and-forget; used on disconnect).
    pub async fn leave(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { conn })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Declares readiness for `conn`.
    pub async fn ready(
        &self,
        conn: ConnectionId,
        preferred_role: Option<Role>,
        mode: Option<Mode>,
    ) -> Result<ReadyOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Ready {
                conn,
                preferred_role,
                mode,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Submits an answer for the active challenge.
    pub async fn submit(
        &self,
        conn: ConnectionId,
        answer: String,
        remain_ms: u64,
    ) -> Result<AnswerOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Submit {
                conn,
                answer,
                remain_ms,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Relays a chat message to the room.
    pub async fn chat(&self, conn: ConnectionId, message: String) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Chat { conn, message })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Resets the game in place.
    pub async fn continue_game(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Continue)
            .await
            .map_err(|_| self.unavailable())
    }

    /// Requests the current room snapshot.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The room actor. Runs inside a Tokio task.
struct RoomActor {
    state: RoomState,
    rules: Arc<RuleConfig>,
    catalog: Arc<ChallengeCatalog>,
    /// Per-connection outbound channels — the transport-level membership
    /// that capacity is counted against.
    senders: HashMap<ConnectionId, EventSender>,
    /// Own command sender, cloned into timers and deferred tasks.
    cmd_tx: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.state.id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { conn, sender, reply } => {
                    let _ = reply.send(self.handle_join(conn, sender));
                }
                RoomCommand::Leave { conn } => self.handle_leave(conn),
                RoomCommand::Ready {
                    conn,
                    preferred_role,
                    mode,
                    reply,
                } => {
                    let _ = reply.send(self.handle_ready(conn, preferred_role, mode));
                }
                RoomCommand::Submit {
                    conn,
                    answer,
                    remain_ms,
                    reply,
                } => {
                    let _ = reply.send(self.handle_submit(conn, &answer, remain_ms));
                }
                RoomCommand::Chat { conn, message } => self.handle_chat(conn, message),
                RoomCommand::Continue => self.handle_continue(),
                RoomCommand::StartRound { epoch } => self.handle_start_round(epoch),
                RoomCommand::Timer(ev) => self.handle_timer(ev),
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    self.state.stop_timer();
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.state.id, "room actor stopped");
    }

    // -- membership ---------------------------------------------------------

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<RoomStatus, RoomError> {
        if self.senders.contains_key(&conn) {
            return Ok(self.state.status);
        }
        if self.senders.len() >= self.rules.room_capacity {
            return Err(RoomError::RoomFull(self.state.id.clone()));
        }

        self.senders.insert(conn, sender);
        self.state.waiting.push(conn);
        tracing::info!(
            room_id = %self.state.id,
            %conn,
            members = self.senders.len(),
            "connection joined"
        );
        self.broadcast_room_update();
        Ok(self.state.status)
    }

    fn handle_leave(&mut self, conn: ConnectionId) {
        if self.senders.remove(&conn).is_none() {
            return;
        }
        self.state.waiting.retain(|c| *c != conn);
        self.state.ready.remove(&conn);
        let freed = self.state.slots.clear(conn);

        tracing::info!(
            room_id = %self.state.id,
            %conn,
            role = freed.map(|r| r.to_string()).unwrap_or_default(),
            "connection left"
        );

        // Losing an assigned player mid-round demotes the room, but never
        // deletes it: the survivor waits for a new partner.
        if freed.is_some() && self.state.status.is_playing() {
            self.state.stop_timer();
            self.state.current = None;
            self.state.status = RoomStatus::Waiting;
            self.state.epoch += 1;
            self.send_all(ServerEvent::System {
                message: "partner disconnected, waiting for a new partner".into(),
            });
        }
        self.broadcast_room_update();
    }

    // -- readiness ----------------------------------------------------------

    fn handle_ready(
        &mut self,
        conn: ConnectionId,
        preferred_role: Option<Role>,
        mode: Option<Mode>,
    ) -> Result<ReadyOutcome, RoomError> {
        if !self.senders.contains_key(&conn) {
            return Err(RoomError::NotFound(self.state.id.clone()));
        }

        // The first ready call fixes the mode for the whole game; later
        // calls with a different mode get a corrective notice, not an error.
        let fixed = match self.state.mode {
            Some(current) => {
                if mode.is_some() && mode != Some(current) {
                    self.send_to(
                        conn,
                        ServerEvent::System {
                            message: format!("mode is locked to {current} for this game"),
                        },
                    );
                }
                current
            }
            None => {
                let chosen = mode.or(self.state.default_mode).unwrap_or(Mode::Normal);
                self.state.mode = Some(chosen);
                self.state.lives = self.rules.initial_lives(chosen);
                tracing::info!(room_id = %self.state.id, mode = %chosen, "mode fixed");
                chosen
            }
        };

        let role = match self.state.slots.role_of(conn) {
            Some(role) => role,
            None => {
                let role = self
                    .state
                    .slots
                    .free_slot(preferred_role)
                    .ok_or(RoomError::RolesFull)?;
                self.state.slots.set(role, conn);
                self.state.waiting.retain(|c| *c != conn);
                tracing::info!(room_id = %self.state.id, %conn, %role, "role assigned");
                self.broadcast_room_update();
                role
            }
        };

        self.state.ready.insert(conn, true);
        self.send_all(ServerEvent::ReadyUpdate {
            ready: self.state.ready_snapshot(),
        });

        let snapshot = self.state.ready_snapshot();
        let started = self.state.slots.both_filled()
            && snapshot.a
            && snapshot.b
            && self.state.status == RoomStatus::Waiting;

        if started {
            self.state.status = RoomStatus::Playing;
            self.schedule_start_round(self.rules.ready_start_delay);
            tracing::info!(
                room_id = %self.state.id,
                mode = %fixed,
                "readiness complete, first round scheduled"
            );
        }

        Ok(ReadyOutcome {
            role,
            started,
            mode: fixed,
        })
    }

    // -- round progression --------------------------------------------------

    /// Spawns the deferred `StartRound` delivery. The epoch recorded here
    /// is checked on arrival: a reset or demotion in between invalidates
    /// the scheduled start.
    fn schedule_start_round(&self, delay: Duration) {
        let tx = self.cmd_tx.clone();
        let epoch = self.state.epoch;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoomCommand::StartRound { epoch }).await;
        });
    }

    fn handle_start_round(&mut self, epoch: u64) {
        if epoch != self.state.epoch {
            tracing::debug!(room_id = %self.state.id, "stale round start discarded");
            return;
        }
        let Some(mode) = self.state.mode else {
            self.state.status = RoomStatus::Waiting;
            return;
        };

        // Game complete: announce and reset to a fresh waiting room.
        if self.state.round >= self.rules.round_limit {
            self.finish_game("all rounds complete");
            return;
        }

        // A partner left while the round was pending.
        if !self.state.slots.both_filled() {
            self.state.status = RoomStatus::Waiting;
            self.send_all(ServerEvent::System {
                message: "waiting for a partner to join".into(),
            });
            return;
        }

        let levels = self.rules.difficulty_table.accepted(mode);
        let mut eligible = self.catalog.eligible(levels, &self.state.used);
        if eligible.is_empty() && !self.state.used.is_empty() {
            // Every eligible challenge has been served: recycle the pool
            // rather than stalling the game.
            self.state.used.clear();
            eligible = self.catalog.eligible(levels, &self.state.used);
        }

        let chosen = eligible
            .as_slice()
            .choose(&mut rand::rng())
            .map(|(index, def)| (*index, (*def).clone()));
        let Some((index, definition)) = chosen else {
            tracing::warn!(room_id = %self.state.id, %mode, "no eligible challenge for mode");
            self.send_all(ServerEvent::System {
                message: format!("no {mode} challenges are available"),
            });
            return;
        };

        self.state.used.insert(index);
        self.state.round += 1;
        self.state.status = RoomStatus::Playing;
        self.state.current = Some(ActiveChallenge::new(index, definition));
        tracing::info!(
            room_id = %self.state.id,
            round = self.state.round,
            challenge = index,
            "round started"
        );

        self.start_round_timer();
        self.dispatch_question();
    }

    /// Starts (or restarts) the countdown for the current position.
    /// Any previous timer is stopped first.
    fn start_round_timer(&mut self) {
        let Some(limit) = self.state.current.as_ref().map(|c| c.time_limit_sec()) else {
            return;
        };
        self.state.stop_timer();
        self.state.timer_generation += 1;
        self.state.timer = Some(RoundTimer::start(
            self.state.timer_generation,
            Duration::from_secs(limit),
            self.cmd_tx.clone(),
            RoomCommand::Timer,
        ));
    }

    /// Sends each role its own view. The counterpart's view never crosses
    /// over — this is the confidentiality boundary of the whole game.
    fn dispatch_question(&self) {
        let Some(current) = self.state.current.as_ref() else {
            return;
        };
        let Some(mode) = self.state.mode else {
            return;
        };

        let def = &current.definition;
        let subquestion = current.subquestion_number();
        // Round 1's opening position announces the game; everything after
        // (later rounds, subquestion advances) is a new question.
        let initial = self.state.round == 1 && subquestion.unwrap_or(1) == 1;

        for role in [Role::A, Role::B] {
            let Some(conn) = self.state.slots.get(role) else {
                continue;
            };
            let title = def.title.clone();
            let view = current.view(role).to_string();
            let base_score = def.base_score;
            let time_limit_sec = current.time_limit_sec();
            let lives = self.state.lives;
            let round = self.state.round;
            let cumulative_score = self.state.cumulative_score;
            let ev = if initial {
                ServerEvent::GameStarted {
                    title,
                    view,
                    base_score,
                    time_limit_sec,
                    lives,
                    mode,
                    round,
                    cumulative_score,
                    subquestion,
                }
            } else {
                ServerEvent::NewQuestion {
                    title,
                    view,
                    base_score,
                    time_limit_sec,
                    lives,
                    mode,
                    round,
                    cumulative_score,
                    subquestion,
                }
            };
            self.send_to(conn, ev);
        }
    }

    // -- timer --------------------------------------------------------------

    fn handle_timer(&mut self, ev: TimerEvent) {
        // Events from a replaced or stopped timer are stale by definition.
        let live = self
            .state
            .timer
            .as_ref()
            .map(|t| t.generation());
        if live != Some(ev.generation()) {
            tracing::trace!(room_id = %self.state.id, "stale timer event discarded");
            return;
        }

        match ev {
            TimerEvent::Tick { remain_ms, .. } => {
                if self.state.status.is_playing() {
                    self.send_all(ServerEvent::Timer { remain_ms });
                }
            }
            TimerEvent::Expired { .. } => {
                self.state.timer = None;
                self.on_timer_expired();
            }
        }
    }

    fn on_timer_expired(&mut self) {
        if !self.state.status.is_playing() || self.state.current.is_none() {
            return;
        }
        let Some(mode) = self.state.mode else {
            return;
        };
        tracing::info!(room_id = %self.state.id, round = self.state.round, "round timed out");

        if matches!(mode, Mode::Normal | Mode::Hard) && self.deduct_life(mode) {
            return; // lives hit zero, game finished
        }

        self.state.current = None;
        self.state.status = RoomStatus::Between;
        let next_in = self.rules.next_round_delay;
        self.send_all(ServerEvent::RoundTimeout {
            round: self.state.round,
            next_in_ms: next_in.as_millis() as u64,
        });
        self.schedule_start_round(next_in);
    }

    /// Removes one life, lazily initializing the pool from the mode's
    /// default. Returns `true` when the game ended because lives hit zero.
    fn deduct_life(&mut self, mode: Mode) -> bool {
        let initial = self.rules.initial_lives(mode).unwrap_or(0);
        let lives = self.state.lives.get_or_insert(initial);
        *lives = lives.saturating_sub(1);
        let remaining = *lives;
        self.send_all(ServerEvent::LivesUpdate { lives: remaining });
        if remaining == 0 {
            self.finish_game("out of lives");
            true
        } else {
            false
        }
    }

    /// Announces the final score, then resets to a fresh waiting room.
    /// Membership survives; score, round, lives, mode, and used indices
    /// do not.
    fn finish_game(&mut self, reason: &str) {
        let total = self.state.cumulative_score;
        tracing::info!(room_id = %self.state.id, total, reason, "game finished");
        self.send_all(ServerEvent::GameFinished {
            message: reason.to_string(),
            total_score: total,
        });
        self.state.reset_game();
    }

    // -- answers ------------------------------------------------------------

    fn handle_submit(
        &mut self,
        conn: ConnectionId,
        answer: &str,
        remain_ms: u64,
    ) -> Result<AnswerOutcome, RoomError> {
        if !self.senders.contains_key(&conn) {
            return Err(RoomError::NotFound(self.state.id.clone()));
        }
        if !self.state.status.is_playing() {
            return Err(RoomError::NotPlaying);
        }
        let Some(mode) = self.state.mode else {
            return Err(RoomError::NotPlaying);
        };

        let (correct, base_score, limit, nested) = {
            let current = self.state.current.as_ref().ok_or(RoomError::NoQuestion)?;
            let spec = current.answer().ok_or(RoomError::NoSubquestion)?;
            (
                matches_answer(spec, answer),
                current.definition.base_score,
                current.time_limit_sec(),
                current.definition.is_nested(),
            )
        };
        tracing::debug!(room_id = %self.state.id, %conn, correct, "answer evaluated");

        if !correct {
            // The round keeps running on a non-fatal miss: the timer is
            // untouched and further attempts stay possible.
            let game_over = match mode {
                Mode::Normal | Mode::Hard => self.deduct_life(mode),
                Mode::Easy => false,
            };
            return Ok(AnswerOutcome {
                correct: false,
                score: None,
                game_over,
            });
        }

        let score = self
            .rules
            .scoring
            .score_for_mode(mode, base_score, limit, remain_ms);
        self.state.stop_timer();
        self.state.cumulative_score += score;
        let cumulative = self.state.cumulative_score;

        self.send_all(ServerEvent::AnswerResult {
            correct: true,
            score: Some(score),
            cumulative_score: Some(cumulative),
        });
        self.send_all(ServerEvent::UpdateScore {
            cumulative_score: cumulative,
        });

        // Nested challenges step to the next subquestion inside the same
        // round; everything else concludes the round.
        let more = self
            .state
            .current
            .as_mut()
            .map(|c| c.advance())
            .unwrap_or(false);
        if more {
            self.start_round_timer();
            self.dispatch_question();
            return Ok(AnswerOutcome {
                correct: true,
                score: Some(score),
                game_over: false,
            });
        }

        if nested {
            self.send_all(ServerEvent::BigQuestionFinished {
                message: "big question complete".into(),
                total_score: cumulative,
            });
        }

        self.state.current = None;
        self.state.status = RoomStatus::Between;
        self.schedule_start_round(self.rules.next_round_delay);

        Ok(AnswerOutcome {
            correct: true,
            score: Some(score),
            game_over: false,
        })
    }

    // -- misc ---------------------------------------------------------------

    fn handle_chat(&mut self, conn: ConnectionId, message: String) {
        if !self.senders.contains_key(&conn) {
            return;
        }
        let message: String = message.chars().take(self.rules.chat_max_chars).collect();
        let from = match self.state.slots.role_of(conn) {
            Some(role) => role.to_string(),
            None => conn.to_string(),
        };
        self.send_all(ServerEvent::Chat { from, message });
    }

    fn handle_continue(&mut self) {
        tracing::info!(room_id = %self.state.id, "game reset in place");
        self.state.reset_game();
        self.send_all(ServerEvent::RoomReset {
            message: "room reset, ready up to play again".into(),
        });
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.state.id.clone(),
            status: self.state.status,
            players: self.state.slots.occupancy(),
            waiting: self.state.waiting.len(),
            round: self.state.round,
            cumulative_score: self.state.cumulative_score,
            lives: self.state.lives,
            mode: self.state.mode,
        }
    }

    fn broadcast_room_update(&self) {
        self.send_all(ServerEvent::RoomUpdate {
            players: self.state.slots.occupancy(),
            waiting: self.state.waiting.len(),
        });
    }

    /// Delivers an event to every connection in the room. A gone receiver
    /// is silently skipped; the leave path cleans it up.
    fn send_all(&self, ev: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(ev.clone());
        }
    }

    /// Delivers an event to a single connection.
    fn send_to(&self, conn: ConnectionId, ev: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(ev);
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    default_mode: Option<Mode>,
    rules: Arc<RuleConfig>,
    catalog: Arc<ChallengeCatalog>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        state: RoomState::new(room_id.clone(), default_mode),
        rules,
        catalog,
        senders: HashMap::new(),
        cmd_tx: tx.clone(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
