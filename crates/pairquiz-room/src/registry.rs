//! Room registry: creates, tracks, and deletes rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pairquiz_catalog::ChallengeCatalog;
use pairquiz_protocol::{Mode, RoomId, RoomStatus};
use pairquiz_transport::ConnectionId;
use rand::Rng;
use tokio::time::Instant;

use crate::room::{EventSender, RoomHandle, spawn_room};
use crate::{RoomError, RuleConfig};

/// Room-id alphabet: uppercase letters and digits minus the ambiguous
/// I/O/0/1.
const ROOM_ID_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated room id.
const ROOM_ID_LEN: usize = 6;

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

struct RoomEntry {
    handle: RoomHandle,
    created: Instant,
    /// Set on the first successful join. Rooms nobody ever joined are the
    /// only ones the disuse sweep may delete.
    ever_joined: bool,
}

/// The process-wide room map.
///
/// Not thread-safe by itself — the server owns it behind a mutex, and all
/// access happens inside single handler callbacks.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomEntry>,
    rules: Arc<RuleConfig>,
    catalog: Arc<ChallengeCatalog>,
}

impl RoomRegistry {
    /// Creates an empty registry over a loaded catalog.
    pub fn new(catalog: Arc<ChallengeCatalog>, rules: Arc<RuleConfig>) -> Self {
        Self {
            rooms: HashMap::new(),
            rules,
            catalog,
        }
    }

    /// Creates a new room and returns its id.
    ///
    /// `default_mode` is remembered and applied when the first ready call
    /// names no mode.
    pub fn create_room(&mut self, default_mode: Option<Mode>) -> RoomId {
        let room_id = loop {
            let candidate = generate_room_id();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            room_id.clone(),
            default_mode,
            Arc::clone(&self.rules),
            Arc::clone(&self.catalog),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(
            room_id.clone(),
            RoomEntry {
                handle,
                created: Instant::now(),
                ever_joined: false,
            },
        );
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Adds a connection to a room, marking the room as joined so the
    /// disuse sweep leaves it alone from now on.
    pub async fn join(
        &mut self,
        room_id: &RoomId,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<RoomStatus, RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        let status = entry.handle.join(conn, sender).await?;
        entry.ever_joined = true;
        Ok(status)
    }

    /// Returns a handle to a room.
    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|e| e.handle.clone())
    }

    /// Deletes rooms that were never joined and have outlived the grace
    /// period. Returns how many were removed. Rooms with any join history
    /// are never touched — a room is never deleted mid-game.
    pub async fn sweep_unused(&mut self, grace: Duration) -> usize {
        let stale: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, e)| !e.ever_joined && e.created.elapsed() >= grace)
            .map(|(id, _)| id.clone())
            .collect();

        for room_id in &stale {
            if let Some(entry) = self.rooms.remove(room_id) {
                let _ = entry.handle.shutdown().await;
                tracing::info!(%room_id, "unused room removed");
            }
        }
        stale.len()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Whether a room exists.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }
}

/// Generates a short random room id.
fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let id: String = (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_CHARSET[rng.random_range(0..ROOM_ID_CHARSET.len())] as char)
        .collect();
    RoomId::new(id)
}
