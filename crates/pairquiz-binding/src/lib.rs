//! The connection binding index: which room and role a live connection
//! belongs to.
//!
//! This is the lookup the handler consults on every event that names no
//! room (`playerReady`) and on disconnect. The key invariant it enforces:
//! a connection occupies at most one role in at most one room.
//!
//! # Concurrency note
//!
//! `BindingManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the manager is
//! owned by the server state and accessed through a mutex at a higher
//! level. Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;

use pairquiz_protocol::{Role, RoomId};
use pairquiz_transport::ConnectionId;

/// Errors from binding operations.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The connection is already bound to a room.
    #[error("{0} is already bound to room {1}")]
    AlreadyBound(ConnectionId, RoomId),

    /// The connection is not bound to any room.
    #[error("{0} is not bound to a room")]
    NotBound(ConnectionId),
}

/// A connection's place in the world: its room, and its role once
/// `playerReady` assigned one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room: RoomId,
    pub role: Option<Role>,
}

/// Tracks the binding of every connected client.
#[derive(Debug, Default)]
pub struct BindingManager {
    bindings: HashMap<ConnectionId, Binding>,
}

impl BindingManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a room, with no role yet.
    ///
    /// # Errors
    /// Returns [`BindingError::AlreadyBound`] if the connection is already
    /// in a room (one room at a time).
    pub fn bind(&mut self, conn: ConnectionId, room: RoomId) -> Result<(), BindingError> {
        if let Some(existing) = self.bindings.get(&conn) {
            return Err(BindingError::AlreadyBound(conn, existing.room.clone()));
        }
        tracing::debug!(%conn, %room, "connection bound");
        self.bindings.insert(conn, Binding { room, role: None });
        Ok(())
    }

    /// Records the role a room assigned to the connection.
    ///
    /// # Errors
    /// Returns [`BindingError::NotBound`] if the connection has no room.
    pub fn set_role(&mut self, conn: ConnectionId, role: Role) -> Result<(), BindingError> {
        let binding = self
            .bindings
            .get_mut(&conn)
            .ok_or(BindingError::NotBound(conn))?;
        binding.role = Some(role);
        Ok(())
    }

    /// Looks up where a connection lives.
    pub fn get(&self, conn: ConnectionId) -> Option<&Binding> {
        self.bindings.get(&conn)
    }

    /// The room a connection is bound to, if any.
    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.bindings.get(&conn).map(|b| b.room.clone())
    }

    /// Removes a connection's binding on disconnect, returning it so the
    /// caller can notify the room.
    pub fn release(&mut self, conn: ConnectionId) -> Option<Binding> {
        let released = self.bindings.remove(&conn);
        if let Some(b) = &released {
            tracing::debug!(%conn, room = %b.room, "connection released");
        }
        released
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no connection is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_bind_and_lookup() {
        let mut mgr = BindingManager::new();
        mgr.bind(conn(1), RoomId::new("R1")).unwrap();
        assert_eq!(mgr.room_of(conn(1)), Some(RoomId::new("R1")));
        assert_eq!(mgr.get(conn(1)).unwrap().role, None);
    }

    #[test]
    fn test_second_bind_is_rejected() {
        let mut mgr = BindingManager::new();
        mgr.bind(conn(1), RoomId::new("R1")).unwrap();
        let err = mgr.bind(conn(1), RoomId::new("R2")).unwrap_err();
        assert!(matches!(err, BindingError::AlreadyBound(_, _)));
        // The original binding is untouched.
        assert_eq!(mgr.room_of(conn(1)), Some(RoomId::new("R1")));
    }

    #[test]
    fn test_set_role_records_assignment() {
        let mut mgr = BindingManager::new();
        mgr.bind(conn(1), RoomId::new("R1")).unwrap();
        mgr.set_role(conn(1), Role::B).unwrap();
        assert_eq!(mgr.get(conn(1)).unwrap().role, Some(Role::B));
    }

    #[test]
    fn test_set_role_without_binding_fails() {
        let mut mgr = BindingManager::new();
        let err = mgr.set_role(conn(9), Role::A).unwrap_err();
        assert!(matches!(err, BindingError::NotBound(_)));
    }

    #[test]
    fn test_release_returns_binding_and_clears() {
        let mut mgr = BindingManager::new();
        mgr.bind(conn(1), RoomId::new("R1")).unwrap();
        mgr.set_role(conn(1), Role::A).unwrap();

        let released = mgr.release(conn(1)).unwrap();
        assert_eq!(released.room, RoomId::new("R1"));
        assert_eq!(released.role, Some(Role::A));
        assert!(mgr.is_empty());
        // Releasing again is a no-op.
        assert!(mgr.release(conn(1)).is_none());
    }

    #[test]
    fn test_rebind_allowed_after_release() {
        let mut mgr = BindingManager::new();
        mgr.bind(conn(1), RoomId::new("R1")).unwrap();
        mgr.release(conn(1));
        mgr.bind(conn(1), RoomId::new("R2")).unwrap();
        assert_eq!(mgr.room_of(conn(1)), Some(RoomId::new("R2")));
    }
}
