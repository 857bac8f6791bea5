//! Error types for the room layer.

use pairquiz_protocol::{ErrorCode, RoomId};

/// Errors that can occur during room operations.
///
/// These are client protocol errors: they surface as [`ErrorCode`]s in
/// acknowledgement events and are never allowed to take down a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room already holds its maximum number of connections.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Both role slots are taken by other connections.
    #[error("both role slots are taken")]
    RolesFull,

    /// The action requires an active round.
    #[error("no round is in progress")]
    NotPlaying,

    /// There is no active challenge to answer.
    #[error("no active question")]
    NoQuestion,

    /// The nested challenge has no subquestion left to answer.
    #[error("no subquestion left to answer")]
    NoSubquestion,

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The wire error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::NotFound(_) | RoomError::Unavailable(_) => ErrorCode::RoomNotFound,
            RoomError::RoomFull(_) => ErrorCode::RoomFull,
            RoomError::RolesFull => ErrorCode::RolesFull,
            RoomError::NotPlaying => ErrorCode::NotPlaying,
            RoomError::NoQuestion => ErrorCode::NoQuestion,
            RoomError::NoSubquestion => ErrorCode::NoSubquestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_to_wire_values() {
        assert_eq!(
            RoomError::NotFound(RoomId::new("X")).code(),
            ErrorCode::RoomNotFound
        );
        assert_eq!(
            RoomError::Unavailable(RoomId::new("X")).code(),
            ErrorCode::RoomNotFound
        );
        assert_eq!(RoomError::RolesFull.code(), ErrorCode::RolesFull);
        assert_eq!(RoomError::NotPlaying.code(), ErrorCode::NotPlaying);
        assert_eq!(RoomError::NoSubquestion.code(), ErrorCode::NoSubquestion);
    }
}
