//! Unified error type for the pairquiz server.

use pairquiz_binding::BindingError;
use pairquiz_protocol::ProtocolError;
use pairquiz_room::RoomError;
use pairquiz_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairquizError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, wrong state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A binding-level error (double bind, missing binding).
    #[error(transparent)]
    Binding(#[from] BindingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairquiz_protocol::RoomId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let wrapped: PairquizError = err.into();
        assert!(matches!(wrapped, PairquizError::Transport(_)));
        assert!(wrapped.to_string().contains("gone"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId::new("R1"));
        let wrapped: PairquizError = err.into();
        assert!(matches!(wrapped, PairquizError::Room(_)));
    }

    #[test]
    fn test_from_binding_error() {
        let err = BindingError::NotBound(pairquiz_transport::ConnectionId::new(1));
        let wrapped: PairquizError = err.into();
        assert!(matches!(wrapped, PairquizError::Binding(_)));
    }
}
