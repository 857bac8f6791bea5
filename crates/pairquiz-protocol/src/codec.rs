//! Codec trait and implementations for the wire format.
//!
//! The protocol rides on WebSocket text frames, so a codec converts between
//! Rust types and `String` payloads. The trait exists so the JSON format
//! can be swapped without touching the server or handler layers.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to text frames and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed or does
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, debuggable in browser DevTools, and what every quiz
/// client speaks. Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, RoomId, ServerEvent};

    #[test]
    fn test_json_codec_round_trips_client_event() {
        let codec = JsonCodec;
        let ev = ClientEvent::JoinRoom {
            room_id: RoomId::new("AB12CD"),
        };
        let text = codec.encode(&ev).unwrap();
        let back: ClientEvent = codec.decode(&text).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn test_json_codec_round_trips_server_event() {
        let codec = JsonCodec;
        let ev = ServerEvent::System {
            message: "waiting for partner".into(),
        };
        let text = codec.encode(&ev).unwrap();
        let back: ServerEvent = codec.decode(&text).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn test_json_codec_decode_garbage_fails() {
        let codec = JsonCodec;
        let r: Result<ClientEvent, _> = codec.decode("not json at all");
        assert!(r.is_err());
    }
}
