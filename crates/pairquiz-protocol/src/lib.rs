//! Wire protocol for the pairquiz server.
//!
//! Everything that travels between client and server is defined here: the
//! identity types, the client/server event enums, and the codec that turns
//! them into JSON text frames.
//!
//! # Key types
//!
//! - [`ClientEvent`] / [`ServerEvent`] — the two directions of the protocol
//! - [`RoomId`], [`Role`], [`Mode`], [`RoomStatus`] — shared vocabulary
//! - [`ErrorCode`] — machine-readable errors carried in acknowledgements
//! - [`Codec`] / [`JsonCodec`] — pluggable serialization

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ErrorCode, Mode, Occupancy, Role, RoomId, RoomStatus,
    ServerEvent,
};
