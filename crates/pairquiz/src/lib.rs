//! Pairquiz: a two-participant cooperative quiz server.
//!
//! Role A and Role B each receive complementary views of a challenge and
//! must submit a correct answer together before the round timer runs out.
//! This crate ties the layers together: transport → protocol → binding →
//! rooms.
//!
//! ```rust,ignore
//! use pairquiz::prelude::*;
//!
//! let catalog = ChallengeCatalog::load("challenges.json");
//! let server = PairquizServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(catalog)
//!     .await?;
//! server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::PairquizError;
pub use server::{PairquizServer, PairquizServerBuilder};

/// Convenience re-exports for server binaries and tests.
pub mod prelude {
    pub use crate::{PairquizError, PairquizServer, PairquizServerBuilder};
    pub use pairquiz_catalog::ChallengeCatalog;
    pub use pairquiz_protocol::{
        ClientEvent, Codec, ErrorCode, JsonCodec, Mode, Role, RoomId, RoomStatus, ServerEvent,
    };
    pub use pairquiz_room::{DifficultyTable, RuleConfig};
}
