//! # Tangga
//!
//! Real-time coordinator for a multiplayer snakes-and-ladders quiz game.
//!
//! Players connect over WebSocket, create or join a room by its short
//! code, ready up, and take turns rolling dice. The server owns room
//! membership, turn order and dice randomness; clients report where they
//! landed after snakes and ladders.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tangga::prelude::*;
//!
//! # async fn run() -> Result<(), TanggaError> {
//! let server = TanggaServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .rules(GameRules::default())
//!     .build(TracingStats)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TanggaError;
pub use server::{TanggaServer, TanggaServerBuilder};

pub mod prelude {
    pub use crate::{TanggaError, TanggaServer, TanggaServerBuilder};
    pub use tangga_protocol::{
        ClientAction, Codec, ConnectionId, Envelope, JsonCodec, PROTOCOL_VERSION, RoomCode,
        RoomStatus, RoomView, ServerEvent,
    };
    pub use tangga_room::{
        CoordinatorHandle, GameReport, GameRules, JsonLinesStats, RoomError, StatsSink,
        TracingStats,
    };
}
