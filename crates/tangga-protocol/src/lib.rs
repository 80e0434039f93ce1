//! Wire protocol for Tangga.
//!
//! This crate defines the "language" that players and the server speak:
//!
//! - **Types** ([`RoomCode`], [`RoomView`], [`PlayerView`], etc.):
//!   identifiers and snapshots that appear inside messages.
//! - **Messages** ([`ClientAction`], [`ServerEvent`], [`Envelope`]):
//!   what a client may ask for and what the server tells it.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are
//!   converted to/from frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (ClientAction / ServerEvent) → Room coordinator
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{ClientAction, Envelope, PROTOCOL_VERSION, ServerEvent};
pub use tangga_transport::ConnectionId;
pub use types::{
    Color, GameSession, PlayerView, Recipient, RoomCode, RoomStatus, RoomSummary, RoomView,
};
