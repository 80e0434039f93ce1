//! Unified error type for Tangga.

use tangga_protocol::ProtocolError;
use tangga_room::RoomError;
use tangga_transport::TransportError;

/// Top-level error that wraps every crate-specific error, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum TanggaError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame couldn't be encoded or decoded, or broke the handshake.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room rule was violated, or the coordinator is gone.
    #[error(transparent)]
    Room(#[from] RoomError),
}
