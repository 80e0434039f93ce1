//! Error types for the session layer.

use tangga_protocol::{ConnectionId, RoomCode};

/// Errors returned by [`SessionIndex`](crate::SessionIndex) lookups.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection is not bound to any room.
    #[error("connection {0} is not in any room")]
    UnknownConnection(ConnectionId),

    /// The connection is already bound to a room.
    #[error("connection {0} is already in room {1}")]
    AlreadyBound(ConnectionId, RoomCode),
}
