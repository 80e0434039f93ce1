//! Error types for the room layer.

use tangga_protocol::{ConnectionId, RoomCode, RoomStatus};
use tangga_session::SessionError;

/// Errors that can occur during room operations.
///
/// Every variant is recoverable by the player: it is reported to the
/// connection that caused it and nobody else.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room has left `waiting`; joins are closed.
    #[error("room {0} is not accepting players ({1})")]
    RoomNotJoinable(RoomCode, RoomStatus),

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Only the host may start the game.
    #[error("only the host can start the game")]
    NotHost,

    /// At least one non-host player hasn't toggled ready.
    #[error("not all players are ready")]
    NotAllReady,

    /// A turn-scoped action came from someone other than the turn holder.
    #[error("it is not your turn")]
    NotYourTurn,

    /// The connection isn't a member of any room.
    #[error("connection {0} is not in any room")]
    UnknownConnection(ConnectionId),

    /// The connection is already a member of a room.
    #[error("connection {0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomCode),

    /// Turn actions are only legal while playing.
    #[error("no game in progress (room is {0})")]
    GameNotInProgress(RoomStatus),

    /// Readiness and start are only meaningful while waiting.
    #[error("game already started (room is {0})")]
    GameAlreadyStarted(RoomStatus),

    /// A reported board cell lies beyond the last cell.
    #[error("position {position} is outside the board (1..={board_size})")]
    PositionOutOfBounds { position: u32, board_size: u32 },

    /// `hello` arrived on a connection that already completed it.
    #[error("handshake already completed")]
    UnexpectedHandshake,

    /// Code generation kept colliding with live rooms.
    #[error("could not allocate a room code after {0} attempts")]
    CodeSpaceExhausted(usize),

    /// The coordinator task is gone (shut down or panicked).
    #[error("room coordinator is unavailable")]
    Unavailable,
}

impl RoomError {
    /// HTTP-style status code sent alongside the message.
    pub fn code(&self) -> u16 {
        match self {
            Self::RoomNotFound(_) | Self::UnknownConnection(_) => 404,
            Self::NotHost | Self::NotYourTurn => 403,
            Self::RoomNotJoinable(..)
            | Self::RoomFull(_)
            | Self::AlreadyInRoom(..)
            | Self::NotAllReady
            | Self::GameNotInProgress(_)
            | Self::GameAlreadyStarted(_) => 409,
            Self::PositionOutOfBounds { .. } | Self::UnexpectedHandshake => 400,
            Self::CodeSpaceExhausted(_) | Self::Unavailable => 503,
        }
    }
}

impl From<SessionError> for RoomError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownConnection(conn) => Self::UnknownConnection(conn),
            SessionError::AlreadyBound(conn, code) => Self::AlreadyInRoom(conn, code),
        }
    }
}
