//! Client actions and server events.
//!
//! Both enums are internally tagged on `type` with snake_case names, so
//! a roll looks like `{"type":"roll_dice"}` on the wire and the resulting
//! broadcast like `{"type":"dice_rolled","connection_id":3,"value":5}`.
//! The dispatcher matches on [`ClientAction`] exhaustively; adding an
//! action without handling it is a compile error.

use serde::{Deserialize, Serialize};
use tangga_transport::ConnectionId;

use crate::{PlayerView, RoomCode, RoomSummary, RoomView};

/// The current protocol version. Clients must send it in `hello` or be
/// rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    /// Opening handshake; must be the first message on a connection.
    Hello { version: u32 },

    /// Create a room and become its host.
    CreateRoom {
        player_name: String,
        level: u32,
        /// Falls back to the server's default capacity when absent.
        #[serde(default)]
        max_players: Option<usize>,
    },

    /// Join a waiting room by code.
    JoinRoom {
        room_code: RoomCode,
        player_name: String,
    },

    /// Flip this player's ready flag.
    ToggleReady,

    /// Host only: move the room from waiting to playing.
    StartGame,

    /// Turn holder only: draw a dice value.
    RollDice,

    /// Turn holder only: the board cell the client landed on after
    /// applying the roll and any snake or ladder.
    ReportPosition { position: u32 },

    /// Turn holder only: the quiz at this checkpoint was answered.
    QuizCompleted { position: u32 },

    /// Turn holder only: pass the turn to the next player.
    NextTurn,

    /// Any player while playing: claim the win and end the game.
    DeclareWin,

    /// Leave the current room. Same cleanup as a dropped connection.
    LeaveRoom,

    /// List rooms that can still be joined.
    ListRooms,

    /// Keep-alive.
    Ping,
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Handshake accepted. `connection_id` is how this player appears in
    /// every room snapshot.
    Welcome {
        connection_id: ConnectionId,
        server_time: u64,
    },

    /// Sent to the creator only.
    RoomCreated { room_code: RoomCode, room: RoomView },

    /// Broadcast to the room, joiner included.
    PlayerJoined { player: PlayerView, room: RoomView },

    /// A ready flag changed.
    RoomUpdated { room: RoomView },

    GameStarted { room: RoomView },

    DiceRolled {
        connection_id: ConnectionId,
        value: u8,
    },

    PlayerMoved {
        connection_id: ConnectionId,
        position: u32,
    },

    QuizUpdate {
        connection_id: ConnectionId,
        completed_checkpoints: Vec<u32>,
    },

    TurnChanged {
        connection_id: ConnectionId,
        player_name: String,
    },

    GameEnded { winner: PlayerView },

    /// Sent to the players who remain; `room` reflects any host change.
    PlayerLeft {
        connection_id: ConnectionId,
        room: RoomView,
    },

    RoomList { rooms: Vec<RoomSummary> },

    Pong,

    /// Sent to the originator of a rejected action only. `code` follows
    /// HTTP conventions (403 forbidden, 404 not found, 409 conflict, ...).
    Error { code: u16, message: String },
}

/// Wrapper around every outbound event.
///
/// `seq` increases by one per connection, so a client can tell that it
/// saw every event in order. `timestamp` is milliseconds since the Unix
/// epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub timestamp: u64,
    pub event: ServerEvent,
}
