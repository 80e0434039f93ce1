//! Identifiers and room snapshots that travel inside messages.
//!
//! Snapshots ([`RoomView`], [`PlayerView`]) are read-only copies of the
//! server's room state. Clients render from them; the server never reads
//! them back.

use std::fmt;

use serde::{Deserialize, Serialize};
use tangga_transport::ConnectionId;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A short, human-shareable room code such as `K7QD2M`.
///
/// Codes are always stored upper-case and trimmed, so `" k7qd2m"` typed by
/// a player resolves to the same room. Deserialization goes through the
/// same normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Characters used for generated codes. Look-alikes (`0`/`O`,
    /// `1`/`I`/`L`) are left out so codes survive being read aloud.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

    /// Creates a code from user input, normalizing case and whitespace.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A player's token color. Unique within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Red,
    Green,
    Yellow,
}

impl Color {
    /// The palette in assignment order. Its length caps room capacity.
    pub const PALETTE: [Color; 4] = [Color::Blue, Color::Red, Color::Green, Color::Yellow];

    /// Returns the first palette color not present in `used`.
    pub fn first_unused(used: &[Color]) -> Option<Color> {
        Self::PALETTE.into_iter().find(|c| !used.contains(c))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered, with no way back:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: accepting joins; players toggle ready.
/// - **Playing**: turn order is fixed; turn-scoped actions are legal for
///   the turn holder.
/// - **Finished**: someone declared a win. Terminal; the room lingers
///   until its last player leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if a game is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns the next state, or `None` for the terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Session metadata produced once when a room starts playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// Board layout identifier the room was created with.
    pub level: u32,
    /// Wall-clock start, milliseconds since the Unix epoch.
    pub started_at: u64,
    /// Target length of the session in seconds.
    pub duration_secs: u32,
}

/// A player as seen by every member of the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub color: Color,
    pub position: u32,
    /// Checkpoint positions this player has answered, ascending.
    pub completed_checkpoints: Vec<u32>,
    pub is_ready: bool,
}

/// Full room snapshot, sent on membership and lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub code: RoomCode,
    pub host: ConnectionId,
    /// Join order, which is also turn order.
    pub players: Vec<PlayerView>,
    pub level: u32,
    pub max_players: usize,
    pub status: RoomStatus,
    /// Present only once the game has started.
    pub current_turn: Option<ConnectionId>,
    pub session: Option<GameSession>,
}

/// A joinable room as listed for discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub level: u32,
    pub player_count: usize,
    pub max_players: usize,
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who inside a room should receive an event.
///
/// Room operations return `(Recipient, ServerEvent)` pairs; the
/// coordinator resolves `All` against the room's membership at the moment
/// the operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently in the room.
    All,
    /// One connection only (the originator of a rejected action, say).
    Connection(ConnectionId),
}
