//! Room-scoped player state. Not the persistent user account.

use std::collections::BTreeSet;

use tangga_protocol::{Color, ConnectionId, PlayerView};

/// A player seated in a room.
///
/// Owned by its [`Room`](crate::Room); only room operations mutate it.
#[derive(Debug, Clone)]
pub struct Player {
    pub(crate) connection_id: ConnectionId,
    pub(crate) display_name: String,
    pub(crate) color: Color,
    pub(crate) position: u32,
    pub(crate) completed_checkpoints: BTreeSet<u32>,
    pub(crate) is_ready: bool,
}

impl Player {
    pub(crate) fn new(connection_id: ConnectionId, display_name: String, color: Color) -> Self {
        Self {
            connection_id,
            display_name,
            color,
            position: 0,
            completed_checkpoints: BTreeSet::new(),
            is_ready: false,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Current board cell; `0` means not yet on the board.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn completed_checkpoints(&self) -> &BTreeSet<u32> {
        &self.completed_checkpoints
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    /// Snapshot for the wire.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            connection_id: self.connection_id,
            display_name: self.display_name.clone(),
            color: self.color,
            position: self.position,
            completed_checkpoints: self.completed_checkpoints.iter().copied().collect(),
            is_ready: self.is_ready,
        }
    }
}
