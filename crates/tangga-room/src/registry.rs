//! Room registry: code allocation, lookup, and discovery.

use std::collections::HashMap;

use tangga_protocol::{ConnectionId, RoomCode, RoomSummary};

use crate::code::CodeGenerator;
use crate::{Player, Room, RoomError};

/// How many candidate codes to try before giving up on a create.
const MAX_CODE_ATTEMPTS: usize = 64;

/// Owns every live room, keyed by code.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    codes: Box<dyn CodeGenerator>,
}

impl RoomRegistry {
    /// Creates an empty registry with a custom code source.
    pub fn with_generator(codes: Box<dyn CodeGenerator>) -> Self {
        Self {
            rooms: HashMap::new(),
            codes,
        }
    }

    /// Creates a waiting room with `host` seated, under a fresh code.
    pub fn create(
        &mut self,
        host: ConnectionId,
        host_name: String,
        level: u32,
        max_players: usize,
    ) -> Result<&Room, RoomError> {
        let code = self.allocate_code()?;
        let room = Room::new(code.clone(), host, host_name, level, max_players);
        tracing::info!(room = %code, %host, level, max_players, "room created");
        Ok(self.rooms.entry(code).or_insert(room))
    }

    /// Seats `conn` in the room with `code`.
    pub fn join(
        &mut self,
        code: &RoomCode,
        conn: ConnectionId,
        display_name: String,
    ) -> Result<&Player, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        room.add_player(conn, display_name)
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub(crate) fn get_mut(&mut self, code: &RoomCode) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    pub(crate) fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code);
        if room.is_some() {
            tracing::info!(room = %code, "room deleted");
        }
        room
    }

    /// Waiting rooms with a free seat, ordered by code.
    pub fn joinable(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|room| room.status().is_joinable() && !room.is_full())
            .map(Room::summary)
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn allocate_code(&mut self) -> Result<RoomCode, RoomError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = self.codes.next_code();
            if !self.rooms.contains_key(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(room = %candidate, attempt, "room code collision, retrying");
        }
        tracing::error!(rooms = self.rooms.len(), "room code space exhausted");
        Err(RoomError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }
}
