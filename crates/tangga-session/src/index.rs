//! The session index: connection → room code.
//!
//! # Concurrency note
//!
//! `SessionIndex` is a plain `HashMap`. It is owned by the coordinator,
//! which runs on a single task, so no locking happens here.

use std::collections::HashMap;

use tangga_protocol::{ConnectionId, RoomCode};

use crate::SessionError;

/// Reverse lookup from a live connection to the room it has joined.
#[derive(Debug, Default)]
pub struct SessionIndex {
    entries: HashMap<ConnectionId, RoomCode>,
}

impl SessionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `conn` is now a member of `code`.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyBound`] if the connection is already
    /// in a room; the existing entry is left untouched.
    pub fn bind(&mut self, conn: ConnectionId, code: RoomCode) -> Result<(), SessionError> {
        if let Some(existing) = self.entries.get(&conn) {
            return Err(SessionError::AlreadyBound(conn, existing.clone()));
        }
        tracing::trace!(%conn, room = %code, "session bound");
        self.entries.insert(conn, code);
        Ok(())
    }

    /// Returns the room `conn` belongs to.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownConnection`] on a miss.
    pub fn resolve(&self, conn: ConnectionId) -> Result<&RoomCode, SessionError> {
        self.entries
            .get(&conn)
            .ok_or(SessionError::UnknownConnection(conn))
    }

    /// Removes the entry for `conn`, returning the room it pointed at.
    pub fn unbind(&mut self, conn: ConnectionId) -> Option<RoomCode> {
        let removed = self.entries.remove(&conn);
        if let Some(code) = &removed {
            tracing::trace!(%conn, room = %code, "session unbound");
        }
        removed
    }

    /// Returns the number of bound connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no connection is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn code(raw: &str) -> RoomCode {
        RoomCode::new(raw)
    }

    #[test]
    fn test_bind_then_resolve_returns_room() {
        let mut index = SessionIndex::new();
        index.bind(conn(1), code("AB12")).unwrap();

        assert_eq!(index.resolve(conn(1)).unwrap(), &code("AB12"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_connection_returns_error() {
        let index = SessionIndex::new();
        let result = index.resolve(conn(9));
        assert!(matches!(result, Err(SessionError::UnknownConnection(c)) if c == conn(9)));
    }

    #[test]
    fn test_bind_twice_is_rejected_and_keeps_first_room() {
        let mut index = SessionIndex::new();
        index.bind(conn(1), code("AB12")).unwrap();

        let result = index.bind(conn(1), code("CD34"));

        assert!(matches!(result, Err(SessionError::AlreadyBound(_, ref c)) if *c == code("AB12")));
        assert_eq!(index.resolve(conn(1)).unwrap(), &code("AB12"));
    }

    #[test]
    fn test_unbind_removes_entry_and_returns_room() {
        let mut index = SessionIndex::new();
        index.bind(conn(1), code("AB12")).unwrap();

        assert_eq!(index.unbind(conn(1)), Some(code("AB12")));
        assert!(index.is_empty());
        assert_eq!(index.unbind(conn(1)), None);
    }
}
