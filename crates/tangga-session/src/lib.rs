//! Player session index for Tangga.
//!
//! Maps each live connection to the room it currently belongs to, so a
//! disconnect or an inbound action can find its room in O(1).
//!
//! # How it fits in the stack
//!
//! ```text
//! Room coordinator (above)  ← owns rooms; membership lives in Room.players
//!     ↕
//! Session index (this crate)  ← non-owning back-references connection → room
//!     ↕
//! Protocol (below)  ← provides ConnectionId, RoomCode
//! ```
//!
//! The index is never the source of truth for membership. The coordinator
//! updates it in the same `&mut self` call that changes a room's player
//! list, so the two cannot drift apart.

mod error;
mod index;

pub use error::SessionError;
pub use index::SessionIndex;
