//! Room management for Tangga.
//!
//! A room groups up to four players around one game. Its lifecycle is a
//! strict state machine:
//!
//! ```text
//! waiting → playing → finished
//! ```
//!
//! The pieces, leaf-first:
//!
//! - [`Room`] holds the players in join order, the host, the status and the
//!   turn pointer. Every game rule lives here.
//! - [`RoomRegistry`] maps room codes to rooms and allocates fresh codes.
//! - [`Coordinator`] binds connections to rooms through a
//!   [`SessionIndex`](tangga_session::SessionIndex) and turns client actions
//!   into per-connection deliveries.
//! - [`spawn_coordinator`] runs the coordinator on its own task and pushes
//!   those deliveries into each connection's channel.
//! - [`StatsSink`] receives a [`GameReport`] when a game ends.

mod actor;
mod code;
mod config;
mod coordinator;
mod error;
mod player;
mod registry;
mod room;
mod stats;

pub use actor::{CoordinatorHandle, EventSender, spawn_coordinator};
pub use code::{CodeGenerator, RandomCodes};
pub use config::{DiceRange, DurationRange, GameRules, RulesError};
pub use coordinator::{Coordinator, Effects, now_millis};
pub use error::RoomError;
pub use player::Player;
pub use registry::RoomRegistry;
pub use room::{Outbound, Room};
pub use stats::{GameReport, JsonLinesStats, PlayerReport, StatsError, StatsSink, TracingStats};
