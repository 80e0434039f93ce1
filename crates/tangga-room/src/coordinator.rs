//! The coordinator: one logical unit over the registry and session index.
//!
//! Every membership change touches the room and the index inside the same
//! `&mut self` call, so neither can be observed without the other. The
//! coordinator itself does no I/O; it returns [`Effects`] describing what
//! to send and what to report, and the actor in [`crate::actor`] carries
//! them out.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tangga_protocol::{ClientAction, ConnectionId, Recipient, RoomCode, ServerEvent};
use tangga_session::SessionIndex;

use crate::code::{CodeGenerator, RandomCodes};
use crate::room::Outbound;
use crate::{GameReport, GameRules, Room, RoomError, RoomRegistry};

/// What an action produced.
#[derive(Debug, Default)]
pub struct Effects {
    /// Events in the order they must be delivered.
    pub deliveries: Vec<(ConnectionId, ServerEvent)>,
    /// Present when the action finished a game.
    pub report: Option<GameReport>,
}

impl Effects {
    fn reply(conn: ConnectionId, event: ServerEvent) -> Self {
        Self {
            deliveries: vec![(conn, event)],
            report: None,
        }
    }

    /// Events addressed to `conn`, in delivery order.
    pub fn for_connection(&self, conn: ConnectionId) -> Vec<&ServerEvent> {
        self.deliveries
            .iter()
            .filter(|(to, _)| *to == conn)
            .map(|(_, event)| event)
            .collect()
    }
}

/// Owns the rooms, the session index, and the game RNG.
pub struct Coordinator {
    registry: RoomRegistry,
    index: SessionIndex,
    rules: GameRules,
    rng: StdRng,
}

impl Coordinator {
    /// Creates a coordinator with OS-seeded randomness.
    pub fn new(rules: GameRules) -> Self {
        let codes = Box::new(RandomCodes::new(rules.code_length));
        Self::with_parts(rules, codes, StdRng::from_os_rng())
    }

    /// Creates a coordinator with explicit code and dice sources.
    pub fn with_parts(rules: GameRules, codes: Box<dyn CodeGenerator>, rng: StdRng) -> Self {
        if let Err(err) = rules.validate() {
            tracing::warn!(error = %err, "game rules are inconsistent; dice bounds will be reordered");
        }
        Self {
            registry: RoomRegistry::with_generator(codes),
            index: SessionIndex::new(),
            rules,
            rng,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.registry.get(code)
    }

    /// The room `conn` is seated in, if any.
    pub fn room_of(&self, conn: ConnectionId) -> Option<&Room> {
        let code = self.index.resolve(conn).ok()?;
        self.registry.get(code)
    }

    pub fn room_count(&self) -> usize {
        self.registry.len()
    }

    pub fn session_count(&self) -> usize {
        self.index.len()
    }

    /// Applies one client action.
    ///
    /// A rejected action produces a single `error` event for `conn` and
    /// leaves every room untouched.
    pub fn handle(&mut self, conn: ConnectionId, action: ClientAction) -> Effects {
        match self.apply(conn, action) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::debug!(%conn, code = err.code(), error = %err, "action rejected");
                Effects::reply(
                    conn,
                    ServerEvent::Error {
                        code: err.code(),
                        message: err.to_string(),
                    },
                )
            }
        }
    }

    /// Cleans up after a lost connection. A no-op if it wasn't in a room.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Effects {
        self.leave(conn).unwrap_or_default()
    }

    fn apply(&mut self, conn: ConnectionId, action: ClientAction) -> Result<Effects, RoomError> {
        match action {
            ClientAction::Hello { .. } => Err(RoomError::UnexpectedHandshake),
            ClientAction::Ping => Ok(Effects::reply(conn, ServerEvent::Pong)),
            ClientAction::ListRooms => Ok(Effects::reply(
                conn,
                ServerEvent::RoomList {
                    rooms: self.registry.joinable(),
                },
            )),
            ClientAction::CreateRoom {
                player_name,
                level,
                max_players,
            } => self.create_room(conn, player_name, level, max_players),
            ClientAction::JoinRoom {
                room_code,
                player_name,
            } => self.join_room(conn, &room_code, player_name),
            ClientAction::LeaveRoom => Ok(self.leave(conn).unwrap_or_default()),
            ClientAction::ToggleReady => self.in_room(conn, |room, _, _| room.toggle_ready(conn)),
            ClientAction::StartGame => {
                let now = now_millis();
                let effects =
                    self.in_room(conn, |room, rules, rng| room.start(conn, rules, now, rng))?;
                if let Some(room) = self.room_of(conn) {
                    tracing::info!(room = %room.code(), players = room.players().len(), "game started");
                }
                Ok(effects)
            }
            ClientAction::RollDice => self.in_room(conn, |room, rules, rng| {
                room.roll_dice(conn, rules.dice_for(room.level()), rng)
            }),
            ClientAction::ReportPosition { position } => self.in_room(conn, |room, rules, _| {
                room.report_position(conn, position, rules.board_size)
            }),
            ClientAction::QuizCompleted { position } => self.in_room(conn, |room, rules, _| {
                room.complete_quiz(conn, position, rules.board_size)
            }),
            ClientAction::NextTurn => self.in_room(conn, |room, _, _| room.advance_turn(conn)),
            ClientAction::DeclareWin => self.declare_win(conn),
        }
    }

    fn create_room(
        &mut self,
        conn: ConnectionId,
        player_name: String,
        level: u32,
        max_players: Option<usize>,
    ) -> Result<Effects, RoomError> {
        self.ensure_unbound(conn)?;
        let capacity = self.rules.capacity(max_players);
        let room = self.registry.create(conn, player_name, level, capacity)?;
        let room_code = room.code().clone();
        let view = room.view();

        let bound = self.index.bind(conn, room_code.clone());
        debug_assert!(bound.is_ok(), "{conn} bound twice");

        Ok(Effects::reply(
            conn,
            ServerEvent::RoomCreated {
                room_code,
                room: view,
            },
        ))
    }

    fn join_room(
        &mut self,
        conn: ConnectionId,
        code: &RoomCode,
        player_name: String,
    ) -> Result<Effects, RoomError> {
        self.ensure_unbound(conn)?;
        let player = self.registry.join(code, conn, player_name)?.view();

        let bound = self.index.bind(conn, code.clone());
        debug_assert!(bound.is_ok(), "{conn} bound twice");

        let room = self.registry.get_mut(code)?;
        tracing::info!(
            room = %code,
            %conn,
            players = room.players().len(),
            "player joined"
        );
        let event = ServerEvent::PlayerJoined {
            player,
            room: room.view(),
        };
        Ok(fan_out(room, vec![(Recipient::All, event)]))
    }

    fn declare_win(&mut self, conn: ConnectionId) -> Result<Effects, RoomError> {
        let code = self.index.resolve(conn)?.clone();
        let room = self.registry.get_mut(&code)?;
        let (events, winner) = room.declare_win(conn)?;
        tracing::info!(room = %code, winner = %winner.display_name, "game ended");

        let mut effects = fan_out(room, events);
        effects.report = GameReport::from_room(room, conn, now_millis());
        Ok(effects)
    }

    /// The shared leave path for explicit leaves and dropped connections.
    fn leave(&mut self, conn: ConnectionId) -> Result<Effects, RoomError> {
        let code = self.index.resolve(conn)?.clone();
        let room = self.registry.get_mut(&code)?;
        let departure = room.remove_player(conn);
        debug_assert!(departure.is_some(), "index pointed {conn} at {code} but it isn't seated");

        let effects = match departure {
            Some(departure) if !room.is_empty() => {
                tracing::info!(
                    room = %code,
                    %conn,
                    players = room.players().len(),
                    host = %room.host(),
                    "player left"
                );
                let events = room.departure_events(&departure);
                fan_out(room, events)
            }
            _ => {
                self.registry.remove(&code);
                Effects::default()
            }
        };

        self.index.unbind(conn);
        Ok(effects)
    }

    /// Resolves `conn`'s room and runs a room operation on it.
    fn in_room<F>(&mut self, conn: ConnectionId, op: F) -> Result<Effects, RoomError>
    where
        F: FnOnce(&mut Room, &GameRules, &mut StdRng) -> Result<Outbound, RoomError>,
    {
        let code = self.index.resolve(conn)?;
        let room = self.registry.get_mut(code)?;
        let events = op(room, &self.rules, &mut self.rng)?;
        Ok(fan_out(room, events))
    }

    fn ensure_unbound(&self, conn: ConnectionId) -> Result<(), RoomError> {
        match self.index.resolve(conn) {
            Ok(code) => Err(RoomError::AlreadyInRoom(conn, code.clone())),
            Err(_) => Ok(()),
        }
    }
}

/// Expands recipients against the room's current membership.
fn fan_out(room: &Room, events: Outbound) -> Effects {
    let mut deliveries = Vec::new();
    for (recipient, event) in events {
        match recipient {
            Recipient::All => {
                for player in room.players() {
                    deliveries.push((player.connection_id(), event.clone()));
                }
            }
            Recipient::Connection(conn) => deliveries.push((conn, event)),
        }
    }
    Effects {
        deliveries,
        report: None,
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
