//! The room aggregate and its turn state machine.
//!
//! A `Room` is the unit of consistency: every operation here runs to
//! completion on the coordinator task before the next one starts, so no
//! locking happens inside a room. Operations return the events to
//! broadcast as `(Recipient, ServerEvent)` pairs and leave delivery to
//! the caller.

use rand::Rng;
use tangga_protocol::{
    Color, ConnectionId, GameSession, PlayerView, Recipient, RoomCode, RoomStatus, RoomSummary,
    RoomView, ServerEvent,
};

use crate::{DiceRange, Player, RoomError};

/// Events produced by a room operation, paired with their audience.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// What changed when a player left.
#[derive(Debug)]
pub(crate) struct Departure {
    pub(crate) player: Player,
    /// The new host, if the departed player held the role.
    pub(crate) new_host: Option<ConnectionId>,
    /// The new turn holder, if the departed player held the turn.
    pub(crate) new_turn: Option<ConnectionId>,
}

/// A game room: players, lifecycle status, and the turn pointer.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: ConnectionId,
    /// Join order = turn order. Removals never reorder survivors.
    players: Vec<Player>,
    level: u32,
    max_players: usize,
    status: RoomStatus,
    current_turn: Option<ConnectionId>,
    session: Option<GameSession>,
}

impl Room {
    /// Creates a waiting room with its creator seated as host.
    pub(crate) fn new(
        code: RoomCode,
        host: ConnectionId,
        host_name: String,
        level: u32,
        max_players: usize,
    ) -> Self {
        let first = Player::new(host, host_name, Color::PALETTE[0]);
        Self {
            code,
            host,
            players: vec![first],
            level,
            max_players,
            status: RoomStatus::Waiting,
            current_turn: None,
            session: None,
        }
    }

    // -- Accessors ---------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, conn: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_id == conn)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// The turn holder. `Some` from game start onwards, frozen once finished.
    pub fn current_turn(&self) -> Option<ConnectionId> {
        self.current_turn
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Full snapshot for the wire.
    pub fn view(&self) -> RoomView {
        RoomView {
            code: self.code.clone(),
            host: self.host,
            players: self.players.iter().map(Player::view).collect(),
            level: self.level,
            max_players: self.max_players,
            status: self.status,
            current_turn: self.current_turn,
            session: self.session.clone(),
        }
    }

    /// Listing entry for room discovery.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            level: self.level,
            player_count: self.players.len(),
            max_players: self.max_players,
        }
    }

    // -- Membership --------------------------------------------------------

    /// Seats a new player with the lowest unused palette color.
    pub(crate) fn add_player(
        &mut self,
        conn: ConnectionId,
        display_name: String,
    ) -> Result<&Player, RoomError> {
        if !self.status.is_joinable() {
            return Err(RoomError::RoomNotJoinable(self.code.clone(), self.status));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        let used: Vec<Color> = self.players.iter().map(|p| p.color).collect();
        // Capacity never exceeds the palette, so a full palette means a full room.
        let color = Color::first_unused(&used).ok_or(RoomError::RoomFull(self.code.clone()))?;

        self.players.push(Player::new(conn, display_name, color));
        self.assert_invariants();
        Ok(&self.players[self.players.len() - 1])
    }

    /// Removes a player, reassigning host and turn if they held either.
    ///
    /// Returns `None` if `conn` isn't seated here.
    pub(crate) fn remove_player(&mut self, conn: ConnectionId) -> Option<Departure> {
        let index = self.players.iter().position(|p| p.connection_id == conn)?;
        // `Vec::remove` shifts the tail left, preserving relative order.
        let player = self.players.remove(index);

        let new_host = match self.players.first() {
            Some(first) if self.host == conn => {
                self.host = first.connection_id;
                Some(first.connection_id)
            }
            _ => None,
        };

        let new_turn = if self.status.is_active() && self.current_turn == Some(conn) {
            if self.players.is_empty() {
                self.current_turn = None;
                None
            } else {
                // The successor slid into the departed player's slot.
                let next = self.players[index % self.players.len()].connection_id;
                self.current_turn = Some(next);
                Some(next)
            }
        } else {
            None
        };

        if !self.players.is_empty() {
            self.assert_invariants();
        }
        Some(Departure {
            player,
            new_host,
            new_turn,
        })
    }

    /// Events for the players who remain after a departure.
    pub(crate) fn departure_events(&self, departure: &Departure) -> Outbound {
        let mut out = vec![(
            Recipient::All,
            ServerEvent::PlayerLeft {
                connection_id: departure.player.connection_id,
                room: self.view(),
            },
        )];
        if let Some(next) = departure.new_turn {
            out.push((Recipient::All, self.turn_changed(next)));
        }
        out
    }

    // -- Pre-game ----------------------------------------------------------

    /// Flips a player's ready flag.
    pub(crate) fn toggle_ready(&mut self, conn: ConnectionId) -> Result<Outbound, RoomError> {
        if !self.status.is_joinable() {
            return Err(RoomError::GameAlreadyStarted(self.status));
        }
        let player = self.player_mut(conn)?;
        player.is_ready = !player.is_ready;
        Ok(vec![(Recipient::All, ServerEvent::RoomUpdated { room: self.view() })])
    }

    /// Host action: `waiting → playing`.
    ///
    /// Only non-host players must be ready; the host is implicitly ready.
    /// Turn order is the join order at this moment.
    pub(crate) fn start<R: Rng + ?Sized>(
        &mut self,
        conn: ConnectionId,
        rules: &crate::GameRules,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Outbound, RoomError> {
        if conn != self.host {
            return Err(RoomError::NotHost);
        }
        if !self.status.can_transition_to(RoomStatus::Playing) {
            return Err(RoomError::GameAlreadyStarted(self.status));
        }
        let host = self.host;
        if !self
            .players
            .iter()
            .all(|p| p.is_ready || p.connection_id == host)
        {
            return Err(RoomError::NotAllReady);
        }

        self.session = Some(rules.draw_session(self.level, now_ms, rng));
        self.current_turn = Some(self.players[0].connection_id);
        self.status = RoomStatus::Playing;
        self.assert_invariants();

        Ok(vec![(Recipient::All, ServerEvent::GameStarted { room: self.view() })])
    }

    // -- Turn-scoped actions -----------------------------------------------

    /// Turn holder draws a dice value. Does not move anyone.
    pub(crate) fn roll_dice<R: Rng + ?Sized>(
        &mut self,
        conn: ConnectionId,
        dice: DiceRange,
        rng: &mut R,
    ) -> Result<Outbound, RoomError> {
        self.ensure_turn(conn)?;
        let value = dice.roll(rng);
        Ok(vec![(
            Recipient::All,
            ServerEvent::DiceRolled {
                connection_id: conn,
                value,
            },
        )])
    }

    /// Turn holder reports where they landed.
    ///
    /// The client resolves snakes and ladders; the server only checks the
    /// cell exists.
    pub(crate) fn report_position(
        &mut self,
        conn: ConnectionId,
        position: u32,
        board_size: u32,
    ) -> Result<Outbound, RoomError> {
        self.ensure_turn(conn)?;
        check_on_board(position, board_size)?;
        self.player_mut(conn)?.position = position;
        Ok(vec![(
            Recipient::All,
            ServerEvent::PlayerMoved {
                connection_id: conn,
                position,
            },
        )])
    }

    /// Turn holder answered the quiz at `checkpoint`. Idempotent: a repeat
    /// changes nothing and broadcasts nothing.
    pub(crate) fn complete_quiz(
        &mut self,
        conn: ConnectionId,
        checkpoint: u32,
        board_size: u32,
    ) -> Result<Outbound, RoomError> {
        self.ensure_turn(conn)?;
        check_on_board(checkpoint, board_size)?;
        let player = self.player_mut(conn)?;
        if !player.completed_checkpoints.insert(checkpoint) {
            return Ok(Vec::new());
        }
        let completed_checkpoints = player.completed_checkpoints.iter().copied().collect();
        Ok(vec![(
            Recipient::All,
            ServerEvent::QuizUpdate {
                connection_id: conn,
                completed_checkpoints,
            },
        )])
    }

    /// Passes the turn to the cyclic successor in join order.
    ///
    /// From anyone but the turn holder this is a silent no-op.
    pub(crate) fn advance_turn(&mut self, conn: ConnectionId) -> Result<Outbound, RoomError> {
        if !self.status.is_active() {
            return Err(RoomError::GameNotInProgress(self.status));
        }
        if self.current_turn != Some(conn) {
            return Ok(Vec::new());
        }
        let index = self
            .players
            .iter()
            .position(|p| p.connection_id == conn)
            .ok_or(RoomError::UnknownConnection(conn))?;
        let next = self.players[(index + 1) % self.players.len()].connection_id;
        self.current_turn = Some(next);
        self.assert_invariants();

        Ok(vec![(Recipient::All, self.turn_changed(next))])
    }

    /// Any player claims the win: `playing → finished`. The turn pointer
    /// freezes where it is.
    pub(crate) fn declare_win(
        &mut self,
        conn: ConnectionId,
    ) -> Result<(Outbound, PlayerView), RoomError> {
        if !self.status.can_transition_to(RoomStatus::Finished) {
            return Err(RoomError::GameNotInProgress(self.status));
        }
        let winner = self
            .player(conn)
            .ok_or(RoomError::UnknownConnection(conn))?
            .view();
        self.status = RoomStatus::Finished;

        Ok((
            vec![(
                Recipient::All,
                ServerEvent::GameEnded {
                    winner: winner.clone(),
                },
            )],
            winner,
        ))
    }

    // -- Helpers -----------------------------------------------------------

    fn ensure_turn(&self, conn: ConnectionId) -> Result<(), RoomError> {
        if !self.status.is_active() {
            return Err(RoomError::GameNotInProgress(self.status));
        }
        if self.current_turn != Some(conn) {
            return Err(RoomError::NotYourTurn);
        }
        Ok(())
    }

    fn player_mut(&mut self, conn: ConnectionId) -> Result<&mut Player, RoomError> {
        self.players
            .iter_mut()
            .find(|p| p.connection_id == conn)
            .ok_or(RoomError::UnknownConnection(conn))
    }

    fn turn_changed(&self, next: ConnectionId) -> ServerEvent {
        let player_name = self
            .player(next)
            .map(|p| p.display_name.clone())
            .unwrap_or_default();
        ServerEvent::TurnChanged {
            connection_id: next,
            player_name,
        }
    }

    /// Structural invariants. A failure is a bug in this module, so these
    /// are checked in debug builds only.
    fn assert_invariants(&self) {
        debug_assert!(
            self.players.len() <= self.max_players,
            "room {} holds {} players, capacity {}",
            self.code,
            self.players.len(),
            self.max_players
        );
        debug_assert!(
            self.player(self.host).is_some(),
            "room {} host {} is not seated",
            self.code,
            self.host
        );
        if self.status.is_active() {
            debug_assert!(
                self.current_turn
                    .is_some_and(|turn| self.player(turn).is_some()),
                "room {} turn pointer {:?} is not seated",
                self.code,
                self.current_turn
            );
        }
        debug_assert!(
            self.players
                .iter()
                .enumerate()
                .all(|(i, p)| self.players[..i].iter().all(|q| q.color != p.color)),
            "room {} has duplicate colors",
            self.code
        );
    }
}

fn check_on_board(position: u32, board_size: u32) -> Result<(), RoomError> {
    if position > board_size {
        return Err(RoomError::PositionOutOfBounds {
            position,
            board_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::GameRules;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// A waiting room hosted by conn 1 with `extra` more players seated.
    fn room_with(extra: u64) -> Room {
        let mut room = Room::new(RoomCode::new("AB12"), conn(1), "Dina".into(), 2, 4);
        for id in 2..2 + extra {
            room.add_player(conn(id), format!("P{id}")).unwrap();
        }
        room
    }

    /// A playing room with conns 1..=n, turn on conn 1.
    fn playing(n: u64) -> Room {
        let mut room = room_with(n - 1);
        for id in 2..=n {
            room.toggle_ready(conn(id)).unwrap();
        }
        room.start(conn(1), &GameRules::default(), 0, &mut rng())
            .unwrap();
        room
    }

    fn turn_ids(room: &Room) -> Vec<u64> {
        room.players()
            .iter()
            .map(|p| p.connection_id().into_inner())
            .collect()
    }

    // =====================================================================
    // Membership
    // =====================================================================

    #[test]
    fn test_new_room_seats_host_first_color_not_ready() {
        let room = room_with(0);
        assert_eq!(room.host(), conn(1));
        assert_eq!(room.players()[0].color(), Color::Blue);
        assert!(!room.players()[0].is_ready());
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert_eq!(room.current_turn(), None);
    }

    #[test]
    fn test_add_player_assigns_lowest_unused_color() {
        let mut room = room_with(2); // blue, red, green
        room.remove_player(conn(2)); // frees red
        let player = room.add_player(conn(9), "Late".into()).unwrap();
        assert_eq!(player.color(), Color::Red);
    }

    #[test]
    fn test_add_player_full_room_rejected() {
        let mut room = room_with(3);
        let result = room.add_player(conn(5), "Fifth".into());
        assert!(matches!(result, Err(RoomError::RoomFull(_))));
        assert_eq!(room.players().len(), 4);
    }

    #[test]
    fn test_add_player_after_start_rejected() {
        let mut room = playing(2);
        let result = room.add_player(conn(3), "Late".into());
        assert!(matches!(
            result,
            Err(RoomError::RoomNotJoinable(_, RoomStatus::Playing))
        ));
    }

    #[test]
    fn test_remove_player_preserves_order_of_survivors() {
        let mut room = room_with(3);
        room.remove_player(conn(2)).unwrap();
        assert_eq!(turn_ids(&room), vec![1, 3, 4]);
    }

    #[test]
    fn test_remove_host_promotes_first_remaining() {
        let mut room = room_with(2);
        let departure = room.remove_player(conn(1)).unwrap();
        assert_eq!(departure.new_host, Some(conn(2)));
        assert_eq!(room.host(), conn(2));
    }

    #[test]
    fn test_remove_unknown_player_is_none() {
        let mut room = room_with(1);
        assert!(room.remove_player(conn(77)).is_none());
    }

    #[test]
    fn test_remove_non_turn_holder_keeps_turn() {
        let mut room = playing(3);
        room.advance_turn(conn(1)).unwrap(); // turn on 2
        let departure = room.remove_player(conn(3)).unwrap();
        assert_eq!(departure.new_turn, None);
        assert_eq!(room.current_turn(), Some(conn(2)));
    }

    #[test]
    fn test_remove_turn_holder_passes_turn_to_successor() {
        let mut room = playing(3);
        room.advance_turn(conn(1)).unwrap(); // turn on 2
        let departure = room.remove_player(conn(2)).unwrap();
        assert_eq!(departure.new_turn, Some(conn(3)));
        assert_eq!(room.current_turn(), Some(conn(3)));

        let events = room.departure_events(&departure);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1].1,
            ServerEvent::TurnChanged { connection_id, .. } if connection_id == conn(3)
        ));
    }

    #[test]
    fn test_remove_last_in_order_turn_holder_wraps() {
        let mut room = playing(3);
        room.advance_turn(conn(1)).unwrap();
        room.advance_turn(conn(2)).unwrap(); // turn on 3 (last)
        room.remove_player(conn(3)).unwrap();
        assert_eq!(room.current_turn(), Some(conn(1)));
    }

    // =====================================================================
    // Ready / start
    // =====================================================================

    #[test]
    fn test_toggle_ready_flips_flag_and_broadcasts() {
        let mut room = room_with(1);
        let events = room.toggle_ready(conn(2)).unwrap();
        assert!(room.player(conn(2)).unwrap().is_ready());
        assert!(matches!(events[0], (Recipient::All, ServerEvent::RoomUpdated { .. })));

        room.toggle_ready(conn(2)).unwrap();
        assert!(!room.player(conn(2)).unwrap().is_ready());
    }

    #[test]
    fn test_start_by_non_host_rejected() {
        let mut room = room_with(1);
        room.toggle_ready(conn(2)).unwrap();
        let result = room.start(conn(2), &GameRules::default(), 0, &mut rng());
        assert!(matches!(result, Err(RoomError::NotHost)));
    }

    #[test]
    fn test_start_requires_non_host_ready_only() {
        let mut room = room_with(2);
        room.toggle_ready(conn(2)).unwrap();

        let result = room.start(conn(1), &GameRules::default(), 0, &mut rng());
        assert!(matches!(result, Err(RoomError::NotAllReady)));
        assert_eq!(room.status(), RoomStatus::Waiting);

        room.toggle_ready(conn(3)).unwrap();
        // Host (conn 1) never toggled ready.
        room.start(conn(1), &GameRules::default(), 0, &mut rng())
            .unwrap();
        assert_eq!(room.status(), RoomStatus::Playing);
    }

    #[test]
    fn test_start_sets_turn_to_first_joined_and_draws_session() {
        let room = playing(2);
        assert_eq!(room.current_turn(), Some(conn(1)));
        let session = room.session().unwrap();
        assert_eq!(session.level, 2);
        assert!((300..=420).contains(&session.duration_secs));
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut room = playing(2);
        let result = room.start(conn(1), &GameRules::default(), 0, &mut rng());
        assert!(matches!(result, Err(RoomError::GameAlreadyStarted(_))));
    }

    #[test]
    fn test_solo_host_can_start() {
        let mut room = room_with(0);
        room.start(conn(1), &GameRules::default(), 0, &mut rng())
            .unwrap();
        assert_eq!(room.current_turn(), Some(conn(1)));
    }

    // =====================================================================
    // Turn actions
    // =====================================================================

    #[test]
    fn test_roll_dice_in_range_for_turn_holder() {
        let mut room = playing(2);
        let mut rng = rng();
        for _ in 0..50 {
            let events = room
                .roll_dice(conn(1), DiceRange::default(), &mut rng)
                .unwrap();
            match &events[0].1 {
                ServerEvent::DiceRolled { value, .. } => assert!((4..=6).contains(value)),
                other => panic!("expected DiceRolled, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_roll_dice_out_of_turn_rejected() {
        let mut room = playing(2);
        let result = room.roll_dice(conn(2), DiceRange::default(), &mut rng());
        assert!(matches!(result, Err(RoomError::NotYourTurn)));
    }

    #[test]
    fn test_roll_dice_before_start_rejected() {
        let mut room = room_with(1);
        let result = room.roll_dice(conn(1), DiceRange::default(), &mut rng());
        assert!(matches!(
            result,
            Err(RoomError::GameNotInProgress(RoomStatus::Waiting))
        ));
    }

    #[test]
    fn test_report_position_updates_player() {
        let mut room = playing(2);
        room.report_position(conn(1), 7, 100).unwrap();
        assert_eq!(room.player(conn(1)).unwrap().position(), 7);
    }

    #[test]
    fn test_report_position_beyond_board_rejected() {
        let mut room = playing(2);
        let result = room.report_position(conn(1), 101, 100);
        assert!(matches!(result, Err(RoomError::PositionOutOfBounds { .. })));
        assert_eq!(room.player(conn(1)).unwrap().position(), 0);
    }

    #[test]
    fn test_complete_quiz_is_idempotent() {
        let mut room = playing(2);
        let first = room.complete_quiz(conn(1), 12, 100).unwrap();
        let second = room.complete_quiz(conn(1), 12, 100).unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(room.player(conn(1)).unwrap().completed_checkpoints().len(), 1);
    }

    #[test]
    fn test_advance_turn_cycles_and_wraps() {
        let mut room = playing(3);
        room.advance_turn(conn(1)).unwrap();
        assert_eq!(room.current_turn(), Some(conn(2)));
        room.advance_turn(conn(2)).unwrap();
        assert_eq!(room.current_turn(), Some(conn(3)));
        room.advance_turn(conn(3)).unwrap();
        assert_eq!(room.current_turn(), Some(conn(1)));
    }

    #[test]
    fn test_advance_turn_by_non_holder_is_silent_noop() {
        let mut room = playing(3);
        let events = room.advance_turn(conn(2)).unwrap();
        assert!(events.is_empty());
        assert_eq!(room.current_turn(), Some(conn(1)));
    }

    #[test]
    fn test_declare_win_finishes_and_freezes_turn() {
        let mut room = playing(2);
        room.advance_turn(conn(1)).unwrap();

        let (events, winner) = room.declare_win(conn(1)).unwrap();

        assert_eq!(winner.connection_id, conn(1));
        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.current_turn(), Some(conn(2)));
        assert!(matches!(events[0].1, ServerEvent::GameEnded { .. }));
    }

    #[test]
    fn test_actions_after_finish_rejected() {
        let mut room = playing(2);
        room.declare_win(conn(2)).unwrap();

        assert!(matches!(
            room.roll_dice(conn(1), DiceRange::default(), &mut rng()),
            Err(RoomError::GameNotInProgress(RoomStatus::Finished))
        ));
        assert!(matches!(
            room.advance_turn(conn(1)),
            Err(RoomError::GameNotInProgress(RoomStatus::Finished))
        ));
        assert!(matches!(
            room.declare_win(conn(1)),
            Err(RoomError::GameNotInProgress(RoomStatus::Finished))
        ));
    }
}
