//! End-of-game statistics.
//!
//! When a game finishes the coordinator builds a [`GameReport`] and hands
//! it to a [`StatsSink`] on its own task. A slow or failing sink never
//! delays room traffic; failures are logged and dropped.

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tangga_protocol::{ConnectionId, RoomCode};
use tokio::io::AsyncWriteExt;

use crate::Room;

/// Errors a sink can report. Never surfaced to players.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to write game report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode game report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Per-player line of a [`GameReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub final_position: u32,
    pub quizzes_answered: usize,
    pub is_winner: bool,
    pub play_time_secs: u64,
}

/// Summary of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    pub room_code: RoomCode,
    pub level: u32,
    /// Milliseconds since the Unix epoch.
    pub started_at: u64,
    /// Milliseconds since the Unix epoch.
    pub ended_at: u64,
    /// The target length drawn at start, not the elapsed time.
    pub duration_secs: u32,
    pub players: Vec<PlayerReport>,
}

impl GameReport {
    /// Builds the report for a room that just finished.
    ///
    /// Returns `None` if the room never started.
    pub fn from_room(room: &Room, winner: ConnectionId, ended_at: u64) -> Option<Self> {
        let session = room.session()?;
        let play_time_secs = ended_at.saturating_sub(session.started_at) / 1000;
        let players = room
            .players()
            .iter()
            .map(|p| PlayerReport {
                connection_id: p.connection_id(),
                display_name: p.display_name().to_owned(),
                final_position: p.position(),
                quizzes_answered: p.completed_checkpoints().len(),
                is_winner: p.connection_id() == winner,
                play_time_secs,
            })
            .collect();

        Some(Self {
            room_code: room.code().clone(),
            level: session.level,
            started_at: session.started_at,
            ended_at,
            duration_secs: session.duration_secs,
            players,
        })
    }

    pub fn winner(&self) -> Option<&PlayerReport> {
        self.players.iter().find(|p| p.is_winner)
    }
}

/// Destination for finished-game reports.
pub trait StatsSink: Send + Sync + 'static {
    fn record(&self, report: GameReport) -> impl Future<Output = Result<(), StatsError>> + Send;
}

/// Logs each report and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStats;

impl StatsSink for TracingStats {
    async fn record(&self, report: GameReport) -> Result<(), StatsError> {
        tracing::info!(
            room = %report.room_code,
            level = report.level,
            players = report.players.len(),
            winner = report.winner().map(|p| p.display_name.as_str()).unwrap_or(""),
            "game report"
        );
        Ok(())
    }
}

/// Appends each report as one JSON line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesStats {
    path: PathBuf,
}

impl JsonLinesStats {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatsSink for JsonLinesStats {
    async fn record(&self, report: GameReport) -> Result<(), StatsError> {
        let mut line = serde_json::to_vec(&report)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::GameRules;

    fn finished_room() -> Room {
        let mut room = Room::new(
            RoomCode::new("AB12"),
            ConnectionId::new(1),
            "Dina".into(),
            2,
            4,
        );
        room.add_player(ConnectionId::new(2), "Rian".into()).unwrap();
        room.toggle_ready(ConnectionId::new(2)).unwrap();
        room.start(
            ConnectionId::new(1),
            &GameRules::default(),
            10_000,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        room.report_position(ConnectionId::new(1), 7, 100).unwrap();
        room.complete_quiz(ConnectionId::new(1), 7, 100).unwrap();
        room.declare_win(ConnectionId::new(1)).unwrap();
        room
    }

    #[test]
    fn test_from_room_collects_player_lines() {
        let room = finished_room();
        let report = GameReport::from_room(&room, ConnectionId::new(1), 70_000).unwrap();

        assert_eq!(report.room_code.as_str(), "AB12");
        assert_eq!(report.started_at, 10_000);
        assert_eq!(report.players.len(), 2);

        let winner = report.winner().unwrap();
        assert_eq!(winner.display_name, "Dina");
        assert_eq!(winner.final_position, 7);
        assert_eq!(winner.quizzes_answered, 1);
        assert_eq!(winner.play_time_secs, 60);
        assert!(!report.players[1].is_winner);
    }

    #[test]
    fn test_from_room_unstarted_is_none() {
        let room = Room::new(
            RoomCode::new("AB12"),
            ConnectionId::new(1),
            "Dina".into(),
            2,
            4,
        );
        assert!(GameReport::from_room(&room, ConnectionId::new(1), 0).is_none());
    }
}
