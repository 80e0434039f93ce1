//! Coordinator actor: a single Tokio task that owns the [`Coordinator`].
//!
//! Connection handlers talk to it through a [`CoordinatorHandle`]. Because
//! one task applies every action to completion before taking the next,
//! all members of a room observe its events in the same order, and the
//! registry and index never need a lock.

use std::collections::HashMap;
use std::sync::Arc;

use tangga_protocol::{ClientAction, ConnectionId, RoomCode, RoomView, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::{Coordinator, Effects, RoomError, StatsSink};

/// Channel for pushing events to one connection's writer.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the coordinator task.
enum Command {
    /// Register a connection's outbound channel.
    Connect {
        conn: ConnectionId,
        sender: EventSender,
    },

    /// Apply a client action (fire-and-forget; results arrive as events).
    Action {
        conn: ConnectionId,
        action: ClientAction,
    },

    /// The connection is gone. Runs the leave path, then forgets its sender.
    Disconnect { conn: ConnectionId },

    /// Snapshot a room.
    Room {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomView>>,
    },

    /// Stop processing commands.
    Shutdown,
}

/// Handle to the running coordinator. Cheap to clone.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Registers `conn`; events for it will be pushed into `sender`.
    pub async fn connect(&self, conn: ConnectionId, sender: EventSender) -> Result<(), RoomError> {
        self.send(Command::Connect { conn, sender }).await
    }

    /// Submits an action on behalf of `conn`.
    pub async fn submit(&self, conn: ConnectionId, action: ClientAction) -> Result<(), RoomError> {
        self.send(Command::Action { conn, action }).await
    }

    /// Reports that `conn` dropped.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(Command::Disconnect { conn }).await
    }

    /// Returns a snapshot of the room with `code`, if it exists.
    pub async fn room(&self, code: RoomCode) -> Result<Option<RoomView>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Room {
            code,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Tells the coordinator to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(Command::Shutdown).await
    }

    /// Returns `true` once the coordinator task has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: Command) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

struct CoordinatorActor<S: StatsSink> {
    coordinator: Coordinator,
    senders: HashMap<ConnectionId, EventSender>,
    stats: Arc<S>,
    receiver: mpsc::Receiver<Command>,
}

impl<S: StatsSink> CoordinatorActor<S> {
    async fn run(mut self) {
        tracing::info!("coordinator started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                Command::Connect { conn, sender } => {
                    self.senders.insert(conn, sender);
                }
                Command::Action { conn, action } => {
                    let effects = self.coordinator.handle(conn, action);
                    self.dispatch(effects);
                }
                Command::Disconnect { conn } => {
                    let effects = self.coordinator.disconnect(conn);
                    self.dispatch(effects);
                    self.senders.remove(&conn);
                }
                Command::Room { code, reply } => {
                    let _ = reply.send(self.coordinator.room(&code).map(|room| room.view()));
                }
                Command::Shutdown => {
                    tracing::info!(
                        rooms = self.coordinator.room_count(),
                        "coordinator shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!("coordinator stopped");
    }

    fn dispatch(&self, effects: Effects) {
        for (conn, event) in effects.deliveries {
            // A closed receiver means the handler is already on its way
            // out; its disconnect command will follow.
            if let Some(sender) = self.senders.get(&conn) {
                let _ = sender.send(event);
            }
        }

        if let Some(report) = effects.report {
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                let room = report.room_code.clone();
                if let Err(e) = stats.record(report).await {
                    tracing::warn!(%room, error = %e, "failed to record game report");
                }
            });
        }
    }
}

/// Spawns the coordinator task and returns a handle to it.
///
/// `channel_size` bounds the command queue; submitters wait when it fills.
pub fn spawn_coordinator<S: StatsSink>(
    coordinator: Coordinator,
    stats: Arc<S>,
    channel_size: usize,
) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = CoordinatorActor {
        coordinator,
        senders: HashMap::new(),
        stats,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
