//! Per-connection handler: handshake, then action routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `hello` → validate version → send `welcome`
//!   2. Register an outbound channel with the coordinator
//!   3. Loop: forward decoded actions to the coordinator, and write every
//!      event the coordinator pushes back, each in a sequenced envelope

use std::sync::Arc;
use std::time::Duration;

use tangga_protocol::{
    ClientAction, Codec, ConnectionId, Envelope, PROTOCOL_VERSION, ProtocolError, ServerEvent,
};
use tangga_room::{CoordinatorHandle, now_millis};
use tangga_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::TanggaError;
use crate::server::ServerState;

/// How long a fresh connection has to say `hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the shared leave path when the handler exits, however it exits.
///
/// `Drop` is synchronous, so the disconnect is sent from a spawned task.
struct SessionGuard {
    conn_id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let _ = coordinator.disconnect(conn_id).await;
        });
    }
}

/// Writes events to one connection with a running sequence number.
struct Outbox<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
}

impl<C: Codec> Outbox<'_, C> {
    async fn send(&mut self, event: ServerEvent) -> Result<(), TanggaError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: now_millis(),
            event,
        };
        self.seq += 1;
        let text = self.codec.encode(&envelope)?;
        self.conn.send_text(&text).await?;
        Ok(())
    }

    async fn send_error(&mut self, code: u16, message: String) -> Result<(), TanggaError> {
        self.send(ServerEvent::Error { code, message }).await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TanggaError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let mut outbox = Outbox {
        conn: &conn,
        codec: &state.codec,
        seq: 0,
    };

    // --- Step 1: Handshake ---
    if let Err(e) = perform_handshake(&conn, &mut outbox).await {
        let _ = conn.close().await;
        return Err(e);
    }

    // --- Step 2: Register with the coordinator ---
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.coordinator.connect(conn_id, tx).await?;
    let _guard = SessionGuard {
        conn_id,
        coordinator: state.coordinator.clone(),
    };
    tracing::info!(%conn_id, "player connected");

    // --- Step 3: Message loop ---
    // Only inbound frames push the idle deadline; outbound traffic doesn't.
    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                let data = match incoming {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(Instant::now() + state.idle_timeout);

                let action: ClientAction = match state.codec.decode(&data) {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode action");
                        outbox.send_error(400, e.to_string()).await?;
                        continue;
                    }
                };
                state.coordinator.submit(conn_id, action).await?;
            }
            Some(event) = rx.recv() => {
                outbox.send(event).await?;
            }
            () = &mut idle => {
                tracing::info!(%conn_id, "connection idle, dropping");
                break;
            }
        }
    }

    // _guard drops here → disconnect fires.
    Ok(())
}

/// Receives `hello`, checks the version, sends `welcome`.
async fn perform_handshake<C: Codec>(
    conn: &WebSocketConnection,
    outbox: &mut Outbox<'_, C>,
) -> Result<(), TanggaError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let version = match outbox.codec.decode::<ClientAction>(&data) {
        Ok(ClientAction::Hello { version }) => version,
        _ => {
            outbox
                .send_error(400, "first message must be hello".into())
                .await?;
            return Err(
                ProtocolError::InvalidMessage("first message must be hello".into()).into(),
            );
        }
    };

    if version != PROTOCOL_VERSION {
        outbox
            .send_error(
                400,
                format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
            )
            .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    outbox
        .send(ServerEvent::Welcome {
            connection_id: conn.id(),
            server_time: now_millis(),
        })
        .await
}
