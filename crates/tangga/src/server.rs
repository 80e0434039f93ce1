//! `TanggaServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → coordinator actor.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tangga_protocol::{Codec, JsonCodec};
use tangga_room::{Coordinator, CoordinatorHandle, GameRules, StatsSink, spawn_coordinator};
use tangga_transport::{Transport, WebSocketTransport};

use crate::TanggaError;
use crate::handler::handle_connection;

/// Command queue depth for the coordinator actor.
const DEFAULT_CHANNEL_SIZE: usize = 256;

/// State shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) codec: C,
    /// A connection silent for this long is dropped.
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Tangga server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TanggaServer::builder()
///     .bind("0.0.0.0:3000")
///     .idle_timeout(Duration::from_secs(60))
///     .build(JsonLinesStats::new("games.jsonl"))
///     .await?;
/// ```
pub struct TanggaServerBuilder {
    bind_addr: String,
    rules: GameRules,
    idle_timeout: Duration,
    channel_size: usize,
}

impl TanggaServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            rules: GameRules::default(),
            idle_timeout: Duration::from_secs(60),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the game rules applied to every room.
    pub fn rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    /// Sets how long a connection may stay silent before it is dropped.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the coordinator's command queue depth.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.channel_size = size.max(1);
        self
    }

    /// Binds the listener and starts the coordinator.
    ///
    /// Finished games are reported to `stats`. Uses `JsonCodec` and
    /// `WebSocketTransport`.
    pub async fn build<S: StatsSink>(self, stats: S) -> Result<TanggaServer<JsonCodec>, TanggaError> {
        let coordinator = Coordinator::new(self.rules.clone());
        self.build_with(coordinator, stats).await
    }

    /// Like [`build`](Self::build), with a preassembled coordinator
    /// (fixed codes or a seeded RNG in tests). The coordinator's own rules
    /// apply; [`rules`](Self::rules) is ignored.
    pub async fn build_with<S: StatsSink>(
        self,
        coordinator: Coordinator,
        stats: S,
    ) -> Result<TanggaServer<JsonCodec>, TanggaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let handle = spawn_coordinator(coordinator, Arc::new(stats), self.channel_size);

        let state = Arc::new(ServerState {
            coordinator: handle,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(TanggaServer { transport, state })
    }
}

impl Default for TanggaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tangga server. Call [`run`](Self::run) to accept players.
pub struct TanggaServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl TanggaServer<JsonCodec> {
    pub fn builder() -> TanggaServerBuilder {
        TanggaServerBuilder::new()
    }
}

impl<C: Codec> TanggaServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TanggaError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns a handle to the running coordinator.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.state.coordinator.clone()
    }

    /// Accepts connections until the process exits.
    pub async fn run(self) -> Result<(), TanggaError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves, then stops the
    /// coordinator. Open connections see `Unavailable` on their next
    /// action and close.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), TanggaError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Tangga server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        // Already stopped is fine.
        let _ = self.state.coordinator.shutdown().await;
        Ok(())
    }
}
