//! Tangga server entrypoint: config, logging, and graceful shutdown.

use tangga::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), TanggaError> {
    init_tracing();

    let config = ServerConfig::load();
    let builder = TanggaServer::builder()
        .bind(&config.bind)
        .rules(config.rules.clone())
        .idle_timeout(config.idle_timeout());

    match &config.report_path {
        Some(path) => {
            info!(path = %path.display(), "appending game reports");
            serve(builder.build(JsonLinesStats::new(path)).await?).await
        }
        None => serve(builder.build(TracingStats).await?).await,
    }
}

async fn serve<C: Codec>(server: TanggaServer<C>) -> Result<(), TanggaError> {
    info!(addr = %server.local_addr()?, "starting server");
    server.run_until(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

/// Configure tracing from `RUST_LOG`, defaulting to `info`.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
