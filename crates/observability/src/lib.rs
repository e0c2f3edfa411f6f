//! # rundfunk-observability
//!
//! Observability-Crate fuer Rundfunk:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Check-Endpunkt (`/health`)
//! - Structured Logging via tracing-subscriber
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{health_router, HealthResponse, HealthState, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, RundfunkMetrics};
pub use middleware::{request_timing_layer, timing_middleware};

use anyhow::Result;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Startet den Observability-HTTP-Server (Metriken + Health)
///
/// Endpunkte:
/// - `GET /metrics` – Prometheus scrape format
/// - `GET /health`  – Health-Check JSON
///
/// Bindet sofort und laeuft im Hintergrund bis `shutdown` ausgeloest wird.
/// Gibt die gebundene Adresse zurueck (relevant bei Port 0).
pub async fn observability_server_starten(
    bind_addr: SocketAddr,
    health: HealthState,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
    let app = axum::Router::new()
        .merge(metrics_router(health.metriken.clone()))
        .merge(health_router(health));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let lokale_addr = listener.local_addr()?;
    tracing::info!(addr = %lokale_addr, "Observability-Server gestartet");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    });
    Ok((lokale_addr, handle))
}
