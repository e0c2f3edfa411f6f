//! Listener – Bindet Socket, bedient `/ws` und `/broadcast/*`
//!
//! Der `SignalingServer` bindet einen TCP-Socket und uebergibt ihn an
//! `axum::serve`. Jede WebSocket-Verbindung laeuft nach dem Upgrade in
//! einem eigenen tokio-Task.
//!
//! ## Shutdown
//! Der Server laeuft bis `SignalingState::shutdown` ausgeloest wird. Da alle
//! Session-Tokens Kinder dieses Tokens sind, beenden sich dabei auch alle
//! Sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::SignalingResult;
use crate::routes::router;
use crate::server_state::SignalingState;

/// HTTP/WebSocket-Signaling-Server
pub struct SignalingServer {
    state: Arc<SignalingState>,
    bind_addr: SocketAddr,
}

impl SignalingServer {
    /// Erstellt einen neuen SignalingServer
    pub fn neu(state: Arc<SignalingState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Bindet den Socket und startet den Server im Hintergrund
    ///
    /// Gibt die tatsaechlich gebundene Adresse zurueck (relevant bei Port 0)
    /// sowie das Handle des Server-Tasks. Ist der Port belegt, kommt
    /// `SignalingError::Io` zurueck.
    pub async fn starten(
        self,
    ) -> SignalingResult<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        let lokale_addr = listener.local_addr()?;

        tracing::info!(adresse = %lokale_addr, "Signaling-Server gestartet");

        let shutdown = self.state.shutdown.clone();
        let app = router(self.state);

        let handle = tokio::spawn(async move {
            let ergebnis = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await;
            tracing::info!("Signaling-Server gestoppt");
            ergebnis
        });

        Ok((lokale_addr, handle))
    }
}
