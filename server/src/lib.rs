//! rundfunk-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Metriken, Signaling-Server und
//! Observability-Server und stellt den Einstiegspunkt fuer
//! Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use rundfunk_observability::{observability_server_starten, HealthState, RundfunkMetrics};
use rundfunk_signaling::{SignalingServer, SignalingState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wie lange beim Herunterfahren auf das Ende aller Sessions gewartet wird
const SESSION_ABBAU_TIMEOUT: Duration = Duration::from_secs(5);

/// Haelt die Konfiguration bis zum Start zusammen
pub struct Server {
    pub config: ServerConfig,
}

/// Ein gestarteter Server
///
/// Laeuft bis `beenden` aufgerufen oder der Shutdown-Token ausgeloest wird.
pub struct LaufenderServer {
    adresse: SocketAddr,
    observability_adresse: Option<SocketAddr>,
    state: Arc<SignalingState>,
    health: HealthState,
    signaling: JoinHandle<std::io::Result<()>>,
    observability: Option<JoinHandle<std::io::Result<()>>>,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bindet alle Sockets und startet die Subsysteme im Hintergrund
    ///
    /// Reihenfolge:
    /// 1. Metriken anlegen
    /// 2. Signaling-Server starten (`/ws`, `/broadcast/*`)
    /// 3. Observability-Server starten (falls aktiviert)
    pub async fn hochfahren(self) -> Result<LaufenderServer> {
        let config = self.config;
        config.validieren()?;

        tracing::info!(
            server_name = %config.server.name,
            adresse = %config.bind_adresse()?,
            queue_kapazitaet = config.sessions.queue_kapazitaet,
            max_clients = config.sessions.max_clients,
            "Server startet"
        );

        let metriken = RundfunkMetrics::neu()?;
        let shutdown = CancellationToken::new();
        let state = SignalingState::neu(config.signaling_config(), metriken.clone(), shutdown);

        let (adresse, signaling) =
            SignalingServer::neu(Arc::clone(&state), config.bind_adresse()?)
                .starten()
                .await?;

        let health = HealthState::neu(metriken);
        let (observability_adresse, observability) = if config.observability.aktiviert {
            let (addr, handle) = observability_server_starten(
                config.observability_bind_adresse()?,
                health.clone(),
                state.shutdown.clone(),
            )
            .await?;
            (Some(addr), Some(handle))
        } else {
            tracing::info!("Observability-Server deaktiviert");
            (None, None)
        };

        Ok(LaufenderServer {
            adresse,
            observability_adresse,
            state,
            health,
            signaling,
            observability,
        })
    }

    /// Startet den Server und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let laufend = self.hochfahren().await?;

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        let shutdown = laufend.shutdown_token();
        tokio::select! {
            ergebnis = tokio::signal::ctrl_c() => {
                ergebnis?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            }
            _ = shutdown.cancelled() => {}
        }

        laufend.beenden().await
    }
}

impl LaufenderServer {
    /// Adresse von `/ws` und `/broadcast/*`
    pub fn adresse(&self) -> SocketAddr {
        self.adresse
    }

    /// Adresse von `/metrics` und `/health`, falls aktiviert
    pub fn observability_adresse(&self) -> Option<SocketAddr> {
        self.observability_adresse
    }

    /// Server-weiter Shutdown-Token
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Anzahl aktuell registrierter Sessions
    pub fn sessions(&self) -> usize {
        self.state.registry.anzahl()
    }

    /// Faehrt alle Subsysteme herunter und wartet auf ihr Ende
    pub async fn beenden(self) -> Result<()> {
        self.health.bereit_setzen(false);
        self.state.shutdown.cancel();

        self.signaling.await??;
        if let Some(handle) = self.observability {
            handle.await??;
        }

        // Session-Tokens sind Kinder des Shutdown-Tokens, alle Sessions bauen ab
        let abgebaut = tokio::time::timeout(SESSION_ABBAU_TIMEOUT, async {
            while self.state.registry.anzahl() > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        if abgebaut.is_err() {
            tracing::warn!(
                verbleibend = self.state.registry.anzahl(),
                "Nicht alle Sessions rechtzeitig abgebaut"
            );
        }

        tracing::info!(uptime_sek = self.health.uptime_seconds(), "Server beendet");
        Ok(())
    }
}
