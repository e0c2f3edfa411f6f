//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Registry, Broadcaster und Metriken. Wird als `Arc` an den Router
//! und an jede Verbindung weitergereicht, es gibt keinen globalen Zustand.

use rundfunk_observability::RundfunkMetrics;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::broadcast::Broadcaster;
use crate::registry::SessionRegistry;
use crate::session::{STANDARD_MAX_DEKODIERFEHLER, STANDARD_QUEUE_KAPAZITAET};

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Kapazitaet der Eingangs-Queue pro Session
    pub queue_kapazitaet: usize,
    /// Aufeinanderfolgende Dekodierfehler bis zum Beenden (0 = kein Limit)
    pub max_dekodierfehler: u32,
    /// Maximale gleichzeitige Sessions (0 = kein Limit)
    pub max_clients: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            queue_kapazitaet: STANDARD_QUEUE_KAPAZITAET,
            max_dekodierfehler: STANDARD_MAX_DEKODIERFEHLER,
            max_clients: 0,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Service-Konfiguration
    pub config: SignalingConfig,
    /// Alle live Sessions
    pub registry: SessionRegistry,
    /// Fan-out an alle Sessions der Registry
    pub broadcaster: Broadcaster,
    /// Prometheus-Metriken
    pub metriken: RundfunkMetrics,
    /// Server-Shutdown, Eltern-Token aller Session-Tokens
    pub shutdown: CancellationToken,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(
        config: SignalingConfig,
        metriken: RundfunkMetrics,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let registry = SessionRegistry::mit_metriken(metriken.clone());
        let broadcaster = Broadcaster::neu(registry.clone()).mit_metriken(metriken.clone());
        Arc::new(Self {
            config,
            registry,
            broadcaster,
            metriken,
            shutdown,
        })
    }

    /// Ist das Session-Limit erreicht?
    pub fn ist_voll(&self) -> bool {
        self.config.max_clients > 0 && self.registry.anzahl() >= self.config.max_clients
    }
}
