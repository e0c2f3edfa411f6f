//! Broadcaster – Einziger Engpass fuer Fan-out
//!
//! Der Broadcaster reiht eine Nachricht in die Eingangs-Queue jeder
//! registrierten Session ein.
//!
//! ## Zustell-Policy
//! - Einreihen ist nicht-blockierend (`try_send`)
//! - Volle Queue: die Nachricht wird fuer diese Session verworfen, andere
//!   Sessions sind nicht betroffen
//! - Geschlossene Queue (Session baut gerade ab): wird uebersprungen
//! - Der Aufrufer erfaehrt nichts ueber einzelne Sessions, Zustellung ist
//!   best effort
//!
//! Ein langsamer Client verliert also Nachrichten statt das System
//! aufzuhalten.

use rundfunk_core::Nachricht;
use rundfunk_observability::RundfunkMetrics;

use crate::registry::SessionRegistry;
use crate::session::Zustellung;

/// Verteilt Nachrichten an alle Sessions einer Registry
///
/// Clone teilt Registry und Metriken.
#[derive(Clone)]
pub struct Broadcaster {
    registry: SessionRegistry,
    metriken: Option<RundfunkMetrics>,
}

impl Broadcaster {
    /// Erstellt einen Broadcaster fuer die gegebene Registry
    pub fn neu(registry: SessionRegistry) -> Self {
        Self {
            registry,
            metriken: None,
        }
    }

    /// Zaehlt Broadcasts, Zustellungen und Verwerfungen in `metriken`
    pub fn mit_metriken(mut self, metriken: RundfunkMetrics) -> Self {
        self.metriken = Some(metriken);
        self
    }

    /// Sendet eine Nachricht an alle registrierten Sessions
    ///
    /// Blockiert nie. Jede Session, die zum Aufrufzeitpunkt registriert
    /// ist, bekommt genau einen Zustellversuch.
    pub fn senden(&self, nachricht: Nachricht) {
        let mut eingereiht = 0u64;
        let mut verworfen = 0u64;

        self.registry
            .fuer_alle(|session| match session.einreihen(nachricht.clone()) {
                Zustellung::Eingereiht => eingereiht += 1,
                Zustellung::Verworfen => verworfen += 1,
                Zustellung::Geschlossen => {}
            });

        if let Some(m) = &self.metriken {
            m.broadcasts_total.inc();
            m.deliveries_total.inc_by(eingereiht);
            m.dropped_total.inc_by(verworfen);
        }

        tracing::debug!(
            author = nachricht.author(),
            eingereiht,
            verworfen,
            "Broadcast verteilt"
        );
    }

    pub(crate) fn metriken(&self) -> Option<&RundfunkMetrics> {
        self.metriken.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
