//! Session-Registry – Menge aller live Sessions
//!
//! Die Registry ist die einzige geteilte, veraenderliche Struktur des
//! Services. Sie wird vom `SignalingState` besessen und explizit an
//! Einstiegspunkte und Broadcaster weitergereicht.
//!
//! ## Nebenlaeufigkeit
//! - Mitgliedschaft liegt in einer `DashMap`, Hinzufuegen und Entfernen
//!   sperren nur den betroffenen Shard
//! - `fuer_alle` iteriert ueber einen Schnappschuss, parallele
//!   Aenderungen koennen die Iteration nicht stoeren
//! - Zugestellt wird ausserhalb jeder Sperre

use dashmap::DashMap;
use rundfunk_core::SessionId;
use rundfunk_observability::RundfunkMetrics;
use std::sync::Arc;

use crate::session::SessionHandle;

/// Prozessweite Menge der registrierten Sessions
///
/// Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    sessions: DashMap<SessionId, SessionHandle>,
    metriken: Option<RundfunkMetrics>,
}

impl SessionRegistry {
    /// Erstellt eine leere Registry ohne Metriken
    pub fn neu() -> Self {
        Self::default()
    }

    /// Erstellt eine leere Registry, die `rundfunk_sessions_*` pflegt
    pub fn mit_metriken(metriken: RundfunkMetrics) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: DashMap::new(),
                metriken: Some(metriken),
            }),
        }
    }

    /// Nimmt eine Session auf
    ///
    /// Gibt `false` zurueck wenn die ID bereits registriert war, der
    /// vorhandene Eintrag bleibt dann unveraendert.
    pub fn hinzufuegen(&self, handle: SessionHandle) -> bool {
        let id = handle.id();
        let neu = match self.inner.sessions.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(eintrag) => {
                eintrag.insert(handle);
                true
            }
        };

        if neu {
            if let Some(m) = &self.inner.metriken {
                m.sessions_active.inc();
                m.sessions_total.inc();
            }
            tracing::debug!(session = %id, anzahl = self.anzahl(), "Session registriert");
        } else {
            tracing::warn!(session = %id, "Session war bereits registriert");
        }
        neu
    }

    /// Nimmt eine Session auf und liefert einen Guard, der sie beim Drop
    /// wieder entfernt
    pub fn registrieren(&self, handle: SessionHandle) -> Registrierung {
        let id = handle.id();
        self.hinzufuegen(handle);
        Registrierung {
            registry: self.clone(),
            id,
        }
    }

    /// Entfernt eine Session
    ///
    /// Entfernen einer unbekannten ID ist ein No-op und liefert `false`.
    pub fn entfernen(&self, id: &SessionId) -> bool {
        let entfernt = self.inner.sessions.remove(id).is_some();
        if entfernt {
            if let Some(m) = &self.inner.metriken {
                m.sessions_active.dec();
            }
            tracing::debug!(session = %id, anzahl = self.anzahl(), "Session entfernt");
        }
        entfernt
    }

    /// Ruft `f` fuer jede Session auf, die zum Aufrufzeitpunkt Mitglied ist
    ///
    /// Reihenfolge: aufsteigende SessionId.
    pub fn fuer_alle(&self, mut f: impl FnMut(&SessionHandle)) {
        for handle in &self.schnappschuss() {
            f(handle);
        }
    }

    /// Kopie aller Handles, sortiert nach SessionId
    pub fn schnappschuss(&self) -> Vec<SessionHandle> {
        let mut handles: Vec<SessionHandle> = self
            .inner
            .sessions
            .iter()
            .map(|eintrag| eintrag.value().clone())
            .collect();
        handles.sort_by_key(SessionHandle::id);
        handles
    }

    /// Anzahl registrierter Sessions
    pub fn anzahl(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Prueft ob eine Session registriert ist
    pub fn enthaelt(&self, id: &SessionId) -> bool {
        self.inner.sessions.contains_key(id)
    }
}

/// Mitgliedschaft einer Session in der Registry
///
/// Entfernt die Session beim Drop genau einmal, egal auf welchem Pfad die
/// Session endet.
#[must_use = "die Session wird beim Drop der Registrierung sofort entfernt"]
pub struct Registrierung {
    registry: SessionRegistry,
    id: SessionId,
}

impl Registrierung {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for Registrierung {
    fn drop(&mut self) {
        self.registry.entfernen(&self.id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
