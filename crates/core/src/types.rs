//! Identifikationstypen fuer Rundfunk
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen mit anderen Zahlen
//! zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Zaehler fuer fortlaufende Session-IDs (prozessweit eindeutig)
static NAECHSTE_SESSION: AtomicU64 = AtomicU64::new(1);

/// Eindeutige Session-ID
///
/// IDs werden monoton vergeben. Die Registry iteriert in aufsteigender
/// Reihenfolge, aeltere Sessions werden also zuerst beliefert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Erstellt die naechste freie SessionId
    pub fn neu() -> Self {
        Self(NAECHSTE_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}
