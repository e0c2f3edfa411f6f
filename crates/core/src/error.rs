//! Fehlertypen fuer Rundfunk
//!
//! Zentraler Fehler-Enum fuer die Kern-Typen. Untermodule koennen eigene
//! Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Rundfunk
pub type Result<T> = std::result::Result<T, RundfunkError>;

/// Fehler beim Umgang mit Nachrichten
#[derive(Debug, Error)]
pub enum RundfunkError {
    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[from] serde_json::Error),
}

impl RundfunkError {
    /// Gibt true zurueck wenn der Fehler nur ein einzelnes Frame betrifft
    ///
    /// Solche Fehler beenden keine Session, das naechste Frame kann
    /// wieder gueltig sein.
    pub fn betrifft_nur_frame(&self) -> bool {
        matches!(self, Self::UngueltigeNachricht(_) | Self::Serialisierung(_))
    }
}
