//! Nachricht – die Einheit die ueberall ausgetauscht wird
//!
//! Wire-Format (ein WebSocket-Frame pro Nachricht):
//! ```text
//! {"author": "<string>", "body": "<string>"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, RundfunkError};

/// Autor fuer alle vom Server erzeugten Nachrichten
pub const SERVER_AUTOR: &str = "Server";

/// Text der Begruessung, die jeder neue Client als erstes Frame erhaelt
pub const WILLKOMMEN_TEXT: &str = "Welcome!";

/// Eine Chat-Nachricht
///
/// Unveraenderlicher Wert ohne eigene Identitaet, Gleichheit ist
/// Wertgleichheit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nachricht {
    author: String,
    body: String,
}

impl Nachricht {
    /// Erstellt eine neue Nachricht
    pub fn neu(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
        }
    }

    /// Nachricht mit Autor "Server"
    pub fn vom_server(body: impl Into<String>) -> Self {
        Self::neu(SERVER_AUTOR, body)
    }

    /// Die Begruessung fuer neu verbundene Clients
    pub fn willkommen() -> Self {
        Self::vom_server(WILLKOMMEN_TEXT)
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Serialisiert die Nachricht als JSON-Objekt
    pub fn zu_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Dekodiert eine Nachricht aus einem JSON-Frame
    ///
    /// Fehlende Felder oder falsche Typen ergeben
    /// `RundfunkError::UngueltigeNachricht`.
    pub fn aus_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RundfunkError::UngueltigeNachricht(e.to_string()))
    }
}

impl std::fmt::Display for Nachricht {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.author, self.body)
    }
}
