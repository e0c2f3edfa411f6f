//! Fehlertypen fuer den Signaling-Service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rundfunk_core::RundfunkError;
use serde_json::json;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Socket, Listener)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Fehler der Transportschicht (WebSocket)
    #[error("Transportfehler: {0}")]
    Transport(String),

    /// Nachricht konnte nicht dekodiert oder kodiert werden
    #[error("Nachrichtenfehler: {0}")]
    Nachricht(#[from] RundfunkError),

    /// Verbindung wurde bereits getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,

    /// Ungueltige Eingabe an einem HTTP-Endpunkt
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    /// Maximale Anzahl Sessions erreicht
    #[error("Server ist voll")]
    ServerVoll,
}

impl SignalingError {
    /// Erstellt einen Transportfehler
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Betrifft der Fehler nur das aktuelle Frame?
    ///
    /// Frame-Fehler werden in der Lese-Schleife uebersprungen, alle anderen
    /// Fehler beenden die Session.
    pub fn ist_frame_fehler(&self) -> bool {
        match self {
            Self::Nachricht(e) => e.betrifft_nur_frame(),
            _ => false,
        }
    }

    /// HTTP-Statuscode fuer REST-Fehler
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::UngueltigeEingabe(_) | Self::Nachricht(_) => StatusCode::BAD_REQUEST,
            Self::ServerVoll => StatusCode::SERVICE_UNAVAILABLE,
            Self::VerbindungGetrennt => StatusCode::GONE,
            Self::Io(_) | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignalingError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        (
            status,
            Json(json!({ "error": { "code": status.as_u16(), "message": self.to_string() } })),
        )
            .into_response()
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
