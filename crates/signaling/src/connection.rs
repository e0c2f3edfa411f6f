//! Verbindungs-Einstieg – vom WebSocket-Upgrade bis zum Session-Ende
//!
//! Ablauf pro Verbindung:
//! 1. Session anlegen (Queue, Beenden-Token als Kind des Server-Shutdowns)
//! 2. In der Registry anmelden
//! 3. Begruessung direkt auf die Verbindung schreiben
//! 4. Lese- und Schreib-Schleife bis zum Ende laufen lassen
//!
//! Schlaegt die Begruessung fehl, wird die Session wieder abgemeldet und die
//! Verbindung geschlossen, ohne dass die Schleifen starten.

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;
use crate::session::Session;
use crate::transport::Transport;
use crate::ws::WsTransport;

/// Betreibt eine akzeptierte Verbindung bis zu ihrem Ende
///
/// Kehrt erst zurueck, wenn die Session abgemeldet und die Verbindung
/// geschlossen ist.
pub async fn verbindung_behandeln<T: Transport>(transport: T, state: Arc<SignalingState>) {
    let mut session = Session::neu(
        transport,
        state.config.queue_kapazitaet,
        state.shutdown.child_token(),
    )
    .mit_max_dekodierfehler(state.config.max_dekodierfehler);
    let id = session.id();

    // Vor der Begruessung anmelden: wer die Begruessung gesehen hat, ist
    // bereits Broadcast-Empfaenger
    let registrierung = state.registry.registrieren(session.handle());
    tracing::info!(session = %id, anzahl = state.registry.anzahl(), "Neue Session");

    if let Err(e) = session.begruessen().await {
        tracing::warn!(session = %id, fehler = %e, "Begruessung fehlgeschlagen");
        session.abbrechen(registrierung).await;
        return;
    }

    session.ausfuehren(&state.broadcaster, registrierung).await;
}

/// `GET /ws` – WebSocket-Upgrade
///
/// Lehnt mit 503 ab, wenn `max_clients` erreicht ist.
pub async fn ws_upgrade(
    State(state): State<Arc<SignalingState>>,
    ws: WebSocketUpgrade,
) -> SignalingResult<Response> {
    if state.ist_voll() {
        tracing::warn!(
            max = state.config.max_clients,
            "Server voll – Upgrade abgelehnt"
        );
        return Err(SignalingError::ServerVoll);
    }

    Ok(ws
        .on_failed_upgrade(|e| {
            tracing::warn!(fehler = %e, "WebSocket-Upgrade fehlgeschlagen");
        })
        .on_upgrade(move |socket| verbindung_behandeln(WsTransport::neu(socket), state))
        .into_response())
}
