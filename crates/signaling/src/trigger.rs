//! Externer Broadcast-Ausloeser
//!
//! `GET /broadcast/<text>` verteilt `{"author":"Server","body":<text>}` an
//! alle Sessions. Es ist keine Session beteiligt, der Aufruf geht direkt an
//! den Broadcaster.

use axum::extract::{Path, State};
use rundfunk_core::Nachricht;
use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::error::SignalingError;
use crate::server_state::SignalingState;

/// Verteilt `text` als Server-Nachricht und liefert den Antworttext
pub fn broadcast_ausloesen(broadcaster: &Broadcaster, text: &str) -> String {
    tracing::info!(text, "Broadcast ausgeloest");
    broadcaster.senden(Nachricht::vom_server(text));
    format!("Broadcasting {text}")
}

/// `GET /broadcast/:text`
///
/// Das Pfadsegment ist bereits percent-dekodiert.
pub async fn broadcast_handler(
    State(state): State<Arc<SignalingState>>,
    Path(text): Path<String>,
) -> String {
    broadcast_ausloesen(&state.broadcaster, &text)
}

/// `GET /broadcast/:text/*rest`
///
/// Nur das erste Segment wird verteilt, weitere Segmente werden ignoriert.
pub async fn broadcast_mit_rest_handler(
    State(state): State<Arc<SignalingState>>,
    Path((text, _rest)): Path<(String, String)>,
) -> String {
    broadcast_ausloesen(&state.broadcaster, &text)
}

/// `GET /broadcast` und `GET /broadcast/` ohne Text
pub async fn fehlendes_segment() -> SignalingError {
    SignalingError::UngueltigeEingabe("Pfad /broadcast/<text> erwartet".into())
}
