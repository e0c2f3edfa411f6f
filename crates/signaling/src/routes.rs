//! HTTP-Router des Signaling-Service
//!
//! | Methode | Pfad                      | Handler                   |
//! |---------|---------------------------|---------------------------|
//! | GET     | `/ws`                     | WebSocket-Upgrade         |
//! | GET     | `/broadcast/:text`        | Broadcast ausloesen       |
//! | GET     | `/broadcast/:text/`       | Broadcast ausloesen       |
//! | GET     | `/broadcast/:text/*rest`  | Nur erstes Segment senden |
//! | GET     | `/broadcast`              | 400, Text fehlt           |
//! | GET     | `/broadcast/`             | 400, Text fehlt           |

use axum::{routing::get, Router};
use rundfunk_observability::{request_timing_layer, timing_middleware};
use std::sync::Arc;

use crate::connection::ws_upgrade;
use crate::server_state::SignalingState;
use crate::trigger::{broadcast_handler, broadcast_mit_rest_handler, fehlendes_segment};

/// Baut den Router fuer `/ws` und `/broadcast/*`
pub fn router(state: Arc<SignalingState>) -> Router {
    let metriken = state.metriken.clone();

    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/broadcast/:text", get(broadcast_handler))
        .route("/broadcast/:text/", get(broadcast_handler))
        .route("/broadcast/:text/*rest", get(broadcast_mit_rest_handler))
        .route("/broadcast", get(fehlendes_segment))
        .route("/broadcast/", get(fehlendes_segment))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            metriken,
            timing_middleware,
        ))
        .layer(request_timing_layer())
}
