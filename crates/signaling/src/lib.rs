//! rundfunk-signaling – WebSocket-Sessions und Broadcast
//!
//! Dieser Crate implementiert den eigentlichen Rundfunk-Service: jeder
//! verbundene Client bekommt eine Session, jede von einem Client gelesene
//! Nachricht geht an alle Clients (auch zurueck an den Absender). Zusaetzlich
//! kann ueber HTTP eine Server-Nachricht an alle verteilt werden.
//!
//! ## Architektur
//!
//! ```text
//! SignalingServer (axum::serve)
//!     |
//!     +-- GET /ws              -> verbindung_behandeln
//!     |                              |
//!     |                              v
//!     |                          Session (Lese- + Schreib-Schleife)
//!     |                              |  gelesene Nachricht
//!     |                              v
//!     +-- GET /broadcast/:text -> Broadcaster --try_send--> Eingangs-Queues
//!                                    |
//!                                    v
//!                              SessionRegistry (DashMap, Schnappschuss)
//! ```
//!
//! Die Registry wird vom `SignalingState` besessen und explizit
//! weitergereicht.

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod listener;
pub mod registry;
pub mod routes;
pub mod server_state;
pub mod session;
pub mod transport;
pub mod trigger;
pub mod ws;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use broadcast::Broadcaster;
pub use connection::verbindung_behandeln;
pub use error::{SignalingError, SignalingResult};
pub use listener::SignalingServer;
pub use registry::{Registrierung, SessionRegistry};
pub use routes::router;
pub use server_state::{SignalingConfig, SignalingState};
pub use session::{Session, SessionHandle, SessionZustand, Zustellung};
pub use transport::{Frame, FrameLeser, FrameSchreiber, Transport};
pub use trigger::broadcast_ausloesen;
pub use ws::WsTransport;
