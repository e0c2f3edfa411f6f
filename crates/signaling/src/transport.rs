//! Transport-Abstraktion fuer Sessions
//!
//! Eine Session liest und schreibt Text-Frames ueber zwei getrennte Haelften
//! einer Verbindung. Lese- und Schreib-Schleife laufen in verschiedenen
//! Tasks, deshalb wird die Verbindung beim Start in [`FrameLeser`] und
//! [`FrameSchreiber`] aufgeteilt.
//!
//! Produktiv wird [`crate::ws::WsTransport`] verwendet, Tests nutzen einen
//! In-Memory-Transport.

use async_trait::async_trait;

use crate::error::SignalingResult;

/// Ein vom Client gelesenes Frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text-Inhalt (erwartet wird eine JSON-Nachricht)
    Text(String),
    /// Sauberes Verbindungsende (Close-Frame oder Stream-Ende)
    Ende,
}

/// Lesende Haelfte einer Verbindung
#[async_trait]
pub trait FrameLeser: Send + 'static {
    /// Liest das naechste Frame
    ///
    /// Fehler, fuer die [`crate::SignalingError::ist_frame_fehler`] gilt,
    /// betreffen nur dieses Frame. Alle anderen Fehler bedeuten, dass die
    /// Verbindung nicht mehr lesbar ist.
    async fn lesen(&mut self) -> SignalingResult<Frame>;
}

/// Schreibende Haelfte einer Verbindung
#[async_trait]
pub trait FrameSchreiber: Send + 'static {
    /// Sendet ein Text-Frame
    async fn schreiben(&mut self, text: String) -> SignalingResult<()>;

    /// Schliesst die Verbindung
    ///
    /// Wird von der Session genau einmal aufgerufen.
    async fn schliessen(&mut self) -> SignalingResult<()>;
}

/// Eine aufteilbare Verbindung
pub trait Transport: Send + 'static {
    type Leser: FrameLeser;
    type Schreiber: FrameSchreiber;

    /// Teilt die Verbindung in Lese- und Schreib-Haelfte
    fn aufteilen(self) -> (Self::Leser, Self::Schreiber);
}
