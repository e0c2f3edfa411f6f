//! WebSocket-Transport auf Basis von `axum::extract::ws`
//!
//! Text-Frames und UTF-8-Binaer-Frames werden als [`Frame::Text`]
//! weitergereicht. Ping/Pong kommen in `WsLeser::lesen` an und werden dort
//! uebersprungen, die Pong-Antwort auf einen Ping verschickt axum selbst.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rundfunk_core::RundfunkError;

use crate::error::{SignalingError, SignalingResult};
use crate::transport::{Frame, FrameLeser, FrameSchreiber, Transport};

/// Eine akzeptierte WebSocket-Verbindung
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn neu(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for WsTransport {
    type Leser = WsLeser;
    type Schreiber = WsSchreiber;

    fn aufteilen(self) -> (WsLeser, WsSchreiber) {
        let (sink, stream) = self.socket.split();
        (WsLeser { stream }, WsSchreiber { sink })
    }
}

/// Lesende Haelfte eines WebSockets
pub struct WsLeser {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameLeser for WsLeser {
    async fn lesen(&mut self) -> SignalingResult<Frame> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Frame::Text(text)),
                Some(Ok(Message::Binary(daten))) => {
                    return String::from_utf8(daten).map(Frame::Text).map_err(|_| {
                        RundfunkError::UngueltigeNachricht("Binaer-Frame ist kein UTF-8".into())
                            .into()
                    });
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Ok(Frame::Ende),
                Some(Err(e)) => return Err(SignalingError::transport(e.to_string())),
            }
        }
    }
}

/// Schreibende Haelfte eines WebSockets
pub struct WsSchreiber {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl FrameSchreiber for WsSchreiber {
    async fn schreiben(&mut self, text: String) -> SignalingResult<()> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| SignalingError::transport(e.to_string()))
    }

    async fn schliessen(&mut self) -> SignalingResult<()> {
        // Close-Frame ist best effort, der Peer kann schon weg sein
        let _ = self.sink.send(Message::Close(None)).await;
        self.sink
            .close()
            .await
            .map_err(|e| SignalingError::transport(e.to_string()))
    }
}
