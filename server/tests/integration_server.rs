//! Integration-Tests fuer den vollstaendig verdrahteten Server

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rundfunk_core::Nachricht;
use rundfunk_server::{config::ServerConfig, LaufenderServer, Server};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.netzwerk.bind_adresse = "127.0.0.1".into();
    config.netzwerk.port = 0;
    config.observability.port = 0;
    config
}

async fn hochfahren(config: ServerConfig) -> LaufenderServer {
    timeout(TIMEOUT, Server::neu(config).hochfahren())
        .await
        .expect("Timeout beim Hochfahren")
        .expect("Server startet nicht")
}

async fn naechste_nachricht<S>(ws: &mut S) -> Nachricht
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match timeout(TIMEOUT, ws.next()).await.expect("Timeout") {
            Some(Ok(Message::Text(text))) => return Nachricht::aus_json(&text).unwrap(),
            Some(Ok(_)) => continue,
            anderes => panic!("Unerwartet: {anderes:?}"),
        }
    }
}

#[tokio::test]
async fn server_verteilt_nachrichten() {
    let server = hochfahren(test_config()).await;
    let addr = server.adresse();

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    assert_eq!(naechste_nachricht(&mut ws).await, Nachricht::willkommen());

    let hallo = Nachricht::neu("Tester", "hallo");
    ws.send(Message::Text(hallo.zu_json().unwrap())).await.unwrap();
    assert_eq!(naechste_nachricht(&mut ws).await, hallo);

    let antwort = reqwest::get(format!("http://{addr}/broadcast/ping"))
        .await
        .unwrap();
    assert_eq!(antwort.text().await.unwrap(), "Broadcasting ping");
    assert_eq!(
        naechste_nachricht(&mut ws).await,
        Nachricht::vom_server("ping")
    );

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn health_und_metriken() {
    let server = hochfahren(test_config()).await;
    let obs = server
        .observability_adresse()
        .expect("Observability ist standardmaessig aktiviert");

    let (mut ws, _) = connect_async(format!("ws://{}/ws", server.adresse()))
        .await
        .unwrap();
    naechste_nachricht(&mut ws).await;

    let health: serde_json::Value = reqwest::get(format!("http://{obs}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["sessions_active"], 1);

    let metriken = reqwest::get(format!("http://{obs}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metriken.contains("rundfunk_sessions_active 1"));
    assert!(metriken.contains("rundfunk_sessions_total 1"));

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn observability_deaktivierbar() {
    let mut config = test_config();
    config.observability.aktiviert = false;
    let server = hochfahren(config).await;
    assert!(server.observability_adresse().is_none());
    server.beenden().await.unwrap();
}

#[tokio::test]
async fn beenden_trennt_alle_sessions() {
    let server = hochfahren(test_config()).await;
    let addr = server.adresse();

    let (mut a, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let (mut b, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    naechste_nachricht(&mut a).await;
    naechste_nachricht(&mut b).await;
    assert_eq!(server.sessions(), 2);

    timeout(TIMEOUT, server.beenden())
        .await
        .expect("Beenden haengt")
        .unwrap();

    // Nach dem Beenden liefern beide Streams nur noch Close/Ende
    for ws in [&mut a, &mut b] {
        let ende = timeout(TIMEOUT, async {
            while let Some(Ok(frame)) = ws.next().await {
                if frame.is_close() {
                    break;
                }
            }
        })
        .await;
        assert!(ende.is_ok());
    }
}

#[tokio::test]
async fn ungueltige_konfiguration_startet_nicht() {
    let mut config = test_config();
    config.sessions.queue_kapazitaet = 0;
    assert!(Server::neu(config).hochfahren().await.is_err());
}
