//! Tests fuer Session-Lebenszyklus, Begruessung und Fehlerbehandlung

use std::sync::Arc;
use std::time::Duration;

use rundfunk_core::Nachricht;
use rundfunk_observability::RundfunkMetrics;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::speicher_transport::{Gegenseite, SpeicherTransport, Verhalten};
use crate::connection::verbindung_behandeln;
use crate::error::SignalingError;
use crate::server_state::{SignalingConfig, SignalingState};
use crate::session::{Session, SessionZustand};
use crate::transport::Frame;

fn test_state(config: SignalingConfig) -> Arc<SignalingState> {
    SignalingState::neu(
        config,
        RundfunkMetrics::neu().expect("Metriken konnten nicht erstellt werden"),
        CancellationToken::new(),
    )
}

fn standard_state() -> Arc<SignalingState> {
    test_state(SignalingConfig::default())
}

fn verbinden(state: &Arc<SignalingState>, verhalten: Verhalten) -> (JoinHandle<()>, Gegenseite) {
    let (transport, gegenseite) = SpeicherTransport::mit_verhalten(verhalten);
    let handle = tokio::spawn(verbindung_behandeln(transport, state.clone()));
    (handle, gegenseite)
}

/// Verbindet und wartet auf die Begruessung
async fn begruesst(state: &Arc<SignalingState>) -> (JoinHandle<()>, Gegenseite) {
    let (handle, mut gegenseite) = verbinden(state, Verhalten::default());
    assert_eq!(gegenseite.empfangen().await, Nachricht::willkommen());
    (handle, gegenseite)
}

async fn beendet(handle: JoinHandle<()>) {
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("Session endet nicht")
        .expect("Session-Task ist abgestuerzt");
}

// ---------------------------------------------------------------------------
// Begruessung und Echo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_begruessung_genau_einmal_zuerst() {
    let state = standard_state();
    let (_handle, mut a) = verbinden(&state, Verhalten::default());

    let erste = a.empfangen().await;
    assert_eq!(erste.author(), "Server");
    assert_eq!(erste.body(), "Welcome!");
    a.nichts_empfangen(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_eigene_nachricht_kommt_zurueck() {
    let state = standard_state();
    let (_handle, mut a) = begruesst(&state).await;

    let hi = Nachricht::neu("A", "hi");
    a.senden(&hi);
    assert_eq!(a.empfangen().await, hi);
}

#[tokio::test]
async fn test_nachricht_an_alle_sessions() {
    let state = standard_state();
    let (_ha, mut a) = begruesst(&state).await;
    let (_hb, mut b) = begruesst(&state).await;
    assert_eq!(state.registry.anzahl(), 2);

    let hi = Nachricht::neu("A", "hi");
    a.senden(&hi);
    assert_eq!(a.empfangen().await, hi);
    assert_eq!(b.empfangen().await, hi);
}

#[tokio::test]
async fn test_reihenfolge_pro_session() {
    let state = standard_state();
    let (_handle, mut a) = begruesst(&state).await;

    for i in 0..10 {
        a.senden(&Nachricht::neu("A", i.to_string()));
    }
    for i in 0..10 {
        assert_eq!(a.empfangen().await.body(), i.to_string());
    }
}

// ---------------------------------------------------------------------------
// Beenden und Abbau
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sauberes_ende_meldet_ab_und_schliesst_einmal() {
    let state = standard_state();
    let (handle, a) = begruesst(&state).await;

    a.eingang.send(Ok(Frame::Ende)).unwrap();
    beendet(handle).await;

    assert_eq!(state.registry.anzahl(), 0);
    assert_eq!(a.anzahl_geschlossen(), 1);
    assert_eq!(state.metriken.sessions_active.get(), 0.0);
}

#[tokio::test]
async fn test_nach_abbau_keine_zustellung_mehr() {
    let state = standard_state();
    let (ha, a) = begruesst(&state).await;
    let (_hb, mut b) = begruesst(&state).await;

    a.eingang.send(Ok(Frame::Ende)).unwrap();
    beendet(ha).await;

    state.broadcaster.senden(Nachricht::vom_server("after"));
    assert_eq!(b.empfangen().await.body(), "after");
    assert_eq!(state.metriken.deliveries_total.get(), 1);
}

#[tokio::test]
async fn test_beenden_von_aussen() {
    let state = standard_state();
    let (transport, mut gegenseite) = SpeicherTransport::neu();
    let mut session = Session::neu(transport, 8, CancellationToken::new());
    let beendigung = session.beendigung();
    assert_eq!(session.zustand(), SessionZustand::Aktiv);

    let registrierung = state.registry.registrieren(session.handle());
    session.begruessen().await.unwrap();

    let broadcaster = state.broadcaster.clone();
    let task = tokio::spawn(async move { session.ausfuehren(&broadcaster, registrierung).await });
    assert_eq!(gegenseite.empfangen().await, Nachricht::willkommen());

    assert!(beendigung.ausloesen("Test"));
    assert!(!beendigung.ausloesen("Test"), "zweites Ausloesen ist ein No-op");
    beendet(task).await;

    assert_eq!(beendigung.zustand(), SessionZustand::Geschlossen);
    assert_eq!(gegenseite.anzahl_geschlossen(), 1);
    assert_eq!(state.registry.anzahl(), 0);
}

#[tokio::test]
async fn test_shutdown_beendet_alle_sessions() {
    let state = standard_state();
    let (ha, a) = begruesst(&state).await;
    let (hb, b) = begruesst(&state).await;

    state.shutdown.cancel();
    beendet(ha).await;
    beendet(hb).await;

    assert_eq!(state.registry.anzahl(), 0);
    assert_eq!(a.anzahl_geschlossen(), 1);
    assert_eq!(b.anzahl_geschlossen(), 1);
}

// ---------------------------------------------------------------------------
// Fehlerbehandlung
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dekodierfehler_werden_uebersprungen() {
    let state = standard_state();
    let (_handle, mut a) = begruesst(&state).await;

    a.roh_senden("kein json");
    a.roh_senden(r#"{"author":"A"}"#);
    a.roh_senden(r#"{"author":1,"body":"x"}"#);
    let gueltig = Nachricht::neu("A", "gueltig");
    a.senden(&gueltig);

    assert_eq!(a.empfangen().await, gueltig);
    assert_eq!(state.metriken.decode_errors_total.get(), 3);
    assert_eq!(state.registry.anzahl(), 1);
}

#[tokio::test]
async fn test_zu_viele_dekodierfehler_beenden_session() {
    let state = test_state(SignalingConfig {
        max_dekodierfehler: 3,
        ..SignalingConfig::default()
    });
    let (handle, a) = begruesst(&state).await;

    for _ in 0..3 {
        a.roh_senden("{kaputt");
    }
    beendet(handle).await;

    assert_eq!(state.registry.anzahl(), 0);
    assert_eq!(a.anzahl_geschlossen(), 1);
}

#[tokio::test]
async fn test_fehlerzaehler_wird_zurueckgesetzt() {
    let state = test_state(SignalingConfig {
        max_dekodierfehler: 2,
        ..SignalingConfig::default()
    });
    let (_handle, mut a) = begruesst(&state).await;

    a.roh_senden("kaputt");
    a.senden(&Nachricht::neu("A", "eins"));
    a.roh_senden("kaputt");
    a.senden(&Nachricht::neu("A", "zwei"));

    assert_eq!(a.empfangen().await.body(), "eins");
    assert_eq!(a.empfangen().await.body(), "zwei");
    assert_eq!(state.registry.anzahl(), 1);
}

#[tokio::test]
async fn test_ohne_fehlerlimit() {
    let state = test_state(SignalingConfig {
        max_dekodierfehler: 0,
        ..SignalingConfig::default()
    });
    let (_handle, mut a) = begruesst(&state).await;

    for _ in 0..100 {
        a.roh_senden("kaputt");
    }
    a.senden(&Nachricht::neu("A", "noch da"));
    assert_eq!(a.empfangen().await.body(), "noch da");
}

#[tokio::test]
async fn test_transportfehler_beendet_session() {
    let state = standard_state();
    let (handle, a) = begruesst(&state).await;

    a.eingang
        .send(Err(SignalingError::transport("Verbindung zurueckgesetzt")))
        .unwrap();
    beendet(handle).await;

    assert_eq!(state.registry.anzahl(), 0);
    assert_eq!(a.anzahl_geschlossen(), 1);
    assert_eq!(state.metriken.decode_errors_total.get(), 0);
}

#[tokio::test]
async fn test_begruessung_fehlgeschlagen() {
    let state = standard_state();
    let (handle, mut a) = verbinden(
        &state,
        Verhalten {
            fehler_ab: Some(0),
            ..Verhalten::default()
        },
    );
    beendet(handle).await;

    assert_eq!(state.registry.anzahl(), 0);
    assert_eq!(state.metriken.sessions_total.get(), 1);
    assert_eq!(a.anzahl_geschlossen(), 1);
    assert!(a.ausgang.try_recv().is_err(), "nichts darf gesendet worden sein");
}

#[tokio::test]
async fn test_schreibfehler_beendet_auch_lese_schleife() {
    let state = standard_state();
    let (handle, mut a) = verbinden(
        &state,
        Verhalten {
            fehler_ab: Some(1),
            ..Verhalten::default()
        },
    );
    assert_eq!(a.empfangen().await, Nachricht::willkommen());

    // Das Echo scheitert in der Schreib-Schleife, die Lese-Schleife wartet
    // noch auf Frames und muss trotzdem enden
    a.senden(&Nachricht::neu("A", "hi"));
    beendet(handle).await;

    assert_eq!(state.registry.anzahl(), 0);
    assert_eq!(a.anzahl_geschlossen(), 1);
}

#[tokio::test]
async fn test_haengender_client_blockiert_andere_nicht() {
    let state = test_state(SignalingConfig {
        queue_kapazitaet: 2,
        ..SignalingConfig::default()
    });
    let (langsam_handle, mut langsam) = verbinden(
        &state,
        Verhalten {
            haengen_ab: Some(1),
            ..Verhalten::default()
        },
    );
    assert_eq!(langsam.empfangen().await, Nachricht::willkommen());
    let (schnell_handle, mut schnell) = begruesst(&state).await;

    for i in 0..20 {
        state.broadcaster.senden(Nachricht::vom_server(i.to_string()));
        assert_eq!(schnell.empfangen().await.body(), i.to_string());
    }
    assert!(state.metriken.dropped_total.get() > 0);

    // Auch ein haengender Schreibvorgang wird vom Shutdown unterbrochen
    state.shutdown.cancel();
    beendet(langsam_handle).await;
    beendet(schnell_handle).await;
    assert_eq!(langsam.anzahl_geschlossen(), 1);
    assert_eq!(state.registry.anzahl(), 0);
}
