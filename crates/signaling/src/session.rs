//! Session – Verwaltet eine einzelne Client-Verbindung
//!
//! Jede Verbindung bekommt eine `Session` mit einer begrenzten
//! Eingangs-Queue und einem einmaligen Beenden-Signal. `ausfuehren` startet
//! zwei Schleifen:
//!
//! ```text
//!              Broadcaster
//!                  |  try_send
//!                  v
//!   Eingangs-Queue (Kapazitaet C)
//!                  |
//!   Schreib-Schleife (eigener Task) ---> Verbindung
//!
//!   Verbindung ---> Lese-Schleife (aktueller Task) ---> Broadcaster
//! ```
//!
//! ## State Machine
//! ```text
//! Aktiv --(erster Beenden-Ausloeser, egal welche Schleife)--> Beendend
//! Beendend --(beide Schleifen beendet, Ressourcen freigegeben)--> Geschlossen
//! ```
//!
//! Das Beenden-Signal ist ein `CancellationToken`: es weckt beide Schleifen,
//! braucht keine Antwort und mehrfaches Ausloesen ist harmlos. Der Token ist
//! ein Kind des Server-Shutdown-Tokens, ein Shutdown beendet also alle
//! Sessions.

use parking_lot::Mutex;
use rundfunk_core::{Nachricht, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::broadcast::Broadcaster;
use crate::error::{SignalingError, SignalingResult};
use crate::registry::Registrierung;
use crate::transport::{Frame, FrameLeser, FrameSchreiber, Transport};

/// Standard-Kapazitaet der Eingangs-Queue pro Session
pub const STANDARD_QUEUE_KAPAZITAET: usize = 100;

/// Standard-Limit fuer aufeinanderfolgende Dekodierfehler
pub const STANDARD_MAX_DEKODIERFEHLER: u32 = 16;

// ---------------------------------------------------------------------------
// Sessionzustand
// ---------------------------------------------------------------------------

/// Lebenszyklus einer Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionZustand {
    /// Beide Schleifen laufen (oder sind noch nicht gestartet)
    Aktiv,
    /// Beenden wurde ausgeloest, Schleifen laufen aus
    Beendend,
    /// Aus der Registry entfernt, Verbindung geschlossen
    Geschlossen,
}

/// Gemeinsames Beenden-Signal beider Schleifen
#[derive(Clone)]
pub struct Beendigung {
    id: SessionId,
    token: CancellationToken,
    zustand: Arc<Mutex<SessionZustand>>,
}

impl Beendigung {
    fn neu(id: SessionId, token: CancellationToken) -> Self {
        Self {
            id,
            token,
            zustand: Arc::new(Mutex::new(SessionZustand::Aktiv)),
        }
    }

    /// Loest das Beenden aus
    ///
    /// Nur der erste Aufruf wechselt nach `Beendend`, weitere Aufrufe sind
    /// No-ops. Gibt `true` zurueck wenn dieser Aufruf der erste war.
    pub fn ausloesen(&self, grund: &str) -> bool {
        let erster = {
            let mut zustand = self.zustand.lock();
            if *zustand == SessionZustand::Aktiv {
                *zustand = SessionZustand::Beendend;
                true
            } else {
                false
            }
        };
        if erster {
            tracing::debug!(session = %self.id, grund, "Session wird beendet");
        }
        self.token.cancel();
        erster
    }

    /// Wartet bis das Beenden ausgeloest wird
    pub async fn abgewartet(&self) {
        self.token.cancelled().await;
    }

    pub fn zustand(&self) -> SessionZustand {
        *self.zustand.lock()
    }

    fn abschliessen(&self) {
        *self.zustand.lock() = SessionZustand::Geschlossen;
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Ergebnis eines Zustellversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    /// In die Queue eingereiht
    Eingereiht,
    /// Queue voll, Nachricht verworfen
    Verworfen,
    /// Queue geschlossen (Session baut ab)
    Geschlossen,
}

/// Handle auf die Eingangs-Queue einer Session
///
/// Das ist der Teil einer Session, den die Registry haelt.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::Sender<Nachricht>,
}

impl SessionHandle {
    /// Erstellt ein Handle samt Queue mit `kapazitaet` Plaetzen
    pub fn mit_queue(id: SessionId, kapazitaet: usize) -> (Self, mpsc::Receiver<Nachricht>) {
        let (tx, rx) = mpsc::channel(kapazitaet.max(1));
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Reiht eine Nachricht nicht-blockierend ein
    pub fn einreihen(&self, nachricht: Nachricht) -> Zustellung {
        match self.tx.try_send(nachricht) {
            Ok(()) => Zustellung::Eingereiht,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session = %self.id, "Eingangs-Queue voll – Nachricht verworfen");
                Zustellung::Verworfen
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(session = %self.id, "Eingangs-Queue geschlossen (Session baut ab)");
                Zustellung::Geschlossen
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Eine Client-Session mit exklusiv besessener Verbindung
pub struct Session<T: Transport> {
    id: SessionId,
    leser: T::Leser,
    schreiber: T::Schreiber,
    eingang: mpsc::Receiver<Nachricht>,
    handle: SessionHandle,
    beendigung: Beendigung,
    max_dekodierfehler: u32,
}

impl<T: Transport> Session<T> {
    /// Erstellt eine neue Session
    ///
    /// Legt Queue und Beenden-Signal an, fuehrt aber noch kein I/O aus.
    pub fn neu(transport: T, kapazitaet: usize, beenden: CancellationToken) -> Self {
        let id = SessionId::neu();
        let (leser, schreiber) = transport.aufteilen();
        let (handle, eingang) = SessionHandle::mit_queue(id, kapazitaet);
        Self {
            id,
            leser,
            schreiber,
            eingang,
            handle,
            beendigung: Beendigung::neu(id, beenden),
            max_dekodierfehler: STANDARD_MAX_DEKODIERFEHLER,
        }
    }

    /// Setzt das Limit fuer aufeinanderfolgende Dekodierfehler (0 = kein Limit)
    pub fn mit_max_dekodierfehler(mut self, max: u32) -> Self {
        self.max_dekodierfehler = max;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Handle fuer die Registry
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Beenden-Signal, z.B. um die Session von aussen zu beenden
    pub fn beendigung(&self) -> Beendigung {
        self.beendigung.clone()
    }

    pub fn zustand(&self) -> SessionZustand {
        self.beendigung.zustand()
    }

    /// Sendet eine Nachricht direkt auf die Verbindung, am Broadcaster vorbei
    pub async fn direkt_senden(&mut self, nachricht: &Nachricht) -> SignalingResult<()> {
        let json = nachricht.zu_json()?;
        self.schreiber.schreiben(json).await
    }

    /// Sendet die Begruessung `{"author":"Server","body":"Welcome!"}`
    ///
    /// Muss vor `ausfuehren` aufgerufen werden, damit die Begruessung das
    /// erste Frame auf der Verbindung ist. Ein Beenden waehrend des Sendens
    /// ergibt `SignalingError::VerbindungGetrennt`.
    pub async fn begruessen(&mut self) -> SignalingResult<()> {
        let beendigung = self.beendigung.clone();
        let willkommen = Nachricht::willkommen();
        tokio::select! {
            biased;
            _ = beendigung.abgewartet() => Err(SignalingError::VerbindungGetrennt),
            ergebnis = self.direkt_senden(&willkommen) => ergebnis,
        }
    }

    /// Startet beide Schleifen und wartet bis beide beendet sind
    ///
    /// Danach ist die Session aus der Registry entfernt und die Verbindung
    /// genau einmal geschlossen.
    pub async fn ausfuehren(self, broadcaster: &Broadcaster, registrierung: Registrierung) {
        let Session {
            id,
            mut leser,
            schreiber,
            eingang,
            beendigung,
            max_dekodierfehler,
            ..
        } = self;

        tracing::debug!(session = %id, "Session-Schleifen starten");

        let schreib_task = tokio::spawn(schreib_schleife(
            id,
            schreiber,
            eingang,
            beendigung.clone(),
        ));

        lese_schleife(
            id,
            &mut leser,
            broadcaster,
            &beendigung,
            max_dekodierfehler,
        )
        .await;
        beendigung.ausloesen("Lese-Schleife beendet");

        match schreib_task.await {
            Ok((schreiber, eingang)) => {
                abbauen(id, schreiber, eingang, registrierung, &beendigung).await;
            }
            Err(e) => {
                // Schreib-Haelfte ist mit dem Task verloren, Drop gibt sie frei
                tracing::error!(session = %id, fehler = %e, "Schreib-Task abgebrochen");
                drop(registrierung);
                beendigung.abschliessen();
            }
        }
    }

    /// Baut eine Session ab, deren Schleifen nie gestartet wurden
    pub async fn abbrechen(self, registrierung: Registrierung) {
        self.beendigung.ausloesen("Session abgebrochen");
        abbauen(
            self.id,
            self.schreiber,
            self.eingang,
            registrierung,
            &self.beendigung,
        )
        .await;
    }
}

/// Einziger Ort, an dem eine Session freigegeben wird
///
/// Reihenfolge: erst aus der Registry entfernen, dann Verbindung schliessen
/// und Queue verwerfen.
async fn abbauen<S: FrameSchreiber>(
    id: SessionId,
    mut schreiber: S,
    eingang: mpsc::Receiver<Nachricht>,
    registrierung: Registrierung,
    beendigung: &Beendigung,
) {
    drop(registrierung);

    if let Err(e) = schreiber.schliessen().await {
        tracing::debug!(session = %id, fehler = %e, "Schliessen der Verbindung fehlgeschlagen");
    }
    drop(eingang);

    beendigung.abschliessen();
    tracing::info!(session = %id, "Session geschlossen");
}

/// Leert die Eingangs-Queue auf die Verbindung
///
/// Gibt Schreiber und Queue zurueck, damit der Abbau sie freigeben kann.
async fn schreib_schleife<S: FrameSchreiber>(
    id: SessionId,
    mut schreiber: S,
    mut eingang: mpsc::Receiver<Nachricht>,
    beendigung: Beendigung,
) -> (S, mpsc::Receiver<Nachricht>) {
    loop {
        let nachricht = tokio::select! {
            biased;

            _ = beendigung.abgewartet() => {
                beendigung.ausloesen("Beenden-Signal in Schreib-Schleife");
                break;
            }

            nachricht = eingang.recv() => match nachricht {
                Some(n) => n,
                None => {
                    beendigung.ausloesen("Eingangs-Queue geschlossen");
                    break;
                }
            },
        };

        let json = match nachricht.zu_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(session = %id, fehler = %e, "Nachricht nicht serialisierbar");
                continue;
            }
        };

        tracing::trace!(session = %id, nachricht = %nachricht, "Senden");

        // Auch ein haengender Schreibvorgang muss das Beenden beobachten
        let ergebnis = tokio::select! {
            biased;
            _ = beendigung.abgewartet() => break,
            ergebnis = schreiber.schreiben(json) => ergebnis,
        };

        if let Err(e) = ergebnis {
            tracing::warn!(session = %id, fehler = %e, "Senden fehlgeschlagen");
            beendigung.ausloesen("Senden fehlgeschlagen");
            break;
        }
    }

    (schreiber, eingang)
}

/// Liest Nachrichten von der Verbindung und gibt sie an den Broadcaster
///
/// Dekodierfehler werden uebersprungen, ab `max_dekodierfehler` Fehlern in
/// Folge wird die Session beendet. Transportfehler beenden sofort.
async fn lese_schleife<L: FrameLeser>(
    id: SessionId,
    leser: &mut L,
    broadcaster: &Broadcaster,
    beendigung: &Beendigung,
    max_dekodierfehler: u32,
) {
    let mut fehler_in_folge: u32 = 0;

    loop {
        let gelesen = tokio::select! {
            biased;
            _ = beendigung.abgewartet() => {
                tracing::debug!(session = %id, "Beenden-Signal in Lese-Schleife");
                return;
            }
            gelesen = leser.lesen() => gelesen,
        };

        let fehler = match gelesen {
            Ok(Frame::Text(text)) => match Nachricht::aus_json(&text) {
                Ok(nachricht) => {
                    fehler_in_folge = 0;
                    tracing::trace!(session = %id, nachricht = %nachricht, "Empfangen");
                    broadcaster.senden(nachricht);
                    continue;
                }
                Err(e) => e.into(),
            },
            Ok(Frame::Ende) => {
                tracing::info!(session = %id, "Verbindung vom Client getrennt");
                beendigung.ausloesen("Client hat Verbindung beendet");
                return;
            }
            Err(e) => e,
        };

        if !fehler.ist_frame_fehler() {
            tracing::warn!(session = %id, fehler = %fehler, "Lesefehler");
            beendigung.ausloesen("Lesefehler");
            return;
        }

        fehler_in_folge += 1;
        if let Some(m) = broadcaster.metriken() {
            m.decode_errors_total.inc();
        }
        tracing::warn!(
            session = %id,
            fehler = %fehler,
            fehler_in_folge,
            "Frame uebersprungen"
        );

        if max_dekodierfehler > 0 && fehler_in_folge >= max_dekodierfehler {
            tracing::warn!(session = %id, "Zu viele ungueltige Frames in Folge");
            beendigung.ausloesen("Zu viele Dekodierfehler");
            return;
        }
    }
}
