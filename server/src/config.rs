//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use rundfunk_observability::logging::{log_format_gueltig, log_level_gueltig};
use rundfunk_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Session- und Queue-Einstellungen
    pub sessions: SessionEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Rundfunk".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer `/ws` und `/broadcast/*`
    pub bind_adresse: String,
    /// HTTP-Port
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// Session-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEinstellungen {
    /// Kapazitaet der Eingangs-Queue pro Session
    pub queue_kapazitaet: usize,
    /// Ungueltige Frames in Folge bis zum Beenden (0 = kein Limit)
    pub max_dekodierfehler: u32,
    /// Maximale gleichzeitige Sessions (0 = kein Limit)
    pub max_clients: usize,
}

impl Default for SessionEinstellungen {
    fn default() -> Self {
        let standard = SignalingConfig::default();
        Self {
            queue_kapazitaet: standard.queue_kapazitaet,
            max_dekodierfehler: standard.max_dekodierfehler,
            max_clients: standard.max_clients,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level ("trace" bis "error") oder EnvFilter-Direktiven
    /// wie "info,rundfunk_signaling=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

/// Herkunft einer geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigQuelle {
    /// Aus der angegebenen TOML-Datei gelesen
    Datei,
    /// Datei fehlt, Standardwerte verwendet
    Standardwerte,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// Fehlt die Datei, wird die Standardkonfiguration mit
    /// `ConfigQuelle::Standardwerte` zurueckgegeben. Das Logging ist zu
    /// diesem Zeitpunkt noch nicht initialisiert, der Aufrufer meldet das.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, ConfigQuelle)> {
        let (config, quelle) = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => (
                Self::aus_toml(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
                ConfigQuelle::Datei,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (Self::default(), ConfigQuelle::Standardwerte)
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.validieren()?;
        Ok((config, quelle))
    }

    /// Parst eine Konfiguration aus einem TOML-String
    pub fn aus_toml(inhalt: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(inhalt)?)
    }

    /// Prueft Werte, die TOML allein nicht ausschliessen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if self.sessions.queue_kapazitaet == 0 {
            anyhow::bail!("sessions.queue_kapazitaet muss groesser als 0 sein");
        }
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Ungueltiges Log-Level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Ungueltiges Log-Format '{}'", self.logging.format);
        }
        self.bind_adresse()?;
        self.observability_bind_adresse()?;
        Ok(())
    }

    /// Gibt die Bind-Adresse fuer `/ws` und `/broadcast/*` zurueck
    pub fn bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        adresse_parsen(&self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        adresse_parsen(&self.netzwerk.bind_adresse, self.observability.port)
    }

    /// Konfiguration fuer den Signaling-Service
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            queue_kapazitaet: self.sessions.queue_kapazitaet,
            max_dekodierfehler: self.sessions.max_dekodierfehler,
            max_clients: self.sessions.max_clients,
        }
    }
}

fn adresse_parsen(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("Ungueltige Bind-Adresse '{host}:{port}': {e}"))
}
