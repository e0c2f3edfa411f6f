//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (hat Vorrang vor der Config-Datei):
//! - `RF_LOG_LEVEL`: Log-Level bzw. EnvFilter-Direktiven, Standard: info
//! - `RF_LOG_FORMAT`: Format (text/json), Standard: text

use tracing_subscriber::{fmt, EnvFilter};

/// Initialisiert das Logging-System.
///
/// Darf pro Prozess nur einmal aufgerufen werden.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("RF_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var("RF_LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
///
/// Erlaubt sind die fuenf Stufen sowie kommagetrennte EnvFilter-Direktiven
/// der Form `ziel=stufe`, also alles was `logging_initialisieren` versteht.
pub fn log_level_gueltig(level: &str) -> bool {
    let direktiven_ok = level
        .split(',')
        .all(|direktive| match direktive.split_once('=') {
            Some((ziel, stufe)) => !ziel.trim().is_empty() && stufe_gueltig(stufe.trim()),
            None => stufe_gueltig(direktive.trim()),
        });
    direktiven_ok && EnvFilter::try_new(level).is_ok()
}

fn stufe_gueltig(stufe: &str) -> bool {
    matches!(stufe, "trace" | "debug" | "info" | "warn" | "error" | "off")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
