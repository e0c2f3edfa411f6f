//! Prometheus-kompatible Metriken fuer Rundfunk
//!
//! Registrierte Metriken:
//! - `rundfunk_sessions_active` – Gauge: Aktuell registrierte Sessions
//! - `rundfunk_sessions_total` – Counter: Angenommene Verbindungen seit Start
//! - `rundfunk_broadcasts_total` – Counter: Broadcast-Aufrufe
//! - `rundfunk_deliveries_total` – Counter: Erfolgreich eingereihte Nachrichten
//! - `rundfunk_dropped_total` – Counter: Wegen voller Queue verworfene Nachrichten
//! - `rundfunk_decode_errors_total` – Counter: Nicht dekodierbare Frames
//! - `rundfunk_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `rundfunk_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Rundfunk-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Kollektoren.
#[derive(Clone)]
pub struct RundfunkMetrics {
    pub registry: Arc<Registry>,

    // Session-Metriken
    pub sessions_active: Gauge,
    pub sessions_total: IntCounter,

    // Broadcast-Metriken
    pub broadcasts_total: IntCounter,
    pub deliveries_total: IntCounter,
    pub dropped_total: IntCounter,
    pub decode_errors_total: IntCounter,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl RundfunkMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    ///
    /// Jede Instanz hat ihre eigene Registry, mehrere Server im selben
    /// Prozess (z.B. in Tests) kommen sich nicht in die Quere.
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Session-Metriken ---
        let sessions_active = Gauge::with_opts(Opts::new(
            "rundfunk_sessions_active",
            "Anzahl aktuell registrierter Sessions",
        ))?;
        registry.register(Box::new(sessions_active.clone()))?;

        let sessions_total = IntCounter::with_opts(Opts::new(
            "rundfunk_sessions_total",
            "Gesamtanzahl angenommener Verbindungen",
        ))?;
        registry.register(Box::new(sessions_total.clone()))?;

        // --- Broadcast-Metriken ---
        let broadcasts_total = IntCounter::with_opts(Opts::new(
            "rundfunk_broadcasts_total",
            "Gesamtanzahl Broadcast-Aufrufe",
        ))?;
        registry.register(Box::new(broadcasts_total.clone()))?;

        let deliveries_total = IntCounter::with_opts(Opts::new(
            "rundfunk_deliveries_total",
            "In Session-Queues eingereihte Nachrichten",
        ))?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let dropped_total = IntCounter::with_opts(Opts::new(
            "rundfunk_dropped_total",
            "Wegen voller Session-Queue verworfene Nachrichten",
        ))?;
        registry.register(Box::new(dropped_total.clone()))?;

        let decode_errors_total = IntCounter::with_opts(Opts::new(
            "rundfunk_decode_errors_total",
            "Nicht dekodierbare Frames von Clients",
        ))?;
        registry.register(Box::new(decode_errors_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("rundfunk_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "rundfunk_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            sessions_active,
            sessions_total,
            broadcasts_total,
            deliveries_total,
            dropped_total,
            decode_errors_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RundfunkMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<RundfunkMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
