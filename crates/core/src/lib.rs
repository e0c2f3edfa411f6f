//! rundfunk-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Rundfunk-Crates gemeinsam genutzt werden: die `Nachricht`,
//! die zwischen Clients ausgetauscht wird, und die `SessionId`.

pub mod error;
pub mod nachricht;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, RundfunkError};
pub use nachricht::{Nachricht, SERVER_AUTOR, WILLKOMMEN_TEXT};
pub use types::SessionId;
