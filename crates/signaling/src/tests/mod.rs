//! Session-Tests mit In-Memory-Transport

mod session_tests;
