//! hr-ask: ask a SQLite database questions in plain English.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod safety;
pub mod server;
