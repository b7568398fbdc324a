//! Error types for hr-ask.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for hr-ask operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database open/connect errors (bad path, locked file, etc.)
    #[error("Database error: {0}")]
    Database(String),

    /// Query execution errors (syntax errors, missing tables, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Completion API errors (auth, rate limits, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV parse/load or SQL script failures during an upload.
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Uploaded file has an extension we do not handle.
    #[error("Unsupported upload: {0}")]
    UnsupportedUpload(String),

    /// Invalid user input (blank question, missing form field, etc.)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Filesystem errors.
    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Creates a database error with the given message.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an ingest error with the given message.
    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    /// Creates an unsupported-upload error with the given message.
    pub fn unsupported_upload(msg: impl Into<String>) -> Self {
        Self::UnsupportedUpload(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Database(_) => "Database Error",
            Self::Query(_) => "SQL Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Ingest(_) => "Ingest Error",
            Self::UnsupportedUpload(_) => "Unsupported File",
            Self::Validation(_) => "Invalid Input",
            Self::Io(_) => "I/O Error",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
