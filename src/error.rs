// src/error.rs

//! Unified error handling for the gallery batch job.

use std::fmt;

use thiserror::Error;

/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed at the transport level
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source page returned a non-success status
    #[error("fetch returned status code = {status} on path: {path:?}")]
    Fetch { path: String, status: u16 },

    /// A source page could not be parsed into resource candidates
    #[error("parse error for {path:?}: {message}")]
    Parse { path: String, message: String },

    /// A record could not be persisted
    #[error("persistence error for {identifier:?}: {message}")]
    Persist { identifier: String, message: String },

    /// Every formatting tier was exhausted for one record
    #[error("delivery failed for resource {identifier:?} (store key {store_key}): {message}")]
    Delivery {
        identifier: String,
        store_key: i64,
        message: String,
    },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error for a source path.
    pub fn fetch(path: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            path: path.into(),
            status,
        }
    }

    /// Create a parse error for a source path.
    pub fn parse(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error for a resource identifier.
    pub fn persist(identifier: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persist {
            identifier: identifier.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error for a resource.
    pub fn delivery(
        identifier: impl Into<String>,
        store_key: i64,
        message: impl fmt::Display,
    ) -> Self {
        Self::Delivery {
            identifier: identifier.into(),
            store_key,
            message: message.to_string(),
        }
    }
}
