// src/error.rs

//! Unified error handling for the generator.
//!
//! Only unexpected failures live here. Outcomes the upstream tells us about
//! (missing item, throttling, unsupported input) are returned as data in the
//! record or response body instead.

use std::fmt;

use thiserror::Error;

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Page or payload did not have the expected shape
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Upstream answered with a status we cannot interpret
    #[error("Upstream {url} answered with status {status}")]
    Upstream { url: String, status: u16 },

    /// A spawned fetch task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Cache backend error
    #[error("Storage error: {0}")]
    Storage(String),
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

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Short machine-readable name of the variant, used in debug payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Toml(_) | Self::TomlSerialize(_) => "toml",
            Self::Url(_) => "url",
            Self::Regex(_) => "regex",
            Self::Selector { .. } => "selector",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::Parse { .. } => "parse",
            Self::Upstream { .. } => "upstream",
            Self::Task(_) => "task",
            Self::Storage(_) => "storage",
        }
    }
}
