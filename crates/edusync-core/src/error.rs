//! Core error types for edusync-core.
//!
//! Errors are grouped by the component that raises them. Only configuration
//! and store errors ever cross a public API boundary; channel errors are
//! contained inside the notification dispatcher.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for edusync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Key/value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value; the previous configuration stays active.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Dotted key does not name a configuration field
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Errors raised by a [`crate::storage::ClockStore`].
///
/// The timer engine never propagates these; it degrades to in-memory
/// operation instead.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing storage could not be opened
    #[error("Failed to open store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Write rejected (quota, permissions, locked database)
    #[error("Store write failed: {0}")]
    WriteFailed(String),

    /// Read failed
    #[error("Store read failed: {0}")]
    ReadFailed(String),
}

/// Per-channel delivery errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The user denied (or never granted) permission for this channel
    #[error("permission denied")]
    PermissionDenied,

    /// The host lacks the capability entirely
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The channel is configured off
    #[error("disabled by configuration")]
    Disabled,

    /// Delivery attempted and failed
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Remote notification service failure
    #[error("remote dispatch failed: {0}")]
    Remote(String),
}

impl ChannelError {
    /// Whether this error is a silent skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ChannelError::PermissionDenied | ChannelError::Unsupported(_) | ChannelError::Disabled
        )
    }
}

impl From<reqwest::Error> for ChannelError {
    fn from(err: reqwest::Error) -> Self {
        ChannelError::Remote(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
