//! Layered error definitions
//!
//! Categorized by source: config / beacon / scan

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Beacon Errors =====
    /// Malformed beacon identifier text
    #[error("invalid beacon id '{text}'")]
    InvalidBeaconId { text: String },

    // ===== Scan Errors =====
    /// Radio adapter unavailable or scan session failure
    #[error("scan error on '{source_name}': {message}")]
    Scan {
        source_name: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid beacon id error
    pub fn invalid_beacon_id(text: impl Into<String>) -> Self {
        Self::InvalidBeaconId { text: text.into() }
    }

    /// Create scan error
    pub fn scan(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
