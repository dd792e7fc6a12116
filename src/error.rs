//! Error types and handling for Faraday
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::FlowDirection;

/// Result type alias for Faraday operations
pub type Result<T> = std::result::Result<T, FaradayError>;

/// Main error type for Faraday
#[derive(Debug, Error)]
pub enum FaradayError {
    /// Malformed or logically inverted period bounds, rejected at insertion
    #[error("Invalid period: {message}")]
    InvalidPeriod { message: String },

    /// Deletion or update referencing an unknown period
    #[error("Period not found: {message}")]
    NotFound { message: String },

    /// No period covers the queried timestamp (gap, or before the earliest period)
    #[error("No {direction} tariff period covers {timestamp}")]
    NoCoverage {
        timestamp: DateTime<Utc>,
        direction: FlowDirection,
    },

    /// A period is active but its rate schedule has no entry for the timestamp
    #[error("No {direction} rate found for {timestamp} (rate schedule gap)")]
    RateNotFound {
        timestamp: DateTime<Utc>,
        direction: FlowDirection,
    },

    /// Transient failure from the external rate-fetch collaborator
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl FaradayError {
    /// Create a new invalid-period error
    pub fn invalid_period<S: Into<String>>(message: S) -> Self {
        FaradayError::InvalidPeriod {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        FaradayError::NotFound {
            message: message.into(),
        }
    }

    /// Create a new no-coverage error for a point query
    pub fn no_coverage(timestamp: DateTime<Utc>, direction: FlowDirection) -> Self {
        FaradayError::NoCoverage {
            timestamp,
            direction,
        }
    }

    /// Create a new rate-not-found error for a point query
    pub fn rate_not_found(timestamp: DateTime<Utc>, direction: FlowDirection) -> Self {
        FaradayError::RateNotFound {
            timestamp,
            direction,
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        FaradayError::Fetch {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        FaradayError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        FaradayError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        FaradayError::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for FaradayError {
    fn from(err: std::io::Error) -> Self {
        FaradayError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for FaradayError {
    fn from(err: serde_yaml::Error) -> Self {
        FaradayError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FaradayError {
    fn from(err: serde_json::Error) -> Self {
        FaradayError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FaradayError {
    fn from(err: reqwest::Error) -> Self {
        FaradayError::fetch(err.to_string())
    }
}

impl From<chrono::ParseError> for FaradayError {
    fn from(err: chrono::ParseError) -> Self {
        FaradayError::validation("datetime", err.to_string().as_str())
    }
}
