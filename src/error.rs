//! Error types for Connect Local.

use std::time::Duration;

/// Top-level error type for the client core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key-value persistence errors.
///
/// These never reach the UI: loads fall back to defaults and failed writes
/// are logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Authentication provider errors. Surfaced to the caller for retry messaging.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials for {email}")]
    InvalidCredentials { email: String },

    #[error("Registration rejected: {reason}")]
    RegistrationRejected { reason: String },

    #[error("Auth provider {provider} is not available: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Auth request failed: {0}")]
    Request(String),

    #[error("Unexpected auth response: {0}")]
    InvalidResponse(String),
}

/// Location acquisition errors. Surfaced to the caller for retry messaging.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Timed out acquiring location after {0:?}")]
    Timeout(Duration),

    #[error("Geolocation not supported")]
    Unsupported,

    #[error("Geolocation provider failed: {0}")]
    Provider(String),
}

/// Reverse geocoding errors. Downgraded to a placeholder name by the caller.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Geocoding service returned status {0}")]
    Status(u16),

    #[error("Malformed geocoding response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for the client core.
pub type Result<T> = std::result::Result<T, Error>;
