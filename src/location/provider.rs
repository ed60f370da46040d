//! Geolocation provider abstraction.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::LocationError;

use super::model::Position;

/// Outcome of a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Source of position fixes.
///
/// Native providers gate `current_position` behind `request_permission`.
/// Fallback providers (the browser-style API) prompt implicitly and are
/// called without the explicit permission step.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Ask the platform for location access.
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;

    /// Obtain a fresh fix. Callers bound this with a timeout.
    async fn current_position(&self) -> Result<Position, LocationError>;
}

/// Serves a fixed coordinate pair. Used by the CLI and in tests.
pub struct StaticGeolocation {
    latitude: f64,
    longitude: f64,
    permission: PermissionStatus,
}

impl StaticGeolocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            permission: PermissionStatus::Granted,
        }
    }

    /// A provider whose permission prompt is always refused.
    pub fn denied() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            permission: PermissionStatus::Denied,
        }
    }
}

#[async_trait]
impl GeolocationProvider for StaticGeolocation {
    fn name(&self) -> &str {
        "static"
    }

    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(self.permission)
    }

    async fn current_position(&self) -> Result<Position, LocationError> {
        if self.permission == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }
        Ok(Position {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}
