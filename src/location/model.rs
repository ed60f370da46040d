//! Location data models.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Display name used when the user skips location or geocoding finds nothing.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Display name used when reverse geocoding fails outright.
pub const LOCATION_OBTAINED: &str = "Location Obtained";

/// A raw position fix from a geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// The user's location with a human-readable name.
///
/// Overwritten on every grant or skip, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    pub name: String,
}

impl Location {
    pub fn from_position(position: Position, name: impl Into<String>) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp: position.timestamp,
            name: name.into(),
        }
    }

    /// Stand-in location recorded when the user skips the location step.
    pub fn unknown() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            timestamp: Utc::now().timestamp_millis(),
            name: UNKNOWN_LOCATION.to_string(),
        }
    }

    /// Whether this is the skip sentinel rather than a real fix.
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_LOCATION && self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Persisted location fragment, stored under `"locationData"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub location: Option<Location>,
    pub radius: u32,
}

/// Reverse geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Place {
    /// "City, State", whichever half exists, or the unknown placeholder.
    pub fn display_name(&self) -> String {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(city), Some(state)) => format!("{city}, {state}"),
            (Some(city), None) => city.to_string(),
            (None, Some(state)) => state.to_string(),
            (None, None) => UNKNOWN_LOCATION.to_string(),
        }
    }
}
