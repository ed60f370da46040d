//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default travel radius in miles.
pub const DEFAULT_TRAVEL_RADIUS_MILES: u32 = 10;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the local key-value database.
    pub db_path: PathBuf,
    /// Base URL of the PocketBase auth server.
    pub pocketbase_url: String,
    /// Base URL of the Nominatim reverse geocoding service.
    pub geocoder_url: String,
    /// User-Agent sent to the geocoding service.
    pub user_agent: String,
    /// Travel radius used until the user picks one.
    pub default_radius_miles: u32,
    /// How long to wait for a position fix before failing.
    pub location_timeout: Duration,
    /// Lower bound of the assistant reply delay.
    pub reply_delay_min: Duration,
    /// Upper bound of the assistant reply delay.
    pub reply_delay_max: Duration,
    /// Seed for the assistant's random choices. `None` seeds from entropy.
    pub reply_seed: Option<u64>,
    /// Fixed coordinates served by the static geolocation provider, if set.
    pub static_position: Option<(f64, f64)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/connect-local.db"),
            pocketbase_url: "http://127.0.0.1:8090".to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "ConnectLocal/1.0".to_string(),
            default_radius_miles: DEFAULT_TRAVEL_RADIUS_MILES,
            location_timeout: Duration::from_secs(10),
            reply_delay_min: Duration::from_millis(1000),
            reply_delay_max: Duration::from_millis(3000),
            reply_seed: None,
            static_position: None,
        }
    }
}

impl AppConfig {
    /// Build a config from `CONNECT_LOCAL_*` environment variables.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("CONNECT_LOCAL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let pocketbase_url =
            std::env::var("CONNECT_LOCAL_POCKETBASE_URL").unwrap_or(defaults.pocketbase_url);

        let geocoder_url =
            std::env::var("CONNECT_LOCAL_GEOCODER_URL").unwrap_or(defaults.geocoder_url);

        let default_radius_miles: u32 = std::env::var("CONNECT_LOCAL_RADIUS_MILES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.default_radius_miles);

        let location_timeout = std::env::var("CONNECT_LOCAL_LOCATION_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.location_timeout);

        let reply_delay_min = std::env::var("CONNECT_LOCAL_REPLY_DELAY_MIN_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.reply_delay_min);

        let reply_delay_max = std::env::var("CONNECT_LOCAL_REPLY_DELAY_MAX_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.reply_delay_max)
            .max(reply_delay_min);

        let reply_seed = std::env::var("CONNECT_LOCAL_REPLY_SEED")
            .ok()
            .and_then(|s| s.parse().ok());

        let static_position = std::env::var("CONNECT_LOCAL_STATIC_POSITION")
            .ok()
            .and_then(|s| parse_position(&s));

        Self {
            db_path,
            pocketbase_url,
            geocoder_url,
            user_agent: defaults.user_agent,
            default_radius_miles,
            location_timeout,
            reply_delay_min,
            reply_delay_max,
            reply_seed,
            static_position,
        }
    }

    /// Reject combinations the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_radius_miles == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CONNECT_LOCAL_RADIUS_MILES".to_string(),
                message: "radius must be at least 1 mile".to_string(),
            });
        }
        if self.reply_delay_min > self.reply_delay_max {
            return Err(ConfigError::InvalidValue {
                key: "CONNECT_LOCAL_REPLY_DELAY_MIN_MS".to_string(),
                message: format!(
                    "minimum delay {:?} exceeds maximum {:?}",
                    self.reply_delay_min, self.reply_delay_max
                ),
            });
        }
        Ok(())
    }
}

/// Parse a `"lat,lon"` pair.
fn parse_position(s: &str) -> Option<(f64, f64)> {
    let (lat, lon) = s.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some((lat, lon))
}
