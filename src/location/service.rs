//! LocationService: permission, position fix, naming, and travel radius.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::LocationError;
use crate::store::{self, KeyValueStore, keys};

use super::geocoder::ReverseGeocoder;
use super::model::{LOCATION_OBTAINED, Location, LocationData, Position};
use super::provider::{GeolocationProvider, PermissionStatus};

/// Resolves and remembers the user's location.
pub struct LocationService {
    store: Arc<dyn KeyValueStore>,
    native: Option<Arc<dyn GeolocationProvider>>,
    fallback: Option<Arc<dyn GeolocationProvider>>,
    geocoder: Arc<dyn ReverseGeocoder>,
    timeout: Duration,
    data: RwLock<LocationData>,
    persist_lock: Mutex<()>,
}

impl LocationService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        geocoder: Arc<dyn ReverseGeocoder>,
        default_radius: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            native: None,
            fallback: None,
            geocoder,
            timeout,
            data: RwLock::new(LocationData {
                location: None,
                radius: default_radius,
            }),
            persist_lock: Mutex::new(()),
        }
    }

    /// Use a native provider that requires an explicit permission grant.
    pub fn with_native(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.native = Some(provider);
        self
    }

    /// Use a provider without a permission step when no native one exists.
    pub fn with_fallback(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    /// Restore the saved location and radius. Returns whether anything was stored.
    pub async fn load(&self) -> bool {
        match store::load_json::<LocationData>(self.store.as_ref(), keys::LOCATION_DATA).await {
            Some(saved) => {
                info!(
                    has_location = saved.location.is_some(),
                    radius = saved.radius,
                    "Loaded saved location data"
                );
                *self.data.write().await = saved;
                true
            }
            None => false,
        }
    }

    pub async fn current_location(&self) -> Option<Location> {
        self.data.read().await.location.clone()
    }

    pub async fn has_location(&self) -> bool {
        self.data.read().await.location.is_some()
    }

    pub async fn travel_radius(&self) -> u32 {
        self.data.read().await.radius
    }

    /// Acquire a fix, name it, and store it as the current location.
    ///
    /// Permission denial, timeout, and missing platform support are returned
    /// to the caller. Geocoding failures are not: they fall back to a
    /// placeholder name.
    pub async fn request_location(&self) -> Result<Location, LocationError> {
        let position = self.acquire_position().await?;
        info!(
            latitude = position.latitude,
            longitude = position.longitude,
            "Location obtained"
        );

        let name = self.location_name(position.latitude, position.longitude).await;
        let location = Location::from_position(position, name);

        self.data.write().await.location = Some(location.clone());
        self.persist().await;
        Ok(location)
    }

    /// Record the "Unknown Location" sentinel in place of a real fix.
    pub async fn skip(&self) -> Location {
        let location = Location::unknown();
        self.data.write().await.location = Some(location.clone());
        info!("Location skipped, using placeholder");
        self.persist().await;
        location
    }

    pub async fn set_travel_radius(&self, radius: u32) {
        self.data.write().await.radius = radius;
        info!(radius, "Travel radius set");
        self.persist().await;
    }

    /// Human-readable name for a coordinate pair. Never fails.
    pub async fn location_name(&self, latitude: f64, longitude: f64) -> String {
        match self.geocoder.reverse_geocode(latitude, longitude).await {
            Ok(place) => place.display_name(),
            Err(e) => {
                warn!("Geocoding error: {}", e);
                LOCATION_OBTAINED.to_string()
            }
        }
    }

    async fn acquire_position(&self) -> Result<Position, LocationError> {
        if let Some(native) = &self.native {
            let permission = native.request_permission().await?;
            info!(provider = native.name(), ?permission, "Permission status");
            if permission != PermissionStatus::Granted {
                return Err(LocationError::PermissionDenied);
            }
            return self.with_timeout(native.as_ref()).await;
        }

        match &self.fallback {
            Some(fallback) => self.with_timeout(fallback.as_ref()).await,
            None => Err(LocationError::Unsupported),
        }
    }

    async fn with_timeout(&self, provider: &dyn GeolocationProvider) -> Result<Position, LocationError> {
        match tokio::time::timeout(self.timeout, provider.current_position()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(provider = provider.name(), timeout = ?self.timeout, "Location request timed out");
                Err(LocationError::Timeout(self.timeout))
            }
        }
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.data.read().await.clone();
        store::persist_json(self.store.as_ref(), keys::LOCATION_DATA, &snapshot).await;
    }
}
