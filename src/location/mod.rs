//! Location capture, naming, and distance.

pub mod distance;
pub mod geocoder;
pub mod model;
pub mod provider;
pub mod service;

pub use distance::calculate_distance;
pub use geocoder::{NominatimGeocoder, ReverseGeocoder};
pub use model::{Location, LocationData, Place, Position, LOCATION_OBTAINED, UNKNOWN_LOCATION};
pub use provider::{GeolocationProvider, PermissionStatus, StaticGeolocation};
pub use service::LocationService;
