//! Reverse geocoding via OpenStreetMap Nominatim.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::GeocodeError;

use super::model::Place;

/// Turns coordinates into a city/state pair.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
}

impl From<NominatimAddress> for Place {
    fn from(address: NominatimAddress) -> Self {
        Place {
            city: address
                .city
                .or(address.town)
                .or(address.village)
                .or(address.county),
            state: address.state,
        }
    }
}

impl TryFrom<NominatimResponse> for Place {
    type Error = GeocodeError;

    /// Nominatim answers unresolvable coordinates with an `error` field and
    /// no `address`.
    fn try_from(body: NominatimResponse) -> Result<Self, Self::Error> {
        body.address
            .map(Place::from)
            .ok_or_else(|| GeocodeError::InvalidResponse("response has no address".into()))
    }
}

/// Nominatim `/reverse` client.
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            client: reqwest::Client::new(),
        }
    }

    fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        let resp = self
            .client
            .get(self.reverse_url())
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "json".to_string()),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Status(resp.status().as_u16()));
        }

        let body: NominatimResponse = resp
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let place = Place::try_from(body)?;
        debug!(?place, latitude, longitude, "Reverse geocoded");
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Place, GeocodeError> {
        let resp: NominatimResponse = serde_json::from_str(json).unwrap();
        Place::try_from(resp)
    }

    #[test]
    fn prefers_city_then_town_village_county() {
        assert_eq!(
            parse(r#"{"address":{"city":"Austin","town":"X","state":"Texas"}}"#).unwrap(),
            Place {
                city: Some("Austin".into()),
                state: Some("Texas".into())
            }
        );
        assert_eq!(
            parse(r#"{"address":{"village":"Smallville","county":"Lowell"}}"#)
                .unwrap()
                .city,
            Some("Smallville".into())
        );
        assert_eq!(
            parse(r#"{"address":{"county":"Travis County"}}"#).unwrap().city,
            Some("Travis County".into())
        );
    }

    #[test]
    fn missing_address_is_an_invalid_response() {
        let err = parse(r#"{"error":"Unable to geocode"}"#).unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidResponse(_)));
    }

    #[test]
    fn empty_address_yields_empty_place() {
        let place = parse(r#"{"address":{}}"#).unwrap();
        assert_eq!(place, Place::default());
        assert_eq!(place.display_name(), "Unknown Location");
    }

    #[test]
    fn base_url_is_normalized() {
        let geocoder = NominatimGeocoder::new("https://nominatim.example.org/", "ConnectLocal/1.0");
        assert_eq!(geocoder.reverse_url(), "https://nominatim.example.org/reverse");
    }
}
