//! Address search through a Nominatim-compatible geocoder.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::MapError;

/// First match returned for an address query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Full formatted address.
    pub display_name: String,
}

/// One entry of a Nominatim `search` response. Coordinates arrive as
/// strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl TryFrom<NominatimPlace> for GeocodeResult {
    type Error = MapError;

    fn try_from(place: NominatimPlace) -> Result<Self, Self::Error> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|e| MapError::Geocoding(format!("bad coordinate {raw:?}: {e}")))
        };
        Ok(Self {
            lat: parse(&place.lat)?,
            lon: parse(&place.lon)?,
            display_name: place.display_name,
        })
    }
}

/// HTTP client for the geocoder.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
}

impl Geocoder {
    /// Builds a client for `base_url` sending `user_agent` on every call.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Internal`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, MapError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| MapError::Internal(format!("building geocoder client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves an address to its best match.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRequest`] for a blank query,
    /// [`MapError::AddressNotFound`] when nothing matches, or
    /// [`MapError::Geocoding`] when the upstream call fails.
    pub async fn search(&self, query: &str) -> Result<GeocodeResult, MapError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MapError::InvalidRequest("query must not be empty".to_string()));
        }

        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[("q", query), ("format", "json"), ("limit", "1")],
        )
        .map_err(|e| MapError::Internal(format!("geocoder url: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MapError::Geocoding(e.to_string()))?;
        if !response.status().is_success() {
            return Err(MapError::Geocoding(format!(
                "upstream returned {}",
                response.status()
            )));
        }
        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| MapError::Geocoding(format!("decoding response: {e}")))?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| MapError::AddressNotFound(query.to_string()))?;
        let result = GeocodeResult::try_from(place)?;
        tracing::debug!(query, lat = result.lat, lon = result.lon, "address resolved");
        Ok(result)
    }
}
