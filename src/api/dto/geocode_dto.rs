//! Geocoding query and response.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::geocoding::GeocodeResult;

/// Query parameters for `GET /api/geocode`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeParams {
    /// Free-form address.
    #[serde(default)]
    pub q: String,
}

/// Best match for an address.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Full formatted address.
    pub display_name: String,
}

impl From<GeocodeResult> for GeocodeResponse {
    fn from(result: GeocodeResult) -> Self {
        Self {
            lat: result.lat,
            lon: result.lon,
            display_name: result.display_name,
        }
    }
}
