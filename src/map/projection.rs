//! Spherical Web Mercator (EPSG:3857) ↔ geographic (EPSG:4326) transforms
//! and the pixel ↔ coordinate mapping of a map viewport.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Sphere radius used by EPSG:3857, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the projected world width, in meters.
pub const HALF_SIZE: f64 = PI * EARTH_RADIUS;

/// Highest latitude representable in Web Mercator.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Tile edge in pixels; zoom 0 shows the whole world in one tile.
pub const TILE_SIZE: f64 = 256.0;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude.
    pub lon: f64,
    /// Latitude.
    pub lat: f64,
}

impl LonLat {
    /// Creates a position from longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Web Mercator coordinate in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projected {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

/// Screen position relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    /// Pixels from the left edge.
    pub x: f64,
    /// Pixels from the top edge.
    pub y: f64,
}

impl Pixel {
    /// Creates a pixel position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Projects a geographic position. Latitudes beyond
/// [`MAX_LATITUDE`] are clamped.
#[must_use]
pub fn from_lon_lat(position: LonLat) -> Projected {
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Projected {
        x: EARTH_RADIUS * position.lon.to_radians(),
        y: EARTH_RADIUS * (PI * (lat + 90.0) / 360.0).tan().ln(),
    }
}

/// Unprojects a Web Mercator coordinate. Longitudes outside the first
/// world copy are wrapped into [-180, 180].
#[must_use]
pub fn to_lon_lat(coordinate: Projected) -> LonLat {
    let mut lon = 180.0 * coordinate.x / HALF_SIZE;
    if !(-180.0..=180.0).contains(&lon) {
        lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
    }
    let lat = 360.0 * (coordinate.y / EARTH_RADIUS).exp().atan() / PI - 90.0;
    LonLat { lon, lat }
}

/// Viewport onto the projected plane: a center, a resolution and a size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    center: Projected,
    resolution: f64,
    width: f64,
    height: f64,
}

impl MapView {
    /// Creates a view centered on `center` at `zoom`, sized in pixels.
    #[must_use]
    pub fn new(center: LonLat, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center: from_lon_lat(center),
            resolution: resolution_for_zoom(zoom),
            width,
            height,
        }
    }

    /// Projected center.
    #[must_use]
    pub const fn center(&self) -> Projected {
        self.center
    }

    /// Meters per pixel.
    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Projected coordinate under a viewport pixel.
    #[must_use]
    pub fn coordinate_from_pixel(&self, pixel: Pixel) -> Projected {
        Projected {
            x: self.center.x + (pixel.x - self.width / 2.0) * self.resolution,
            y: self.center.y - (pixel.y - self.height / 2.0) * self.resolution,
        }
    }

    /// Viewport pixel of a projected coordinate.
    #[must_use]
    pub fn pixel_from_coordinate(&self, coordinate: Projected) -> Pixel {
        Pixel {
            x: (coordinate.x - self.center.x) / self.resolution + self.width / 2.0,
            y: (self.center.y - coordinate.y) / self.resolution + self.height / 2.0,
        }
    }

    /// Geographic position under a viewport pixel.
    #[must_use]
    pub fn lon_lat_from_pixel(&self, pixel: Pixel) -> LonLat {
        to_lon_lat(self.coordinate_from_pixel(pixel))
    }
}

/// Meters per pixel at `zoom` for 256-pixel tiles.
#[must_use]
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    2.0 * HALF_SIZE / TILE_SIZE / 2_f64.powf(zoom)
}
