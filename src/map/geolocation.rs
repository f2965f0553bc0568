//! Continuous device position watch.
//!
//! Mirrors the browser Geolocation API: a watch is started once and then
//! receives a stream of positions and errors. An error never stops the
//! watch and never discards the last good position.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::projection::LonLat;
use super::style::UserLocation;

/// Options passed when starting a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Prefer GPS over coarse sources.
    pub enable_high_accuracy: bool,
    /// How long a single fix may take.
    pub timeout: Duration,
    /// Maximum age of a cached fix; zero forces a fresh one.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Failure reported by the position source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    /// User or platform refused access.
    #[error("location permission denied")]
    PermissionDenied,
    /// No fix could be obtained.
    #[error("location unavailable")]
    PositionUnavailable,
    /// No fix within the timeout.
    #[error("location request timed out")]
    Timeout,
    /// The platform has no geolocation at all.
    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeolocationError {
    /// Maps a W3C `GeolocationPositionError.code`. Unknown codes count as
    /// an unavailable position.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }
}

/// One fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    /// When the fix was taken.
    pub timestamp: DateTime<Utc>,
}

/// State of a running watch.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionWatch {
    options: WatchOptions,
    supported: bool,
    loading: bool,
    position: Option<Position>,
    error: Option<GeolocationError>,
}

impl PositionWatch {
    /// Starts a watch. When the platform lacks geolocation the watch is
    /// born failed and never loads.
    #[must_use]
    pub fn start(supported: bool, options: WatchOptions) -> Self {
        Self {
            options,
            supported,
            loading: supported,
            position: None,
            error: (!supported).then_some(GeolocationError::Unsupported),
        }
    }

    /// Options the watch was started with.
    #[must_use]
    pub const fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Whether the platform has geolocation.
    #[must_use]
    pub const fn supported(&self) -> bool {
        self.supported
    }

    /// True until the first fix or error arrives.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// Latest fix.
    #[must_use]
    pub const fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Latest error, cleared by the next fix.
    #[must_use]
    pub const fn error(&self) -> Option<GeolocationError> {
        self.error
    }

    /// Records a fix.
    pub fn on_position(&mut self, position: Position) {
        self.position = Some(position);
        self.error = None;
        self.loading = false;
    }

    /// Records an error; the last fix is kept.
    pub fn on_error(&mut self, error: GeolocationError) {
        self.error = Some(error);
        self.loading = false;
    }

    /// The latest fix as something the map can draw.
    #[must_use]
    pub fn user_location(&self) -> Option<UserLocation> {
        self.position.map(|p| UserLocation {
            position: LonLat::new(p.longitude, p.latitude),
            accuracy: p.accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64) -> Position {
        Position {
            latitude: lat,
            longitude: 4.0,
            accuracy: 12.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn default_options() {
        let options = WatchOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[test]
    fn error_codes_map_to_variants() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(42), GeolocationError::PositionUnavailable);
    }

    #[test]
    fn fix_clears_error_and_loading() {
        let mut watch = PositionWatch::start(true, WatchOptions::default());
        assert!(watch.loading());
        watch.on_error(GeolocationError::Timeout);
        assert!(!watch.loading());
        watch.on_position(fix(50.0));
        assert_eq!(watch.error(), None);
        assert_eq!(watch.position().map(|p| p.latitude), Some(50.0));
    }

    #[test]
    fn error_keeps_last_position() {
        let mut watch = PositionWatch::start(true, WatchOptions::default());
        watch.on_position(fix(50.0));
        watch.on_error(GeolocationError::from_code(2));
        assert_eq!(watch.error(), Some(GeolocationError::PositionUnavailable));
        let Some(location) = watch.user_location() else {
            return;
        };
        assert!((location.position.lat - 50.0).abs() < f64::EPSILON);
        assert!((location.accuracy - 12.0).abs() < f64::EPSILON);
        watch.on_position(fix(51.0));
        assert_eq!(watch.position().map(|p| p.latitude), Some(51.0));
    }

    #[test]
    fn unsupported_platform() {
        let watch = PositionWatch::start(false, WatchOptions::default());
        assert!(!watch.supported());
        assert!(!watch.loading());
        assert_eq!(watch.error(), Some(GeolocationError::Unsupported));
        assert!(watch.user_location().is_none());
    }
}
