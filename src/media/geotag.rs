//! EXIF GPS extraction for geotagged photo import.

use std::io::Cursor;

use exif::{In, Reader, Tag, Value};

/// A decimal-degree position read from image metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPosition {
    /// Latitude, negative south of the equator.
    pub latitude: f64,
    /// Longitude, negative west of Greenwich.
    pub longitude: f64,
}

/// Reads the GPS position embedded in an image container (JPEG, TIFF,
/// HEIF, PNG or WebP).
///
/// Returns `None` when the image carries no EXIF block, no GPS tags, or
/// a position outside WGS84 bounds.
#[must_use]
pub fn read_gps(bytes: &[u8]) -> Option<GpsPosition> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let latitude = coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;

    let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
    in_range.then_some(GpsPosition { latitude, longitude })
}

fn coordinate(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    let mut dms = parts.iter().map(exif::Rational::to_f64);
    let degrees = dms.next()?;
    let minutes = dms.next().unwrap_or(0.0);
    let seconds = dms.next().unwrap_or(0.0);
    let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if !decimal.is_finite() {
        return None;
    }

    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match f.value {
            Value::Ascii(ref strings) => strings.first().and_then(|s| s.first()).copied(),
            _ => None,
        })
        .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref));
    if negative {
        decimal = -decimal;
    }
    Some(decimal)
}
