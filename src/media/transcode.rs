//! HEIC/HEIF → JPEG transcoding.
//!
//! Decoding goes through libheif when the `heif` feature is enabled; the
//! JPEG side always uses the `image` crate's encoder. The decoder sits
//! behind [`HeifTranscoder`] so uploads can be exercised without libheif.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use super::MediaError;

/// Converts a HEIC/HEIF file on disk into a JPEG file.
pub trait HeifTranscoder: Send + Sync + fmt::Debug {
    /// Decodes `src` and writes a JPEG of the given quality to `dst`.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError`] if `src` cannot be decoded or `dst` cannot
    /// be written. `dst` may be left partially written.
    fn transcode_to_jpeg(&self, src: &Path, dst: &Path, quality: u8) -> Result<(), MediaError>;
}

/// Encodes an RGB buffer as a baseline JPEG at `path`.
///
/// # Errors
///
/// Returns [`MediaError::Io`] if the file cannot be created or
/// [`MediaError::Image`] if encoding fails.
pub fn encode_jpeg(image: &RgbImage, path: &Path, quality: u8) -> Result<(), MediaError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(())
}

/// Transcoder used when the binary was built without libheif.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableTranscoder;

impl HeifTranscoder for UnavailableTranscoder {
    fn transcode_to_jpeg(&self, _src: &Path, _dst: &Path, _quality: u8) -> Result<(), MediaError> {
        Err(MediaError::Unsupported("HEIC/HEIF"))
    }
}

/// libheif-backed transcoder.
#[cfg(feature = "heif")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibheifTranscoder;

#[cfg(feature = "heif")]
impl HeifTranscoder for LibheifTranscoder {
    fn transcode_to_jpeg(&self, src: &Path, dst: &Path, quality: u8) -> Result<(), MediaError> {
        use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

        let heif_err = |e: libheif_rs::HeifError| MediaError::Heif(e.to_string());
        let src = src
            .to_str()
            .ok_or_else(|| MediaError::Heif("non UTF-8 path".to_string()))?;

        let decoded = {
            let lib = LibHeif::new();
            let ctx = HeifContext::read_from_file(src).map_err(heif_err)?;
            let handle = ctx.primary_image_handle().map_err(heif_err)?;
            lib.decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
                .map_err(heif_err)?
        };

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| MediaError::Heif("image has no interleaved RGB plane".to_string()))?;

        // Rows may be padded; copy exactly width * 3 bytes per row.
        let row_len = plane.width as usize * 3;
        let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            let Some(bytes) = row.get(..row_len) else {
                return Err(MediaError::Heif("truncated image row".to_string()));
            };
            pixels.extend_from_slice(bytes);
        }

        let image = RgbImage::from_raw(plane.width, plane.height, pixels)
            .ok_or_else(|| MediaError::Heif("pixel buffer size mismatch".to_string()))?;
        encode_jpeg(&image, dst, quality)
    }
}

/// Returns the best transcoder compiled into this build.
#[must_use]
pub fn default_transcoder() -> Arc<dyn HeifTranscoder> {
    #[cfg(feature = "heif")]
    {
        Arc::new(LibheifTranscoder)
    }
    #[cfg(not(feature = "heif"))]
    {
        Arc::new(UnavailableTranscoder)
    }
}
