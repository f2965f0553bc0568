//! Image handling: upload format filtering, HEIC/HEIF → JPEG transcoding
//! and EXIF GPS extraction.

pub mod format;
pub mod geotag;
pub mod transcode;

pub use format::ImageFormat;
pub use geotag::{GpsPosition, read_gps};
pub use transcode::{HeifTranscoder, UnavailableTranscoder, default_transcoder, encode_jpeg};

use crate::error::MapError;

/// Errors raised while decoding or encoding images.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding through the `image` crate failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// libheif failed to decode the source.
    #[error("heif error: {0}")]
    Heif(String),

    /// No decoder is available for this format in this build.
    #[error("no decoder available for {0}")]
    Unsupported(&'static str),
}

impl From<MediaError> for MapError {
    fn from(err: MediaError) -> Self {
        Self::ImageConversion(err.to_string())
    }
}
