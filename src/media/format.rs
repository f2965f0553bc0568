//! Accepted upload formats.
//!
//! A file passes the filter only when both its extension and its declared
//! MIME type name one of the supported raster formats.

use std::path::Path;

/// Raster formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG (`.jpg`, `.jpeg`).
    Jpeg,
    /// PNG.
    Png,
    /// GIF.
    Gif,
    /// WebP.
    Webp,
    /// HEIC/HEIF (`.heic`, `.heif`); transcoded to JPEG after upload.
    Heif,
}

impl ImageFormat {
    /// Resolves the format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "heic" | "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Resolves the format from an original file name.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether `mime` is an acceptable declaration for this format.
    ///
    /// Browsers often send HEIC files as `application/octet-stream`, so
    /// that is accepted for [`Self::Heif`] only.
    #[must_use]
    pub fn accepts_mime(self, mime: &str) -> bool {
        let mime = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match self {
            Self::Jpeg => matches!(mime.as_str(), "image/jpeg" | "image/jpg" | "image/pjpeg"),
            Self::Png => mime == "image/png",
            Self::Gif => mime == "image/gif",
            Self::Webp => mime == "image/webp",
            Self::Heif => matches!(
                mime.as_str(),
                "image/heic" | "image/heif" | "image/heic-sequence" | "image/heif-sequence"
                    | "application/octet-stream"
            ),
        }
    }

    /// Whether the file must be transcoded to JPEG after upload.
    #[must_use]
    pub const fn needs_transcoding(self) -> bool {
        matches!(self, Self::Heif)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(ImageFormat::from_file_name("IMG_1.JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_file_name("photo.heic"), Some(ImageFormat::Heif));
        assert_eq!(ImageFormat::from_file_name("photo.HEIF"), Some(ImageFormat::Heif));
        assert_eq!(ImageFormat::from_file_name("notes.txt"), None);
        assert_eq!(ImageFormat::from_file_name("no_extension"), None);
    }

    #[test]
    fn mime_must_match_format() {
        assert!(ImageFormat::Png.accepts_mime("image/png"));
        assert!(!ImageFormat::Png.accepts_mime("image/jpeg"));
        assert!(ImageFormat::Jpeg.accepts_mime("IMAGE/JPEG; charset=binary"));
        assert!(!ImageFormat::Jpeg.accepts_mime("application/octet-stream"));
    }

    #[test]
    fn heif_accepts_octet_stream() {
        assert!(ImageFormat::Heif.accepts_mime("image/heic"));
        assert!(ImageFormat::Heif.accepts_mime("application/octet-stream"));
        assert!(!ImageFormat::Heif.accepts_mime("text/plain"));
    }

    #[test]
    fn only_heif_needs_transcoding() {
        assert!(ImageFormat::Heif.needs_transcoding());
        assert!(!ImageFormat::Webp.needs_transcoding());
    }
}
