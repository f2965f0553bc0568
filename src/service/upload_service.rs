//! Upload service: validates and stores images, transcoding HEIC/HEIF.
//!
//! Files are written to the upload directory under a collision-free name
//! and exposed as `/uploads/<name>`. A request is validated in full before
//! anything touches the disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::error::MapError;
use crate::media::{HeifTranscoder, ImageFormat};

/// URL prefix under which stored files are served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// One file received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied file name.
    pub file_name: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

/// Upload limits and output settings.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Directory files are written to.
    pub dir: PathBuf,
    /// Per-file size limit in bytes.
    pub max_file_bytes: usize,
    /// Maximum number of files per bulk request.
    pub max_files: usize,
    /// JPEG quality for transcoded HEIC/HEIF files.
    pub jpeg_quality: u8,
}

/// Stores uploaded images.
#[derive(Debug, Clone)]
pub struct UploadService {
    settings: UploadSettings,
    transcoder: Arc<dyn HeifTranscoder>,
}

impl UploadService {
    /// Creates a new `UploadService`.
    #[must_use]
    pub fn new(settings: UploadSettings, transcoder: Arc<dyn HeifTranscoder>) -> Self {
        Self {
            settings,
            transcoder,
        }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.settings.dir
    }

    /// Maximum number of files per bulk request.
    #[must_use]
    pub fn max_files(&self) -> usize {
        self.settings.max_files
    }

    /// Per-file size limit in bytes.
    #[must_use]
    pub fn max_file_bytes(&self) -> usize {
        self.settings.max_file_bytes
    }

    /// Checks a file against the format filter and the size limit.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnsupportedImage`] when the extension or MIME
    /// type is not an accepted image type, or [`MapError::FileTooLarge`].
    pub fn validate(&self, file: &UploadFile) -> Result<ImageFormat, MapError> {
        let format = ImageFormat::from_file_name(&file.file_name)
            .filter(|f| f.accepts_mime(file.content_type.as_deref().unwrap_or_default()))
            .ok_or_else(|| MapError::UnsupportedImage(file.file_name.clone()))?;
        if file.bytes.len() > self.settings.max_file_bytes {
            return Err(MapError::FileTooLarge {
                max_bytes: self.settings.max_file_bytes,
            });
        }
        Ok(format)
    }

    /// Stores a single image and returns its URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error as for [`Self::validate`], or
    /// [`MapError::ImageConversion`] if a HEIC/HEIF file cannot be
    /// transcoded. Nothing is left on disk on error.
    pub async fn store_one(&self, file: UploadFile) -> Result<String, MapError> {
        let format = self.validate(&file)?;
        self.persist(&file, format).await
    }

    /// Stores several images and returns the URLs of those that were
    /// stored.
    ///
    /// Every file is validated before any is written. A HEIC/HEIF file
    /// that fails to transcode is dropped from the result.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::NoFileUploaded`] for an empty request,
    /// [`MapError::TooManyFiles`] above the configured count, or the first
    /// validation error.
    pub async fn store_many(&self, files: Vec<UploadFile>) -> Result<Vec<String>, MapError> {
        let validated = self.validate_all(files)?;
        let mut urls = Vec::with_capacity(validated.len());
        for (file, format) in validated {
            match self.persist(&file, format).await {
                Ok(url) => urls.push(url),
                Err(MapError::ImageConversion(reason)) => {
                    tracing::warn!(file = %file.file_name, %reason, "dropping unconvertible image");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(urls)
    }

    /// Validates a whole bulk request, pairing each file with its format.
    ///
    /// # Errors
    ///
    /// As for [`Self::store_many`].
    pub fn validate_all(
        &self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<(UploadFile, ImageFormat)>, MapError> {
        if files.is_empty() {
            return Err(MapError::NoFileUploaded);
        }
        if files.len() > self.settings.max_files {
            return Err(MapError::TooManyFiles {
                max: self.settings.max_files,
            });
        }
        files
            .into_iter()
            .map(|file| {
                let format = self.validate(&file)?;
                Ok((file, format))
            })
            .collect()
    }

    /// Writes one validated file, transcoding it when needed, and returns
    /// its public URL.
    ///
    /// The write, transcode and cleanup run as one spawned task that
    /// completes even if the caller is dropped, so a timed-out request
    /// never strands an original or a partial JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Internal`] on I/O failure or
    /// [`MapError::ImageConversion`] on a failed transcode.
    pub async fn persist(&self, file: &UploadFile, format: ImageFormat) -> Result<String, MapError> {
        let ext = Path::new(&file.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let stem = unique_stem();
        let job = StoreJob {
            file_name: file.file_name.clone(),
            bytes: file.bytes.clone(),
            stored: self.settings.dir.join(format!("{stem}.{ext}")),
            jpeg: format
                .needs_transcoding()
                .then(|| self.settings.dir.join(format!("{stem}.jpg"))),
            transcoder: Arc::clone(&self.transcoder),
            quality: self.settings.jpeg_quality,
        };
        tokio::spawn(job.run())
            .await
            .map_err(|e| MapError::Internal(format!("upload task failed: {e}")))?
    }

    /// Deletes a stored file by its public URL. Unknown files are ignored.
    pub async fn discard(&self, url: &str) {
        let Some(name) = url
            .strip_prefix(UPLOAD_URL_PREFIX)
            .and_then(|rest| Path::new(rest).file_name())
        else {
            return;
        };
        remove_quietly(&self.settings.dir.join(name)).await;
    }
}

/// One file on its way to disk.
#[derive(Debug)]
struct StoreJob {
    file_name: String,
    bytes: Bytes,
    stored: PathBuf,
    /// Set when the file must be transcoded.
    jpeg: Option<PathBuf>,
    transcoder: Arc<dyn HeifTranscoder>,
    quality: u8,
}

impl StoreJob {
    async fn run(self) -> Result<String, MapError> {
        tokio::fs::write(&self.stored, &self.bytes)
            .await
            .map_err(|e| MapError::Internal(format!("writing {}: {e}", self.stored.display())))?;

        let Some(jpeg) = self.jpeg else {
            return Ok(public_url(&self.stored));
        };

        let (src, dst) = (self.stored.clone(), jpeg.clone());
        let transcoder = self.transcoder;
        let quality = self.quality;
        let result =
            tokio::task::spawn_blocking(move || transcoder.transcode_to_jpeg(&src, &dst, quality))
                .await
                .map_err(|e| MapError::Internal(format!("transcode task failed: {e}")))
                .and_then(|r| r.map_err(MapError::from));

        match result {
            Ok(()) => {
                remove_quietly(&self.stored).await;
                tracing::debug!(file = %self.file_name, "converted HEIF upload to JPEG");
                Ok(public_url(&jpeg))
            }
            Err(err) => {
                remove_quietly(&jpeg).await;
                remove_quietly(&self.stored).await;
                Err(err)
            }
        }
    }
}

/// `<unix-ms>-<uuid>`; unique per call.
fn unique_stem() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple())
}

fn public_url(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    format!("{UPLOAD_URL_PREFIX}/{name}")
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), %err, "failed to remove upload");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::media::MediaError;
    use crate::media::encode_jpeg;

    /// Writes a tiny JPEG, standing in for libheif.
    #[derive(Debug)]
    pub(crate) struct FakeTranscoder;

    impl HeifTranscoder for FakeTranscoder {
        fn transcode_to_jpeg(&self, _src: &Path, dst: &Path, quality: u8) -> Result<(), MediaError> {
            let image = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 255]));
            encode_jpeg(&image, dst, quality)
        }
    }

    /// Leaves a partial output behind, then fails.
    #[derive(Debug)]
    pub(crate) struct FailingTranscoder;

    impl HeifTranscoder for FailingTranscoder {
        fn transcode_to_jpeg(&self, _src: &Path, dst: &Path, _quality: u8) -> Result<(), MediaError> {
            std::fs::write(dst, b"partial")?;
            Err(MediaError::Heif("corrupt input".to_string()))
        }
    }

    /// Blocks for a while before writing the JPEG.
    #[derive(Debug)]
    struct SlowTranscoder;

    impl HeifTranscoder for SlowTranscoder {
        fn transcode_to_jpeg(&self, src: &Path, dst: &Path, quality: u8) -> Result<(), MediaError> {
            std::thread::sleep(std::time::Duration::from_millis(200));
            FakeTranscoder.transcode_to_jpeg(src, dst, quality)
        }
    }

    fn service(dir: &Path, transcoder: Arc<dyn HeifTranscoder>) -> UploadService {
        UploadService::new(
            UploadSettings {
                dir: dir.to_path_buf(),
                max_file_bytes: 1024,
                max_files: 3,
                jpeg_quality: 85,
            },
            transcoder,
        )
    }

    fn file(name: &str, mime: &str, len: usize) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: Some(mime.to_string()),
            bytes: Bytes::from(vec![0_u8; len]),
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let Ok(read) = std::fs::read_dir(dir) else {
            panic!("read_dir");
        };
        let mut names: Vec<String> = read
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn stores_png_under_unique_name() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        let Ok(first) = svc.store_one(file("a.png", "image/png", 10)).await else {
            panic!("store failed");
        };
        let Ok(second) = svc.store_one(file("a.png", "image/png", 10)).await else {
            panic!("store failed");
        };
        assert!(first.starts_with("/uploads/"));
        assert!(first.ends_with(".png"));
        assert_ne!(first, second);
        assert_eq!(dir_entries(tmp.path()).len(), 2);
    }

    #[tokio::test]
    async fn rejects_mismatched_or_unknown_types() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        for f in [
            file("a.txt", "text/plain", 1),
            file("a.png", "text/plain", 1),
            file("a.txt", "image/png", 1),
        ] {
            assert!(matches!(
                svc.store_one(f).await,
                Err(MapError::UnsupportedImage(_))
            ));
        }
        assert!(dir_entries(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        let result = svc.store_one(file("big.jpg", "image/jpeg", 2048)).await;
        assert!(matches!(result, Err(MapError::FileTooLarge { max_bytes: 1024 })));
    }

    #[tokio::test]
    async fn heic_becomes_jpg_and_original_is_removed() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        let Ok(url) = svc
            .store_one(file("photo.heic", "application/octet-stream", 16))
            .await
        else {
            panic!("store failed");
        };
        assert!(url.ends_with(".jpg"));
        let entries = dir_entries(tmp.path());
        assert_eq!(entries.len(), 1);
        assert!(entries.iter().all(|n| n.ends_with(".jpg")));
    }

    #[tokio::test]
    async fn failed_conversion_leaves_nothing_behind() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FailingTranscoder));
        let result = svc.store_one(file("photo.heic", "image/heic", 16)).await;
        assert!(matches!(result, Err(MapError::ImageConversion(_))));
        assert!(dir_entries(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn bulk_drops_failed_conversions() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FailingTranscoder));
        let files = vec![
            file("a.jpg", "image/jpeg", 4),
            file("b.heif", "image/heif", 4),
        ];
        let Ok(urls) = svc.store_many(files).await else {
            panic!("bulk failed");
        };
        assert_eq!(urls.len(), 1);
        assert!(urls.iter().all(|u| u.ends_with(".jpg")));
        assert_eq!(dir_entries(tmp.path()).len(), 1);
    }

    #[tokio::test]
    async fn bulk_validates_everything_first() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        let files = vec![file("a.jpg", "image/jpeg", 4), file("b.exe", "application/x-msdownload", 4)];
        assert!(svc.store_many(files).await.is_err());
        assert!(dir_entries(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn bulk_enforces_count_limits() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        assert!(matches!(
            svc.store_many(Vec::new()).await,
            Err(MapError::NoFileUploaded)
        ));
        let files = (0..4).map(|i| file(&format!("{i}.png"), "image/png", 1)).collect();
        assert!(matches!(
            svc.store_many(files).await,
            Err(MapError::TooManyFiles { max: 3 })
        ));
    }

    #[tokio::test]
    async fn dropped_caller_still_finishes_conversion() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(SlowTranscoder));
        let upload = file("photo.heic", "image/heic", 16);
        let cut_short = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            svc.store_one(upload),
        )
        .await;
        assert!(cut_short.is_err());

        let mut entries = dir_entries(tmp.path());
        for _ in 0..100 {
            if entries.len() == 1 && entries.iter().all(|n| n.ends_with(".jpg")) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            entries = dir_entries(tmp.path());
        }
        assert_eq!(entries.len(), 1, "{entries:?}");
        assert!(entries.iter().all(|n| n.ends_with(".jpg")), "{entries:?}");
    }

    #[tokio::test]
    async fn discard_removes_stored_file() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let svc = service(tmp.path(), Arc::new(FakeTranscoder));
        let Ok(url) = svc.store_one(file("a.png", "image/png", 10)).await else {
            panic!("store failed");
        };
        svc.discard("/uploads/../../etc/passwd").await;
        svc.discard("/elsewhere/a.png").await;
        assert_eq!(dir_entries(tmp.path()).len(), 1);
        svc.discard(&url).await;
        assert!(dir_entries(tmp.path()).is_empty());
    }
}
