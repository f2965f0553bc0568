//! Service layer: business logic orchestration.
//!
//! [`LayerService`] and [`MarkerService`] validate through the domain
//! types and persist through the [`crate::persistence::MapStore`] seam.
//! [`UploadService`] stores images on disk and [`ImportService`] combines
//! the three to place geotagged photos.

pub mod import_service;
pub mod layer_service;
pub mod marker_service;
pub mod upload_service;

pub use import_service::{ImportOutcome, ImportService, SkippedImport};
pub use layer_service::LayerService;
pub use marker_service::MarkerService;
pub use upload_service::{UploadFile, UploadService, UploadSettings};
