//! # fairmap
//!
//! REST backend and client-side map logic for a collaborative map
//! annotation app.
//!
//! The HTTP service stores colored layers and the markers placed on them,
//! accepts image uploads (converting HEIC/HEIF photos to JPEG), imports
//! geotagged photos as markers and proxies address search. The [`map`]
//! module holds the browser client's view logic: projection, overlay
//! geometry, gestures, styling and UI flows.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)        ── /uploads static files
//!     │
//!     ├── Layer / Marker / Upload / Import services (service/)
//!     │       ├── media/  (format filter, HEIF → JPEG, EXIF GPS)
//!     │       └── geocoding (Nominatim client)
//!     │
//!     ├── Domain types and validation (domain/)
//!     │
//!     └── MapStore (persistence/)
//!             ├── PostgreSQL
//!             └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod geocoding;
pub mod map;
pub mod media;
pub mod persistence;
pub mod service;
