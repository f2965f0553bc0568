//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire; marker responses embed their
//! layer and layer listings carry a `_count` object.

pub mod common_dto;
pub mod geocode_dto;
pub mod layer_dto;
pub mod marker_dto;
pub mod upload_dto;

pub use common_dto::*;
pub use geocode_dto::*;
pub use layer_dto::*;
pub use marker_dto::*;
pub use upload_dto::*;
