//! Domain layer: layers, markers, identifiers and label handling.
//!
//! Types here are storage- and transport-agnostic. Validation of the
//! layer and marker invariants lives on the types themselves so every
//! entry point (REST, import) enforces the same rules.

pub mod ids;
pub mod labels;
pub mod layer;
pub mod marker;

pub use ids::{LayerId, MarkerId};
pub use layer::{DEFAULT_LAYER_COLOR, DEFAULT_LAYER_NAME, Layer, LayerPatch, LayerSummary};
pub use marker::{Marker, MarkerDraft, MarkerPatch, MarkerRecord};
