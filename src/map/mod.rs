//! Client-side map logic, kept free of any rendering engine.
//!
//! The browser client draws tiles and vector features; everything that
//! decides *what* to draw and *where* a gesture lands lives here so it
//! can be tested without a DOM.

pub mod flow;
pub mod geolocation;
pub mod gesture;
pub mod overlay;
pub mod projection;
pub mod style;

pub use flow::{
    CreationState, FlowError, LabelInput, LayerGroup, MarkerCreationFlow, Panel, PanelNavigator,
    group_by_layer,
};
pub use geolocation::{GeolocationError, Position, PositionWatch, WatchOptions};
pub use gesture::{LongPressDetector, PointerEvent, PointerKind};
pub use overlay::{
    BaseLayer, BaseLayers, Extent, ImageOverlay, OverlayConfig, OverlayEditor, OverlaySet,
    PanDirection, RenderedOverlay,
};
pub use projection::{LonLat, MapView, Pixel, Projected, from_lon_lat, to_lon_lat};
pub use style::{LocationFeature, MapMarker, MarkerFeature, UserLocation};

/// Initial view center: the geographic center of the contiguous US.
pub const DEFAULT_CENTER: LonLat = LonLat::new(-98.5795, 39.8283);

/// Initial zoom level.
pub const DEFAULT_ZOOM: f64 = 4.0;
