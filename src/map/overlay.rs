//! Base layers and georeferenced image overlays.
//!
//! Every overlay is drawn into the same projected extent and rotation held
//! by [`OverlayConfig`]; each overlay keeps its own visibility and opacity.
//! Rotation is applied to the rendered output as a CSS transform, the
//! source image is never re-projected.

use serde::{Deserialize, Serialize};

/// Street tiles; always drawn.
pub const STREET_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Satellite imagery tiles.
pub const SATELLITE_TILE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// Highest zoom served by the satellite source.
pub const SATELLITE_MAX_ZOOM: u8 = 19;

/// Default pan step, in projected units.
pub const DEFAULT_MOVE_STEP: f64 = 2.0;

/// Scale factor of the "wider"/"taller" controls.
pub const GROW_FACTOR: f64 = 1.1;

/// Scale factor of the "narrower"/"shorter" controls.
pub const SHRINK_FACTOR: f64 = 0.9;

/// Rotation applied per control press, in degrees.
pub const ROTATION_STEP_DEG: f64 = 1.0;

/// Base tile layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLayer {
    /// OpenStreetMap street tiles.
    Street,
    /// Satellite imagery drawn over the street layer.
    Satellite,
}

impl BaseLayer {
    /// XYZ URL template of the layer.
    #[must_use]
    pub const fn url_template(self) -> &'static str {
        match self {
            Self::Street => STREET_TILE_URL,
            Self::Satellite => SATELLITE_TILE_URL,
        }
    }
}

/// Which base layers are drawn. Satellite is toggled independently; the
/// street layer is never hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseLayers {
    satellite_visible: bool,
}

impl Default for BaseLayers {
    fn default() -> Self {
        Self {
            satellite_visible: true,
        }
    }
}

impl BaseLayers {
    /// Whether satellite imagery is drawn.
    #[must_use]
    pub const fn satellite_visible(&self) -> bool {
        self.satellite_visible
    }

    /// Shows or hides satellite imagery.
    pub fn set_satellite_visible(&mut self, visible: bool) {
        self.satellite_visible = visible;
    }

    /// Flips satellite visibility and returns the new state.
    pub fn toggle_satellite(&mut self) -> bool {
        self.satellite_visible = !self.satellite_visible;
        self.satellite_visible
    }

    /// Layers to draw, bottom first.
    #[must_use]
    pub fn visible(&self) -> Vec<BaseLayer> {
        let mut layers = vec![BaseLayer::Street];
        if self.satellite_visible {
            layers.push(BaseLayer::Satellite);
        }
        layers
    }
}

/// Axis-aligned box in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// West edge.
    pub min_x: f64,
    /// South edge.
    pub min_y: f64,
    /// East edge.
    pub max_x: f64,
    /// North edge.
    pub max_y: f64,
}

impl Extent {
    /// Creates an extent from its edges.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Center point `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// East-west size.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// North-south size.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Shifts the box by `(dx, dy)`.
    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Scales the width by `factor`, keeping the center.
    #[must_use]
    pub fn scaled_width(self, factor: f64) -> Self {
        let (cx, _) = self.center();
        let half = self.width() * factor / 2.0;
        Self::new(cx - half, self.min_y, cx + half, self.max_y)
    }

    /// Scales the height by `factor`, keeping the center.
    #[must_use]
    pub fn scaled_height(self, factor: f64) -> Self {
        let (_, cy) = self.center();
        let half = self.height() * factor / 2.0;
        Self::new(self.min_x, cy - half, self.max_x, cy + half)
    }
}

/// Pan direction; north is +y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    /// +y
    Up,
    /// -y
    Down,
    /// -x
    Left,
    /// +x
    Right,
}

/// Geometry and opacity shared by every image overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Master visibility.
    pub visible: bool,
    /// Master opacity in [0, 1].
    pub opacity: f64,
    /// Projected box the images are stretched into.
    pub extent: Extent,
    /// Clockwise rotation of the rendered output, in degrees.
    pub rotation: f64,
}

impl OverlayConfig {
    /// Creates a visible, unrotated configuration.
    #[must_use]
    pub const fn new(extent: Extent, opacity: f64) -> Self {
        Self {
            visible: true,
            opacity,
            extent,
            rotation: 0.0,
        }
    }

    /// Moves the extent by `step` in `direction`.
    pub fn pan(&mut self, direction: PanDirection, step: f64) {
        let (dx, dy) = match direction {
            PanDirection::Up => (0.0, step),
            PanDirection::Down => (0.0, -step),
            PanDirection::Left => (-step, 0.0),
            PanDirection::Right => (step, 0.0),
        };
        self.extent = self.extent.translated(dx, dy);
    }

    /// Widens (`factor > 1`) or narrows the extent about its center.
    pub fn scale_width(&mut self, factor: f64) {
        self.extent = self.extent.scaled_width(factor);
    }

    /// Heightens (`factor > 1`) or flattens the extent about its center.
    pub fn scale_height(&mut self, factor: f64) {
        self.extent = self.extent.scaled_height(factor);
    }

    /// Adds `delta` degrees of rotation.
    pub fn rotate(&mut self, delta: f64) {
        self.rotation += delta;
    }

    /// Sets the opacity, clamped to [0, 1].
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// CSS transform applied to the rendered overlay canvas.
    #[must_use]
    pub fn css_transform(&self) -> String {
        format!("rotate({}deg)", self.rotation)
    }
}

/// Overlay control panel state: the shared config plus the pan step.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEditor {
    config: OverlayConfig,
    move_step: f64,
}

impl OverlayEditor {
    /// Wraps a configuration with the default pan step.
    #[must_use]
    pub const fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            move_step: DEFAULT_MOVE_STEP,
        }
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Current pan step.
    #[must_use]
    pub const fn move_step(&self) -> f64 {
        self.move_step
    }

    /// Sets the pan step. Non-positive or non-finite values are ignored
    /// and `false` is returned.
    pub fn set_move_step(&mut self, step: f64) -> bool {
        if step.is_finite() && step > 0.0 {
            self.move_step = step;
            true
        } else {
            false
        }
    }

    /// Pans by the current step.
    pub fn pan(&mut self, direction: PanDirection) {
        self.config.pan(direction, self.move_step);
    }

    /// "Wider" control.
    pub fn wider(&mut self) {
        self.config.scale_width(GROW_FACTOR);
    }

    /// "Narrower" control.
    pub fn narrower(&mut self) {
        self.config.scale_width(SHRINK_FACTOR);
    }

    /// "Taller" control.
    pub fn taller(&mut self) {
        self.config.scale_height(GROW_FACTOR);
    }

    /// "Shorter" control.
    pub fn shorter(&mut self) {
        self.config.scale_height(SHRINK_FACTOR);
    }

    /// Rotates one step clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.config.rotate(ROTATION_STEP_DEG);
    }

    /// Rotates one step counter-clockwise.
    pub fn rotate_counter_clockwise(&mut self) {
        self.config.rotate(-ROTATION_STEP_DEG);
    }

    /// Sets the master opacity.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.config.set_opacity(opacity);
    }
}

/// A static image placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverlay {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image URL.
    pub url: String,
    /// Per-overlay visibility.
    pub visible: bool,
    /// Per-overlay opacity in [0, 1].
    pub opacity: f64,
}

/// What the renderer needs to draw one overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOverlay {
    /// Overlay id.
    pub id: String,
    /// Image URL.
    pub url: String,
    /// Box the image is stretched into.
    pub extent: Extent,
    /// Effective opacity: overlay opacity times master opacity.
    pub opacity: f64,
    /// CSS transform for the rendered canvas.
    pub transform: String,
}

/// Ordered collection of image overlays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlaySet {
    overlays: Vec<ImageOverlay>,
}

impl OverlaySet {
    /// Creates a set from overlays, drawn in the given order.
    #[must_use]
    pub fn new(overlays: Vec<ImageOverlay>) -> Self {
        Self { overlays }
    }

    /// All overlays.
    #[must_use]
    pub fn overlays(&self) -> &[ImageOverlay] {
        &self.overlays
    }

    /// Flips one overlay's visibility. Returns the new state, or `None`
    /// for an unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let overlay = self.overlays.iter_mut().find(|o| o.id == id)?;
        overlay.visible = !overlay.visible;
        Some(overlay.visible)
    }

    /// Sets one overlay's opacity, clamped to [0, 1]. Returns `false` for
    /// an unknown id.
    pub fn set_opacity(&mut self, id: &str, opacity: f64) -> bool {
        match self.overlays.iter_mut().find(|o| o.id == id) {
            Some(overlay) => {
                overlay.opacity = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Overlays to draw under `config`, in order. Nothing is drawn while
    /// the master switch is off.
    #[must_use]
    pub fn render(&self, config: &OverlayConfig) -> Vec<RenderedOverlay> {
        if !config.visible {
            return Vec::new();
        }
        let transform = config.css_transform();
        self.overlays
            .iter()
            .filter(|o| o.visible)
            .map(|o| RenderedOverlay {
                id: o.id.clone(),
                url: o.url.clone(),
                extent: config.extent,
                opacity: o.opacity * config.opacity,
                transform: transform.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn config() -> OverlayConfig {
        OverlayConfig::new(Extent::new(0.0, 0.0, 100.0, 50.0), 0.8)
    }

    fn overlay(id: &str) -> ImageOverlay {
        ImageOverlay {
            id: id.to_string(),
            name: id.to_uppercase(),
            url: format!("/overlays/{id}.png"),
            visible: true,
            opacity: 0.5,
        }
    }

    #[test]
    fn pan_moves_both_edges() {
        let mut editor = OverlayEditor::new(config());
        editor.pan(PanDirection::Up);
        editor.pan(PanDirection::Right);
        assert_eq!(editor.config().extent, Extent::new(2.0, 2.0, 102.0, 52.0));
        editor.pan(PanDirection::Down);
        editor.pan(PanDirection::Left);
        assert_eq!(editor.config().extent, config().extent);
    }

    #[test]
    fn move_step_must_be_positive() {
        let mut editor = OverlayEditor::new(config());
        assert!(!editor.set_move_step(0.0));
        assert!(!editor.set_move_step(-3.0));
        assert!(!editor.set_move_step(f64::NAN));
        assert!((editor.move_step() - DEFAULT_MOVE_STEP).abs() < EPS);
        assert!(editor.set_move_step(10.0));
        editor.pan(PanDirection::Left);
        assert!((editor.config().extent.min_x + 10.0).abs() < EPS);
    }

    #[test]
    fn scaling_keeps_center() {
        let mut editor = OverlayEditor::new(config());
        editor.wider();
        let e = editor.config().extent;
        assert!((e.width() - 110.0).abs() < EPS);
        assert!((e.center().0 - 50.0).abs() < EPS);
        assert!((e.height() - 50.0).abs() < EPS);

        editor.shorter();
        let e = editor.config().extent;
        assert!((e.height() - 45.0).abs() < EPS);
        assert!((e.center().1 - 25.0).abs() < EPS);
    }

    #[test]
    fn wider_then_narrower_is_not_identity() {
        let mut editor = OverlayEditor::new(config());
        editor.wider();
        editor.narrower();
        assert!((editor.config().extent.width() - 99.0).abs() < EPS);
    }

    #[test]
    fn rotation_produces_css_transform() {
        let mut editor = OverlayEditor::new(config());
        editor.rotate_clockwise();
        editor.rotate_clockwise();
        editor.rotate_counter_clockwise();
        assert_eq!(editor.config().css_transform(), "rotate(1deg)");
        editor.rotate_counter_clockwise();
        editor.rotate_counter_clockwise();
        assert_eq!(editor.config().css_transform(), "rotate(-1deg)");
    }

    #[test]
    fn opacity_is_clamped() {
        let mut editor = OverlayEditor::new(config());
        editor.set_opacity(1.7);
        assert!((editor.config().opacity - 1.0).abs() < EPS);
        editor.set_opacity(-0.2);
        assert!(editor.config().opacity.abs() < EPS);
    }

    #[test]
    fn render_applies_shared_geometry_to_visible_overlays() {
        let mut set = OverlaySet::new(vec![overlay("a"), overlay("b")]);
        assert_eq!(set.toggle("b"), Some(false));
        assert_eq!(set.toggle("missing"), None);

        let mut cfg = config();
        cfg.rotate(5.0);
        let rendered = set.render(&cfg);
        assert_eq!(rendered.len(), 1);
        let Some(first) = rendered.first() else {
            return;
        };
        assert_eq!(first.id, "a");
        assert_eq!(first.extent, cfg.extent);
        assert!((first.opacity - 0.4).abs() < EPS);
        assert_eq!(first.transform, "rotate(5deg)");
    }

    #[test]
    fn master_switch_hides_everything() {
        let set = OverlaySet::new(vec![overlay("a")]);
        let mut cfg = config();
        cfg.visible = false;
        assert!(set.render(&cfg).is_empty());
    }

    #[test]
    fn satellite_toggles_independently_of_street() {
        let mut base = BaseLayers::default();
        assert_eq!(base.visible(), vec![BaseLayer::Street, BaseLayer::Satellite]);
        assert!(!base.toggle_satellite());
        assert_eq!(base.visible(), vec![BaseLayer::Street]);
        base.set_satellite_visible(true);
        assert!(base.satellite_visible());
        assert!(BaseLayer::Satellite.url_template().contains("World_Imagery"));
    }
}
