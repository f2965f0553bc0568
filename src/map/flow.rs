//! Client UI state machines: marker creation, side-panel navigation and
//! the label input box.

use thiserror::Error;

use super::projection::LonLat;
use crate::domain::labels;
use crate::domain::{Layer, MarkerId, MarkerRecord};

/// Rejected state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while {state}")]
pub struct FlowError {
    /// Attempted action.
    pub action: &'static str,
    /// State the flow was in.
    pub state: &'static str,
}

/// Where the "new marker" form is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CreationState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// A position was picked; the form is open.
    PositionCaptured(LonLat),
    /// The form was sent; waiting for the server.
    Submitted(LonLat),
    /// The server rejected the marker. The position is gone.
    Failed(String),
}

impl CreationState {
    const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PositionCaptured(_) => "editing",
            Self::Submitted(_) => "submitting",
            Self::Failed(_) => "failed",
        }
    }
}

/// Marker creation flow driven by gestures and API results.
#[derive(Debug, Clone, Default)]
pub struct MarkerCreationFlow {
    state: CreationState,
}

impl MarkerCreationFlow {
    /// Starts idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CreationState {
        &self.state
    }

    fn reject(&self, action: &'static str) -> FlowError {
        FlowError {
            action,
            state: self.state.name(),
        }
    }

    /// Opens the form at `position`. Allowed from idle or after a failure.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] while a form is open or being submitted.
    pub fn capture(&mut self, position: LonLat) -> Result<(), FlowError> {
        match self.state {
            CreationState::Idle | CreationState::Failed(_) => {
                self.state = CreationState::PositionCaptured(position);
                Ok(())
            }
            _ => Err(self.reject("capture a position")),
        }
    }

    /// Closes the open form without submitting.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] unless a form is open.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        match self.state {
            CreationState::PositionCaptured(_) => {
                self.state = CreationState::Idle;
                Ok(())
            }
            _ => Err(self.reject("cancel")),
        }
    }

    /// Sends the form; returns the captured position for the request.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] unless a form is open.
    pub fn submit(&mut self) -> Result<LonLat, FlowError> {
        match self.state {
            CreationState::PositionCaptured(position) => {
                self.state = CreationState::Submitted(position);
                Ok(position)
            }
            _ => Err(self.reject("submit")),
        }
    }

    /// The server created the marker.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] unless a submission is pending.
    pub fn succeed(&mut self) -> Result<(), FlowError> {
        match self.state {
            CreationState::Submitted(_) => {
                self.state = CreationState::Idle;
                Ok(())
            }
            _ => Err(self.reject("complete")),
        }
    }

    /// The server rejected the marker.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] unless a submission is pending.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), FlowError> {
        match self.state {
            CreationState::Submitted(_) => {
                self.state = CreationState::Failed(message.into());
                Ok(())
            }
            _ => Err(self.reject("fail")),
        }
    }

    /// Dismisses the failure message.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] unless the flow has failed.
    pub fn dismiss(&mut self) -> Result<(), FlowError> {
        match self.state {
            CreationState::Failed(_) => {
                self.state = CreationState::Idle;
                Ok(())
            }
            _ => Err(self.reject("dismiss")),
        }
    }
}

/// Side-panel views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    /// Layer list.
    #[default]
    Layers,
    /// Marker list.
    Markers,
    /// One marker.
    MarkerDetail(MarkerId),
}

/// Side-panel navigation with a single back slot.
#[derive(Debug, Clone, Default)]
pub struct PanelNavigator {
    current: Panel,
    previous: Option<Panel>,
}

impl PanelNavigator {
    /// Starts on the layer list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible panel.
    #[must_use]
    pub const fn current(&self) -> Panel {
        self.current
    }

    /// Whether [`Self::back`] would do anything.
    #[must_use]
    pub const fn can_go_back(&self) -> bool {
        self.previous.is_some()
    }

    /// Opens `panel`, remembering the current one. Opening the visible
    /// panel again is a no-op.
    pub fn open(&mut self, panel: Panel) {
        if panel != self.current {
            self.previous = Some(self.current);
            self.current = panel;
        }
    }

    /// Returns to the remembered panel, emptying the slot.
    pub fn back(&mut self) -> Panel {
        if let Some(previous) = self.previous.take() {
            self.current = previous;
        }
        self.current
    }
}

/// One section of the marker list panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGroup<'a> {
    /// Section header.
    pub layer: &'a Layer,
    /// Markers of the layer, in the order given.
    pub markers: Vec<&'a MarkerRecord>,
}

/// Groups markers under their layers, one section per layer in layer
/// order. Empty layers keep an empty section; markers of unknown layers
/// are left out.
#[must_use]
pub fn group_by_layer<'a>(
    layers: &'a [Layer],
    markers: &'a [MarkerRecord],
) -> Vec<LayerGroup<'a>> {
    layers
        .iter()
        .map(|layer| LayerGroup {
            layer,
            markers: markers
                .iter()
                .filter(|m| m.marker.layer_id == layer.id)
                .collect(),
        })
        .collect()
}

/// Label chips plus the text being typed.
#[derive(Debug, Clone, Default)]
pub struct LabelInput {
    labels: Vec<String>,
    available: Vec<String>,
    pending: String,
}

impl LabelInput {
    /// Starts from a marker's labels and every label known to the server.
    #[must_use]
    pub fn new(labels: Vec<String>, mut available: Vec<String>) -> Self {
        available.sort();
        available.dedup();
        Self {
            labels: labels::normalize(labels),
            available,
            pending: String::new(),
        }
    }

    /// Selected labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Suggestions, sorted.
    #[must_use]
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// Text not yet turned into a label.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Replaces the typed text. A space or comma commits everything typed
    /// so far.
    pub fn type_text(&mut self, text: &str) {
        if text.contains(|c: char| c.is_whitespace() || c == ',') {
            self.pending.clear();
            self.add_all(labels::parse_input(text, &self.labels));
        } else {
            text.clone_into(&mut self.pending);
        }
    }

    /// Commits the pending text (Enter key).
    pub fn commit(&mut self) {
        let text = std::mem::take(&mut self.pending);
        self.add_all(labels::parse_input(&text, &self.labels));
    }

    /// Picks a suggestion.
    pub fn select(&mut self, label: &str) {
        self.add_all(labels::parse_input(label, &self.labels));
    }

    /// Drops a selected label.
    pub fn remove(&mut self, label: &str) {
        self.labels.retain(|l| l != label);
    }

    fn add_all(&mut self, new: Vec<String>) {
        for label in new {
            if let Err(at) = self.available.binary_search(&label) {
                self.available.insert(at, label.clone());
            }
            self.labels.push(label);
        }
    }
}
