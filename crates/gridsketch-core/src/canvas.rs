//! Per-drawing canvas state: committed and scratch layers, undo/redo history,
//! selection and view position.

use crate::layer::{Layer, LayerView};
use crate::transform::{CellMetrics, DEFAULT_ZOOM};
use crate::vector::GridBox;
use kurbo::Vec2;
use std::fmt;

/// Maximum number of undo diffs to keep.
pub const MAX_UNDO_HISTORY: usize = 200;

/// What part of the canvas a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasChange {
    /// The tool's uncommitted layer changed.
    Scratch,
    /// The committed layer or the undo/redo history changed.
    Committed,
    Selection,
    /// Zoom or offset changed.
    View,
}

/// Persisted groups changed since the last [`CanvasState::take_unsaved`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnsavedChanges {
    /// Committed layer and history stacks.
    pub layers: bool,
    /// Zoom and offset.
    pub view: bool,
}

impl UnsavedChanges {
    pub fn any(&self) -> bool {
        self.layers || self.view
    }
}

/// Handle returned by [`CanvasState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(CanvasChange)>;

/// The editable state of one drawing.
pub struct CanvasState {
    committed: Layer,
    scratch: Layer,
    /// Inverse diffs, most recent last.
    undo_stack: Vec<Layer>,
    redo_stack: Vec<Layer>,
    selection: Option<GridBox>,
    zoom: f64,
    /// Frame-space point shown at the viewport centre.
    offset: Vec2,
    metrics: CellMetrics,
    revision: u64,
    unsaved: UnsavedChanges,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CanvasState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasState")
            .field("committed", &self.committed.len())
            .field("scratch", &self.scratch.len())
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("selection", &self.selection)
            .field("zoom", &self.zoom)
            .field("offset", &self.offset)
            .field("revision", &self.revision)
            .finish()
    }
}

impl CanvasState {
    /// Create an empty canvas centred on the grid.
    pub fn new() -> Self {
        Self::restore(
            Layer::new(),
            Vec::new(),
            Vec::new(),
            DEFAULT_ZOOM,
            CellMetrics::default().default_offset(),
            CellMetrics::default(),
        )
    }

    /// Create a canvas showing `committed` with no history.
    pub fn with_committed(committed: Layer) -> Self {
        let mut canvas = Self::new();
        canvas.committed = committed;
        canvas
    }

    /// Rebuild a canvas from persisted parts. Nothing is marked unsaved.
    ///
    /// `zoom` is snapped to whole pixels of `metrics`.
    pub fn restore(
        committed: Layer,
        undo_stack: Vec<Layer>,
        redo_stack: Vec<Layer>,
        zoom: f64,
        offset: Vec2,
        metrics: CellMetrics,
    ) -> Self {
        Self {
            committed,
            scratch: Layer::new(),
            undo_stack,
            redo_stack,
            selection: None,
            zoom: metrics.snap_zoom(if zoom > 0.0 { zoom } else { DEFAULT_ZOOM }),
            offset,
            metrics,
            revision: 0,
            unsaved: UnsavedChanges::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn committed(&self) -> &Layer {
        &self.committed
    }

    pub fn scratch(&self) -> &Layer {
        &self.scratch
    }

    pub fn undo_stack(&self) -> &[Layer] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[Layer] {
        &self.redo_stack
    }

    pub fn selection(&self) -> Option<GridBox> {
        self.selection
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Committed content with the scratch layer painted over it.
    pub fn layer_view(&self) -> LayerView<'_> {
        LayerView::new(vec![&self.committed, &self.scratch])
    }

    /// Replace the scratch layer.
    pub fn set_scratch(&mut self, scratch: Layer) {
        self.scratch = scratch;
        self.notify(CanvasChange::Scratch);
    }

    /// Modify the scratch layer in place.
    pub fn edit_scratch(&mut self, edit: impl FnOnce(&mut Layer)) {
        edit(&mut self.scratch);
        self.notify(CanvasChange::Scratch);
    }

    /// Throw away uncommitted edits.
    pub fn clear_scratch(&mut self) {
        if self.scratch.is_empty() {
            return;
        }
        self.scratch.clear();
        self.notify(CanvasChange::Scratch);
    }

    /// Merge the scratch layer into committed as one undoable edit.
    ///
    /// Returns whether the committed layer changed.
    pub fn commit_scratch(&mut self) -> bool {
        let scratch = std::mem::take(&mut self.scratch);
        let (committed, undo) = self.committed.apply(&scratch);
        let changed = !undo.is_empty();

        self.committed = committed;
        if changed {
            self.push_undo(undo);
        }
        self.redo_stack.clear();
        log::debug!(
            "Committed {} scratch cells ({} changed)",
            scratch.len(),
            if changed { "some" } else { "none" }
        );
        self.notify(CanvasChange::Committed);
        changed
    }

    /// Revert the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(diff) = self.undo_stack.pop() else {
            return false;
        };
        let (committed, redo) = self.committed.apply(&diff);
        self.committed = committed;
        self.redo_stack.push(redo);
        self.notify(CanvasChange::Committed);
        true
    }

    /// Re-apply the most recently undone edit. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(diff) = self.redo_stack.pop() else {
            return false;
        };
        let (committed, undo) = self.committed.apply(&diff);
        self.committed = committed;
        self.push_undo(undo);
        self.notify(CanvasChange::Committed);
        true
    }

    /// Empty the drawing as one undoable edit.
    pub fn clear(&mut self) {
        let previous = std::mem::take(&mut self.committed);
        if !previous.is_empty() {
            self.push_undo(previous);
        }
        self.redo_stack.clear();
        self.notify(CanvasChange::Committed);
    }

    pub fn set_selection(&mut self, selection: Option<GridBox>) {
        if self.selection == selection {
            return;
        }
        self.selection = selection;
        self.notify(CanvasChange::Selection);
    }

    /// Set the zoom factor, snapped so a cell is a whole number of pixels
    /// high. Non-positive or non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() || zoom <= 0.0 {
            log::warn!("Ignoring invalid zoom {}", zoom);
            return;
        }
        self.zoom = self.metrics.snap_zoom(zoom);
        self.notify(CanvasChange::View);
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Switch to new cell metrics, keeping the same cell at the view centre
    /// and re-snapping the zoom.
    pub fn set_metrics(&mut self, metrics: CellMetrics) {
        if metrics == self.metrics {
            return;
        }
        let stored = self.metrics.to_legacy_offset(self.offset);
        self.metrics = metrics;
        self.offset = metrics.from_legacy_offset(stored);
        self.zoom = metrics.snap_zoom(self.zoom);
        self.notify(CanvasChange::View);
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
        self.notify(CanvasChange::View);
    }

    /// Register a callback run synchronously after every mutation.
    pub fn subscribe(&mut self, subscriber: impl FnMut(CanvasChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Which persisted groups changed since the last save.
    pub fn unsaved(&self) -> UnsavedChanges {
        self.unsaved
    }

    /// Report and reset which persisted groups changed.
    pub fn take_unsaved(&mut self) -> UnsavedChanges {
        std::mem::take(&mut self.unsaved)
    }

    fn push_undo(&mut self, diff: Layer) {
        self.undo_stack.push(diff);
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    fn notify(&mut self, change: CanvasChange) {
        self.revision += 1;
        match change {
            CanvasChange::Committed => self.unsaved.layers = true,
            CanvasChange::View => self.unsaved.view = true,
            CanvasChange::Scratch | CanvasChange::Selection => {}
        }
        for (_, subscriber) in &mut self.subscribers {
            subscriber(change);
        }
    }
}
