//! Rectangular selection, moving, deleting and cutting.

use super::{CursorKind, DrawTool};
use crate::canvas::CanvasState;
use crate::input::{Key, Modifiers};
use crate::layer::Layer;
use crate::text::layer_to_text;
use crate::transform::drawable_area;
use crate::vector::{GridBox, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Idle,
    /// Dragging out a new selection.
    Selecting { anchor: Vector, dragged: bool },
    /// Dragging the selected content.
    Moving { origin: Vector, source: GridBox },
}

/// Selects a box of cells. Dragging inside the selection moves its content,
/// stopping at the edge of the drawable area; shift forces a new selection
/// instead.
#[derive(Debug, Clone, Default)]
pub struct SelectTool {
    mode: Mode,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed content of the selection as text.
    pub fn selected_text(&self, canvas: &CanvasState) -> Option<String> {
        canvas
            .selection()
            .map(|area| layer_to_text(canvas.committed(), Some(area)))
    }

    /// Erase the selection's content and return it as text.
    pub fn cut_selection(&mut self, canvas: &mut CanvasState) -> Option<String> {
        let text = self.selected_text(canvas)?;
        self.erase_selection(canvas);
        Some(text)
    }

    /// Erase everything inside the selection as one undoable edit.
    pub fn erase_selection(&mut self, canvas: &mut CanvasState) -> bool {
        let Some(area) = canvas.selection() else {
            return false;
        };
        let mut erase = Layer::new();
        for (v, _) in canvas.committed().glyphs() {
            if area.contains(v) {
                erase.delete(v);
            }
        }
        canvas.set_scratch(erase);
        canvas.commit_scratch()
    }

    /// The diff that moves the glyphs in `source` by `delta`.
    fn moved_content(committed: &Layer, source: GridBox, delta: Vector) -> Layer {
        let mut layer = Layer::new();
        let glyphs: Vec<(Vector, char)> = committed
            .glyphs()
            .filter(|(v, _)| source.contains(*v))
            .collect();
        for (v, _) in &glyphs {
            layer.delete(*v);
        }
        for (v, ch) in glyphs {
            layer.set(v + delta, ch);
        }
        layer
    }
}

impl DrawTool for SelectTool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, modifiers: Modifiers) {
        match canvas.selection() {
            Some(source) if source.contains(cell) && !modifiers.shift => {
                self.mode = Mode::Moving {
                    origin: cell,
                    source,
                };
            }
            _ => {
                self.mode = Mode::Selecting {
                    anchor: cell,
                    dragged: false,
                };
                canvas.set_selection(Some(GridBox::cell(cell)));
            }
        }
    }

    fn move_to(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        match &mut self.mode {
            Mode::Idle => {}
            Mode::Selecting { anchor, dragged } => {
                *dragged |= cell != *anchor;
                canvas.set_selection(Some(GridBox::new(*anchor, cell)));
            }
            Mode::Moving { origin, source } => {
                let source = *source;
                let delta = source.clamp_translation(cell - *origin, &drawable_area());
                if delta == Vector::ZERO {
                    canvas.clear_scratch();
                } else {
                    let scratch = Self::moved_content(canvas.committed(), source, delta);
                    canvas.set_scratch(scratch);
                }
                canvas.set_selection(Some(source.translate(delta)));
            }
        }
    }

    fn end(&mut self, canvas: &mut CanvasState) {
        match std::mem::take(&mut self.mode) {
            Mode::Idle => {}
            Mode::Selecting { dragged: false, .. } => canvas.set_selection(None),
            Mode::Selecting { .. } => {}
            Mode::Moving { .. } => {
                if !canvas.scratch().is_empty() {
                    canvas.commit_scratch();
                }
            }
        }
    }

    fn handle_key(&mut self, canvas: &mut CanvasState, key: &Key, _modifiers: Modifiers) -> bool {
        match key {
            Key::Delete | Key::Backspace if canvas.selection().is_some() => {
                self.erase_selection(canvas);
                true
            }
            Key::Escape if canvas.selection().is_some() => {
                canvas.set_selection(None);
                true
            }
            _ => false,
        }
    }

    fn cursor(&self, canvas: &CanvasState, cell: Vector, modifiers: Modifiers) -> CursorKind {
        match canvas.selection() {
            Some(area) if area.contains(cell) && !modifiers.shift => CursorKind::Move,
            _ => CursorKind::Crosshair,
        }
    }

    fn cleanup(&mut self, canvas: &mut CanvasState) {
        self.mode = Mode::Idle;
        canvas.clear_scratch();
        canvas.set_selection(None);
    }

    fn is_active(&self) -> bool {
        self.mode != Mode::Idle
    }
}
