//! Rectangle tool.

use super::{CursorKind, DrawTool};
use crate::canvas::CanvasState;
use crate::glyphs::{CharacterSet, Strokes};
use crate::input::Modifiers;
use crate::layer::Layer;
use crate::vector::{GridBox, Vector};

/// Draws a box outline between the drag start and the pointer.
#[derive(Debug, Clone)]
pub struct BoxTool {
    charset: CharacterSet,
    anchor: Option<Vector>,
}

impl BoxTool {
    pub fn new(charset: CharacterSet) -> Self {
        Self {
            charset,
            anchor: None,
        }
    }

    pub fn set_character_set(&mut self, charset: CharacterSet) {
        self.charset = charset;
    }

    /// The outline of `area`, merged with line glyphs already in `base`.
    pub fn outline(area: GridBox, base: &Layer, charset: CharacterSet) -> Layer {
        let mut strokes = Strokes::new();
        strokes.segment(area.top_left(), area.top_right());
        strokes.segment(area.bottom_left(), area.bottom_right());
        strokes.segment(area.top_left(), area.bottom_left());
        strokes.segment(area.top_right(), area.bottom_right());
        strokes.render(base, charset)
    }

    fn redraw(&self, canvas: &mut CanvasState, cell: Vector) {
        if let Some(anchor) = self.anchor {
            let scratch = Self::outline(GridBox::new(anchor, cell), canvas.committed(), self.charset);
            canvas.set_scratch(scratch);
        }
    }
}

impl DrawTool for BoxTool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        self.anchor = Some(cell);
        self.redraw(canvas, cell);
    }

    fn move_to(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        self.redraw(canvas, cell);
    }

    fn end(&mut self, canvas: &mut CanvasState) {
        if self.anchor.take().is_some() {
            canvas.commit_scratch();
        }
    }

    fn cursor(&self, _canvas: &CanvasState, _cell: Vector, _modifiers: Modifiers) -> CursorKind {
        CursorKind::Crosshair
    }

    fn cleanup(&mut self, canvas: &mut CanvasState) {
        self.anchor = None;
        canvas.clear_scratch();
    }

    fn is_active(&self) -> bool {
        self.anchor.is_some()
    }
}
