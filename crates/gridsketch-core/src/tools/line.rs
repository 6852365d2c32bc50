//! Line and arrow tools.

use super::{CursorKind, DrawTool};
use crate::canvas::CanvasState;
use crate::glyphs::{CharacterSet, Directions, Strokes};
use crate::input::Modifiers;
use crate::layer::Layer;
use crate::vector::Vector;

/// Draws a line with at most one bend, optionally ending in an arrowhead.
#[derive(Debug, Clone)]
pub struct LineTool {
    charset: CharacterSet,
    arrow: bool,
    start: Option<Vector>,
}

impl LineTool {
    pub fn line(charset: CharacterSet) -> Self {
        Self {
            charset,
            arrow: false,
            start: None,
        }
    }

    pub fn arrow(charset: CharacterSet) -> Self {
        Self {
            arrow: true,
            ..Self::line(charset)
        }
    }

    pub fn set_character_set(&mut self, charset: CharacterSet) {
        self.charset = charset;
    }

    pub fn is_arrow(&self) -> bool {
        self.arrow
    }

    /// Where the path from `start` to `end` turns.
    ///
    /// The longer axis is drawn first; shift swaps the order.
    pub fn bend(start: Vector, end: Vector, modifiers: Modifiers) -> Vector {
        let delta = end - start;
        let horizontal_first = (delta.x.abs() >= delta.y.abs()) != modifiers.shift;
        if horizontal_first {
            Vector::new(end.x, start.y)
        } else {
            Vector::new(start.x, end.y)
        }
    }

    fn path(&self, base: &Layer, start: Vector, end: Vector, modifiers: Modifiers) -> Layer {
        if start == end {
            return Layer::new();
        }

        let bend = Self::bend(start, end, modifiers);
        let mut strokes = Strokes::new();
        strokes.segment(start, bend);
        strokes.segment(bend, end);
        let mut layer = strokes.render(base, self.charset);

        if self.arrow {
            let heading = if bend == end {
                Directions::toward(start, bend)
            } else {
                Directions::toward(bend, end)
            };
            layer.set(end, self.charset.arrow_head(heading));
        }
        layer
    }
}

impl DrawTool for LineTool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        self.start = Some(cell);
        canvas.clear_scratch();
    }

    fn move_to(&mut self, canvas: &mut CanvasState, cell: Vector, modifiers: Modifiers) {
        if let Some(start) = self.start {
            let scratch = self.path(canvas.committed(), start, cell, modifiers);
            canvas.set_scratch(scratch);
        }
    }

    fn end(&mut self, canvas: &mut CanvasState) {
        if self.start.take().is_some() {
            canvas.commit_scratch();
        }
    }

    fn cursor(&self, _canvas: &CanvasState, _cell: Vector, _modifiers: Modifiers) -> CursorKind {
        CursorKind::Crosshair
    }

    fn cleanup(&mut self, canvas: &mut CanvasState) {
        self.start = None;
        canvas.clear_scratch();
    }

    fn is_active(&self) -> bool {
        self.start.is_some()
    }
}
