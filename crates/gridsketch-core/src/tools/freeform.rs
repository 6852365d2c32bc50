//! Freehand drawing with a single repeated character.

use super::{CursorKind, DrawTool};
use crate::canvas::CanvasState;
use crate::input::{Key, Modifiers};
use crate::vector::Vector;

pub const DEFAULT_FREEFORM_CHARACTER: char = 'x';

/// Cells on the straight path from `a` to `b`, both ends included.
///
/// Fast pointer moves skip cells, so consecutive samples are joined.
pub fn cells_between(a: Vector, b: Vector) -> Vec<Vector> {
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = (b.x - a.x).signum();
    let sy = (b.y - a.y).signum();
    let mut err = dx + dy;
    let mut current = a;
    let mut cells = vec![current];

    while current != b {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            current.x += sx;
        }
        if e2 <= dx {
            err += dx;
            current.y += sy;
        }
        cells.push(current);
    }
    cells
}

#[derive(Debug, Clone)]
pub struct FreeformTool {
    character: char,
    last: Option<Vector>,
}

impl FreeformTool {
    pub fn new(character: char) -> Self {
        Self {
            character,
            last: None,
        }
    }

    pub fn character(&self) -> char {
        self.character
    }

    /// A space paints erase markers.
    pub fn set_character(&mut self, character: char) {
        self.character = character;
    }
}

impl DrawTool for FreeformTool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        self.last = Some(cell);
        let ch = self.character;
        canvas.clear_scratch();
        canvas.edit_scratch(|scratch| scratch.set(cell, ch));
    }

    fn move_to(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        let Some(last) = self.last else {
            return;
        };
        if last == cell {
            return;
        }
        let ch = self.character;
        canvas.edit_scratch(|scratch| {
            for v in cells_between(last, cell) {
                scratch.set(v, ch);
            }
        });
        self.last = Some(cell);
    }

    fn end(&mut self, canvas: &mut CanvasState) {
        if self.last.take().is_some() {
            canvas.commit_scratch();
        }
    }

    fn handle_key(&mut self, _canvas: &mut CanvasState, key: &Key, modifiers: Modifiers) -> bool {
        match key.printable() {
            Some(ch) if !modifiers.command() => {
                self.character = ch;
                true
            }
            _ => false,
        }
    }

    fn cursor(&self, _canvas: &CanvasState, _cell: Vector, _modifiers: Modifiers) -> CursorKind {
        CursorKind::Crosshair
    }

    fn cleanup(&mut self, canvas: &mut CanvasState) {
        self.last = None;
        canvas.clear_scratch();
    }

    fn is_active(&self) -> bool {
        self.last.is_some()
    }
}
