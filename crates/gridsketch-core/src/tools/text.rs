//! Typing text onto the grid.

use super::{CursorKind, DrawTool};
use crate::canvas::CanvasState;
use crate::input::{Key, Modifiers};
use crate::transform::clamp_cell;
use crate::vector::{GridBox, Vector};

/// Places a text cursor on click and types into the scratch layer.
///
/// The cursor cell is shown as the canvas selection. Typed text stays
/// uncommitted until Enter, Escape, or a click elsewhere.
#[derive(Debug, Clone, Default)]
pub struct TextTool {
    cursor: Option<Vector>,
    /// Column that a newline returns to.
    start_column: i32,
}

impl TextTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_cursor(&self) -> Option<Vector> {
        self.cursor
    }

    fn place_cursor(&mut self, canvas: &mut CanvasState, cell: Vector) {
        let cell = clamp_cell(cell);
        self.cursor = Some(cell);
        canvas.set_selection(Some(GridBox::cell(cell)));
    }

    fn finish(&mut self, canvas: &mut CanvasState) {
        if !canvas.scratch().is_empty() {
            canvas.commit_scratch();
        }
        self.cursor = None;
        canvas.set_selection(None);
    }
}

impl DrawTool for TextTool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, _modifiers: Modifiers) {
        if !canvas.scratch().is_empty() {
            canvas.commit_scratch();
        }
        self.start_column = cell.x;
        self.place_cursor(canvas, cell);
    }

    fn move_to(&mut self, _canvas: &mut CanvasState, _cell: Vector, _modifiers: Modifiers) {}

    fn end(&mut self, _canvas: &mut CanvasState) {}

    fn handle_key(&mut self, canvas: &mut CanvasState, key: &Key, modifiers: Modifiers) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };

        match key {
            Key::Enter if modifiers.shift || modifiers.ctrl => {
                let next = Vector::new(self.start_column, cursor.y + 1);
                self.place_cursor(canvas, next);
            }
            Key::Enter | Key::Escape => self.finish(canvas),
            Key::Backspace => {
                let target = clamp_cell(cursor + Vector::LEFT);
                if target != cursor {
                    canvas.edit_scratch(|scratch| scratch.delete(target));
                    self.place_cursor(canvas, target);
                }
            }
            Key::Delete => canvas.edit_scratch(|scratch| scratch.delete(cursor)),
            _ => {
                if let Some(step) = key.arrow_step() {
                    self.place_cursor(canvas, cursor + step);
                    return true;
                }
                match key.printable() {
                    Some(ch) if !modifiers.command() => {
                        canvas.edit_scratch(|scratch| scratch.set(cursor, ch));
                        self.place_cursor(canvas, cursor + Vector::RIGHT);
                    }
                    _ => return false,
                }
            }
        }
        true
    }

    fn cursor(&self, _canvas: &CanvasState, _cell: Vector, _modifiers: Modifiers) -> CursorKind {
        CursorKind::Text
    }

    fn cleanup(&mut self, canvas: &mut CanvasState) {
        self.cursor = None;
        canvas.clear_scratch();
        canvas.set_selection(None);
    }

    fn is_active(&self) -> bool {
        self.cursor.is_some()
    }
}
