//! The editing session: routes normalized input through the view transform
//! into the active tool and persists the result.

use crate::canvas::CanvasState;
use crate::drawing::{DrawingId, DrawingStore};
use crate::glyphs::CharacterSet;
use crate::input::{Key, Modifiers, PointerEvent, WheelEvent};
use crate::layer::LayerView;
use crate::storage::{Storage, StorageResult};
use crate::text::{layer_to_text, text_to_layer};
use crate::tools::{CursorKind, DrawTool, Tool, ToolKind, ToolManager};
use crate::transform::{CellMetrics, ViewTransform, clamp_cell, drawable_area};
use crate::vector::{GridBox, Vector};
use kurbo::{Point, Size};

/// Zoom factor per pixel of wheel delta.
const WHEEL_ZOOM_SPEED: f64 = 0.002;

/// One user editing drawings held in a [`DrawingStore`].
#[derive(Debug)]
pub struct Editor<S: Storage> {
    store: DrawingStore<S>,
    drawing: DrawingId,
    tools: ToolManager,
    /// Tool to return to when leaving a read-only drawing.
    preferred_tool: ToolKind,
    viewport: Size,
    /// Last cell under the pointer.
    pointer: Option<Vector>,
    pointer_down: bool,
}

impl<S: Storage> Editor<S> {
    /// Open the default drawing with the saved tool settings.
    pub fn new(store: DrawingStore<S>, viewport: Size) -> Self {
        let preferred_tool = store.saved_tool();
        let tools = ToolManager::new(
            preferred_tool,
            store.saved_character_set(),
            store.saved_freeform_character(),
        );
        let mut editor = Self {
            store,
            drawing: DrawingId::default(),
            tools,
            preferred_tool,
            viewport,
            pointer: None,
            pointer_down: false,
        };
        editor.store.canvas(&editor.drawing);
        editor
    }

    pub fn store(&self) -> &DrawingStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DrawingStore<S> {
        &mut self.store
    }

    pub fn drawing(&self) -> &DrawingId {
        &self.drawing
    }

    pub fn is_read_only(&self) -> bool {
        self.drawing.is_read_only()
    }

    /// The canvas of the open drawing.
    pub fn canvas(&mut self) -> &mut CanvasState {
        self.store.canvas(&self.drawing)
    }

    /// Switch to another drawing, saving and abandoning the current one.
    pub fn open(&mut self, id: DrawingId) {
        self.cancel_gesture();
        self.save();
        log::info!("Opening {}", id);
        let previous = std::mem::replace(&mut self.drawing, id);
        if previous.is_read_only() && previous != self.drawing {
            self.store.unload(&previous);
        }
        self.store.canvas(&self.drawing);

        let kind = if self.drawing.is_read_only() {
            ToolKind::Null
        } else {
            self.preferred_tool
        };
        if self.tools.current_tool() != kind {
            let canvas = self.store.canvas(&self.drawing);
            self.tools.set_tool(canvas, kind);
        }
    }

    /// Open the drawing a URL fragment route points to.
    pub fn open_route(&mut self, route: &str) -> bool {
        match DrawingId::from_route(route) {
            Some(id) => {
                self.open(id);
                true
            }
            None => {
                log::warn!("Unknown route {:?}", route);
                false
            }
        }
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool()
    }

    pub fn tool(&self) -> &Tool {
        self.tools.tool()
    }

    /// Select a tool. Ignored on read-only drawings.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.is_read_only() || kind == ToolKind::Null {
            return;
        }
        let canvas = self.store.canvas(&self.drawing);
        self.tools.set_tool(canvas, kind);
        self.preferred_tool = kind;
        log_storage_error(self.store.save_tool(kind));
    }

    pub fn character_set(&self) -> CharacterSet {
        self.tools.character_set()
    }

    pub fn set_character_set(&mut self, charset: CharacterSet) {
        self.tools.set_character_set(charset);
        log_storage_error(self.store.save_character_set(charset));
    }

    pub fn freeform_character(&self) -> char {
        self.tools.freeform_character()
    }

    pub fn set_freeform_character(&mut self, ch: char) {
        self.tools.set_freeform_character(ch);
        log_storage_error(self.store.save_freeform_character(ch));
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Update the measured character cell size.
    pub fn set_cell_metrics(&mut self, metrics: CellMetrics) {
        self.store.set_metrics(metrics);
    }

    /// The transform for the open drawing's current zoom and offset.
    pub fn transform(&mut self) -> ViewTransform {
        let metrics = self.store.metrics();
        let viewport = self.viewport;
        let canvas = self.canvas();
        ViewTransform::new(canvas.zoom(), canvas.offset(), viewport, metrics)
    }

    /// Committed content with the tool's scratch painted over it.
    pub fn layer_view(&mut self) -> LayerView<'_> {
        self.canvas().layer_view()
    }

    /// Box the painter should outline: the selection or the text cursor.
    pub fn highlight(&mut self) -> Option<GridBox> {
        self.canvas().selection()
    }

    /// Cursor to show for a pointer at `position`.
    pub fn cursor(&mut self, position: Point, modifiers: Modifiers) -> CursorKind {
        let cell = self.transform().screen_to_cell(position);
        let canvas = self.store.canvas(&self.drawing);
        self.tools.tool().cursor(canvas, cell, modifiers)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let transform = self.transform();
        let canvas = self.store.canvas(&self.drawing);
        let tool = self.tools.tool_mut();

        match event {
            PointerEvent::Down {
                position,
                modifiers,
            } => {
                let cell = transform.screen_to_cell(position);
                if self.pointer_down {
                    tool.end(canvas);
                }
                self.pointer = Some(cell);
                self.pointer_down = true;
                tool.start(canvas, cell, modifiers);
            }
            PointerEvent::Move {
                position,
                modifiers,
            } => {
                let cell = transform.screen_to_cell(position);
                if self.pointer == Some(cell) {
                    return;
                }
                self.pointer = Some(cell);
                if self.pointer_down {
                    tool.move_to(canvas, cell, modifiers);
                }
            }
            PointerEvent::Up {
                position,
                modifiers,
            } => {
                if !self.pointer_down {
                    return;
                }
                let cell = transform.screen_to_cell(position);
                if self.pointer != Some(cell) {
                    self.pointer = Some(cell);
                    tool.move_to(canvas, cell, modifiers);
                }
                self.pointer_down = false;
                tool.end(canvas);
            }
            PointerEvent::Cancel => {
                self.cancel_gesture();
                return;
            }
        }
        self.save();
    }

    /// Pan, or zoom around the pointer when ctrl/meta is held.
    pub fn handle_wheel(&mut self, event: WheelEvent) {
        let mut transform = self.transform();
        if event.modifiers.command() {
            transform.zoom_at(event.position, (-event.delta.y * WHEEL_ZOOM_SPEED).exp());
        } else {
            transform.pan(event.delta);
        }

        let canvas = self.canvas();
        canvas.set_zoom(transform.zoom);
        canvas.set_offset(transform.offset);
        self.save();
    }

    /// Handle a key press. Returns whether it was consumed.
    pub fn handle_key(&mut self, key: &Key, modifiers: Modifiers) -> bool {
        if modifiers.command() {
            match key {
                Key::Char('z' | 'Z') if modifiers.shift => return self.redo(),
                Key::Char('z' | 'Z') => return self.undo(),
                Key::Char('y' | 'Y') => return self.redo(),
                _ => {}
            }
        }

        let before = self.tools.freeform_character();
        let canvas = self.store.canvas(&self.drawing);
        let handled = self.tools.handle_key(canvas, key, modifiers);
        let after = self.tools.freeform_character();
        if after != before {
            log_storage_error(self.store.save_freeform_character(after));
        }
        self.save();
        handled
    }

    /// Abandon the gesture in progress without committing.
    pub fn cancel_gesture(&mut self) {
        self.pointer_down = false;
        let canvas = self.store.canvas(&self.drawing);
        self.tools.tool_mut().cleanup(canvas);
    }

    pub fn undo(&mut self) -> bool {
        if self.is_read_only() {
            return false;
        }
        self.cancel_gesture();
        let undone = self.canvas().undo();
        self.save();
        undone
    }

    pub fn redo(&mut self) -> bool {
        if self.is_read_only() {
            return false;
        }
        self.cancel_gesture();
        let redone = self.canvas().redo();
        self.save();
        redone
    }

    /// Empty the drawing as one undoable step.
    pub fn clear(&mut self) -> bool {
        if self.is_read_only() {
            return false;
        }
        self.cancel_gesture();
        self.canvas().clear();
        self.save();
        true
    }

    /// Commit `text` as one undoable edit at the text cursor or selection,
    /// else at the pointer, else at the centre of the view.
    ///
    /// The block is shifted to fit the drawable area; what still does not fit
    /// is dropped.
    pub fn paste(&mut self, text: &str) -> bool {
        if self.is_read_only() {
            return false;
        }
        let layer = text_to_layer(text, Vector::ZERO);
        let Some(bounds) = layer.bounds() else {
            return false;
        };

        let transform = self.transform();
        let centre = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        let canvas = self.store.canvas(&self.drawing);
        let origin = canvas
            .selection()
            .map(|area| area.top_left())
            .or(self.pointer)
            .unwrap_or_else(|| transform.screen_to_cell(centre));
        let origin = clamp_cell(origin);
        let drawable = drawable_area();
        let origin = origin
            + GridBox::new(origin, origin + bounds.bottom_right())
                .clamp_translation(Vector::ZERO, &drawable);

        if !canvas.scratch().is_empty() {
            canvas.commit_scratch();
        }
        self.tools.tool_mut().cleanup(canvas);
        self.pointer_down = false;

        let mut pasted = text_to_layer(text, origin);
        pasted.retain(|v, _| drawable.contains(v));
        canvas.set_scratch(pasted);
        canvas.commit_scratch();
        if self.tools.current_tool() == ToolKind::Select {
            // Leading blank rows and columns belong to the pasted area.
            let area = GridBox::new(origin, clamp_cell(origin + bounds.bottom_right()));
            canvas.set_selection(Some(area));
        }
        self.save();
        true
    }

    /// Text of the selection, for copying. Only the select tool has one.
    pub fn copy(&mut self) -> Option<String> {
        let canvas = self.store.canvas(&self.drawing);
        self.tools.selected_text(canvas)
    }

    /// Erase the selection and return its text.
    pub fn cut(&mut self) -> Option<String> {
        if self.is_read_only() {
            return None;
        }
        let canvas = self.store.canvas(&self.drawing);
        let text = self.tools.cut_selection(canvas);
        self.save();
        text
    }

    /// The drawing as plain text, or only the selection when one exists.
    pub fn export_text(&mut self) -> String {
        let selecting = self.tools.current_tool() == ToolKind::Select;
        let canvas = self.canvas();
        let area = canvas.selection().filter(|_| selecting);
        layer_to_text(canvas.committed(), area)
    }

    /// A read-only share id for the open drawing.
    pub fn share_link(&mut self) -> DrawingId {
        self.store.share_link(&self.drawing)
    }

    /// Copy the open drawing into a new local drawing and open it.
    pub fn save_as(&mut self, name: &str) -> StorageResult<DrawingId> {
        self.cancel_gesture();
        let id = self.store.save_shared(&self.drawing, name)?;
        self.open(id.clone());
        Ok(id)
    }

    /// Write pending changes of the open drawing, logging failures.
    pub fn save(&mut self) {
        log_storage_error(self.flush());
    }

    /// Write pending changes of the open drawing.
    ///
    /// Changes that failed to save earlier are retried.
    pub fn flush(&mut self) -> StorageResult<()> {
        self.store.persist(&self.drawing)
    }
}

fn log_storage_error(result: StorageResult<()>) {
    if let Err(e) = result {
        log::warn!("Failed to save: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Drawing, ShareStringifier, Stringifier};
    use crate::storage::{FailingStorage, MemoryStorage};
    use crate::transform::{MAX_GRID_HEIGHT, MAX_GRID_WIDTH};
    use kurbo::Vec2;

    const VIEWPORT: Size = Size::new(800.0, 600.0);

    fn editor() -> Editor<MemoryStorage> {
        Editor::new(DrawingStore::new(MemoryStorage::new()), VIEWPORT)
    }

    fn screen(editor: &mut Editor<MemoryStorage>, cell: Vector) -> Point {
        editor.transform().cell_to_screen(cell)
    }

    fn drag(editor: &mut Editor<MemoryStorage>, from: Vector, to: Vector) {
        let modifiers = Modifiers::NONE;
        let position = screen(editor, from);
        editor.handle_pointer(PointerEvent::Down { position, modifiers });
        let position = screen(editor, to);
        editor.handle_pointer(PointerEvent::Move { position, modifiers });
        editor.handle_pointer(PointerEvent::Up { position, modifiers });
    }

    fn type_text(editor: &mut Editor<MemoryStorage>, text: &str) {
        for ch in text.chars() {
            editor.handle_key(&Key::Char(ch), Modifiers::NONE);
        }
    }

    #[test]
    fn test_box_drag_through_transform() {
        let mut editor = editor();
        drag(&mut editor, Vector::new(998, 299), Vector::new(1002, 302));
        assert_eq!(editor.export_text(), "┌───┐\n│   │\n│   │\n└───┘");
        assert_eq!(editor.canvas().committed().len(), 14);

        assert!(editor.handle_key(&Key::Char('z'), Modifiers::ctrl()));
        assert_eq!(editor.export_text(), "");
        let redo = Modifiers {
            shift: true,
            meta: true,
            ..Modifiers::NONE
        };
        assert!(editor.handle_key(&Key::Char('Z'), redo));
        assert_eq!(editor.export_text(), "┌───┐\n│   │\n│   │\n└───┘");
        assert!(editor.undo());
        assert!(editor.handle_key(&Key::Char('y'), Modifiers::ctrl()));
        assert!(!editor.canvas().can_redo());
    }

    #[test]
    fn test_edits_are_persisted() {
        let mut editor = editor();
        editor.open(DrawingId::local("notes"));
        editor.set_tool(ToolKind::Text);
        let position = screen(&mut editor, Vector::new(10, 10));
        editor.handle_pointer(PointerEvent::Down {
            position,
            modifiers: Modifiers::NONE,
        });
        editor.handle_pointer(PointerEvent::Up {
            position,
            modifiers: Modifiers::NONE,
        });
        type_text(&mut editor, "saved");
        editor.handle_key(&Key::Enter, Modifiers::NONE);

        let storage = editor.store().storage().clone();
        let mut reopened = Editor::new(DrawingStore::new(storage), VIEWPORT);
        assert_eq!(reopened.current_tool(), ToolKind::Text);
        reopened.open(DrawingId::local("notes"));
        assert_eq!(reopened.export_text(), "saved");
        assert_eq!(reopened.store().local_drawings(), vec!["notes".to_string()]);
    }

    #[test]
    fn test_shared_drawing_is_read_only() {
        let mut editor = editor();
        let layer = text_to_layer("look", Vector::new(5, 5));
        let payload = ShareStringifier.encode(&Drawing::new("demo", layer));
        assert!(editor.open_route(&format!("#/share/{}", payload)));

        assert!(editor.is_read_only());
        assert_eq!(editor.current_tool(), ToolKind::Null);
        editor.set_tool(ToolKind::Box);
        assert_eq!(editor.current_tool(), ToolKind::Null);

        drag(&mut editor, Vector::new(1, 1), Vector::new(8, 8));
        assert!(!editor.paste("more"));
        assert!(!editor.undo());
        assert!(!editor.clear());
        assert_eq!(editor.export_text(), "look");

        editor.open(DrawingId::default());
        assert_eq!(editor.current_tool(), ToolKind::Box);
    }

    #[test]
    fn test_save_shared_as_local() {
        let mut editor = editor();
        let layer = text_to_layer("copy me", Vector::new(5, 5));
        let share = DrawingId::share(ShareStringifier.encode(&Drawing::new("demo", layer)));
        editor.open(share);

        let id = editor.save_as("mine").unwrap();
        assert_eq!(editor.drawing(), &id);
        assert!(!editor.is_read_only());
        assert_eq!(editor.export_text(), "copy me");
        assert_eq!(editor.current_tool(), ToolKind::Box);
    }

    #[test]
    fn test_wheel_pans_and_zooms() {
        let mut editor = editor();
        let start = editor.canvas().offset();
        editor.handle_wheel(WheelEvent {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, 40.0),
            modifiers: Modifiers::NONE,
        });
        let panned = editor.canvas().offset();
        assert!((panned.y - start.y - 40.0).abs() < 1e-9);
        assert!((editor.canvas().zoom() - 1.0).abs() < f64::EPSILON);

        editor.handle_wheel(WheelEvent {
            position: Point::new(100.0, 100.0),
            delta: Vec2::new(0.0, -200.0),
            modifiers: Modifiers::ctrl(),
        });
        let zoom = editor.canvas().zoom();
        assert!(zoom > 1.0);
        let px = zoom * editor.store().metrics().height;
        assert!((px - px.round()).abs() < 1e-9);
    }

    #[test]
    fn test_paste_at_pointer() {
        let mut editor = editor();
        let position = screen(&mut editor, Vector::new(20, 20));
        editor.handle_pointer(PointerEvent::Move {
            position,
            modifiers: Modifiers::NONE,
        });
        assert!(editor.paste("a b\r\nc"));
        assert_eq!(editor.canvas().committed().get(Vector::new(20, 20)), Some('a'));
        assert_eq!(editor.canvas().committed().get(Vector::new(20, 21)), Some('c'));
        assert_eq!(editor.export_text(), "a b\nc");

        assert!(editor.undo());
        assert!(editor.canvas().committed().is_empty());
        assert!(!editor.paste(" \n\t"));
    }

    #[test]
    fn test_select_copy_cut_and_export() {
        let mut editor = editor();
        editor.paste("abc\ndef");
        let origin = editor.canvas().committed().bounds().unwrap().top_left();

        editor.set_tool(ToolKind::Select);
        drag(&mut editor, origin + Vector::new(1, 0), origin + Vector::new(2, 1));
        assert_eq!(editor.copy().as_deref(), Some("bc\nef"));
        assert_eq!(editor.export_text(), "bc\nef");

        assert_eq!(editor.cut().as_deref(), Some("bc\nef"));
        editor.set_tool(ToolKind::Box);
        assert_eq!(editor.export_text(), "a\nd");
    }

    #[test]
    fn test_freeform_character_setting() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Freeform);
        assert!(editor.handle_key(&Key::Char('o'), Modifiers::NONE));
        assert_eq!(editor.store().saved_freeform_character(), 'o');

        editor.set_character_set(CharacterSet::Ascii);
        assert_eq!(editor.store().saved_character_set(), CharacterSet::Ascii);
    }

    #[test]
    fn test_cancel_discards_gesture() {
        let mut editor = editor();
        let modifiers = Modifiers::NONE;
        let position = screen(&mut editor, Vector::new(5, 5));
        editor.handle_pointer(PointerEvent::Down { position, modifiers });
        let position = screen(&mut editor, Vector::new(9, 9));
        editor.handle_pointer(PointerEvent::Move { position, modifiers });
        assert!(!editor.canvas().scratch().is_empty());

        editor.handle_pointer(PointerEvent::Cancel);
        editor.handle_pointer(PointerEvent::Up { position, modifiers });
        assert!(editor.canvas().scratch().is_empty());
        assert!(editor.canvas().committed().is_empty());
    }

    #[test]
    fn test_text_cursor_is_highlighted() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Text);
        let position = screen(&mut editor, Vector::new(7, 3));
        editor.handle_pointer(PointerEvent::Down {
            position,
            modifiers: Modifiers::NONE,
        });
        assert_eq!(editor.highlight(), Some(GridBox::cell(Vector::new(7, 3))));
        assert_eq!(
            editor.cursor(position, Modifiers::NONE),
            CursorKind::Text
        );
    }

    #[test]
    fn test_paste_fits_drawable_area() {
        let mut editor = editor();
        let corner = Vector::new(MAX_GRID_WIDTH - 2, MAX_GRID_HEIGHT - 2);
        let position = screen(&mut editor, corner);
        editor.handle_pointer(PointerEvent::Move {
            position,
            modifiers: Modifiers::NONE,
        });
        assert!(editor.paste("abc\ndef"));

        let committed = editor.canvas().committed().clone();
        assert_eq!(committed.get(corner - Vector::new(2, 1)), Some('a'));
        assert_eq!(committed.get(corner), Some('f'));
        assert!(committed.keys().iter().all(|v| drawable_area().contains(*v)));
    }

    #[test]
    fn test_leaving_shared_drawing_unloads_it() {
        let mut editor = editor();
        let layer = text_to_layer("gone", Vector::new(5, 5));
        let share = DrawingId::share(ShareStringifier.encode(&Drawing::new("demo", layer)));
        editor.open(share.clone());
        assert!(editor.store().loaded(&share).is_some());

        editor.open(DrawingId::local("mine"));
        assert!(editor.store().loaded(&share).is_none());
        assert!(editor.store().loaded(&DrawingId::default()).is_some());
    }

    #[test]
    fn test_flush_reports_and_retries_failed_writes() {
        let storage = FailingStorage {
            failing_writes: 2,
            ..FailingStorage::default()
        };
        let mut editor = Editor::new(DrawingStore::new(storage), VIEWPORT);
        editor.open(DrawingId::local("imported"));

        assert!(editor.paste("text"));
        assert!(editor.flush().is_err());
        editor.flush().unwrap();

        let storage = editor.store().storage();
        assert!(storage.inner.get("drawing/imported/committed-layer").unwrap().is_some());
        assert!(editor.flush().is_ok());
    }
}
