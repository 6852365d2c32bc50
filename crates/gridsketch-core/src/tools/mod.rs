//! Draw tools: state machines turning pointer gestures and keys into edits.
//!
//! Every tool writes its in-progress edit to the canvas scratch layer and
//! commits it as a single undoable step.

mod box_tool;
mod freeform;
mod line;
mod select;
mod text;

pub use box_tool::BoxTool;
pub use freeform::{DEFAULT_FREEFORM_CHARACTER, FreeformTool, cells_between};
pub use line::LineTool;
pub use select::SelectTool;
pub use text::TextTool;

use crate::canvas::CanvasState;
use crate::glyphs::CharacterSet;
use crate::input::{Key, Modifiers};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Box,
    Line,
    Arrow,
    Freeform,
    Text,
    Select,
    /// Inert tool for read-only drawings.
    Null,
}

/// Pointer cursor a tool wants shown over a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
    Default,
    Crosshair,
    Text,
    Move,
}

/// The interface shared by every tool.
///
/// `start` moves a tool from idle to active, `end` finishes the gesture and
/// `cleanup` abandons it without committing.
pub trait DrawTool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, modifiers: Modifiers);

    fn move_to(&mut self, canvas: &mut CanvasState, cell: Vector, modifiers: Modifiers);

    fn end(&mut self, canvas: &mut CanvasState);

    /// Returns whether the key was consumed.
    fn handle_key(&mut self, _canvas: &mut CanvasState, _key: &Key, _modifiers: Modifiers) -> bool {
        false
    }

    fn cursor(&self, canvas: &CanvasState, cell: Vector, modifiers: Modifiers) -> CursorKind;

    fn cleanup(&mut self, canvas: &mut CanvasState);

    fn is_active(&self) -> bool;
}

/// Does nothing; used for drawings that cannot be edited.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTool;

impl DrawTool for NullTool {
    fn start(&mut self, _canvas: &mut CanvasState, _cell: Vector, _modifiers: Modifiers) {}

    fn move_to(&mut self, _canvas: &mut CanvasState, _cell: Vector, _modifiers: Modifiers) {}

    fn end(&mut self, _canvas: &mut CanvasState) {}

    fn cursor(&self, _canvas: &CanvasState, _cell: Vector, _modifiers: Modifiers) -> CursorKind {
        CursorKind::Default
    }

    fn cleanup(&mut self, _canvas: &mut CanvasState) {}

    fn is_active(&self) -> bool {
        false
    }
}

/// The closed set of tools.
#[derive(Debug, Clone)]
pub enum Tool {
    Box(BoxTool),
    Line(LineTool),
    Arrow(LineTool),
    Freeform(FreeformTool),
    Text(TextTool),
    Select(SelectTool),
    Null(NullTool),
}

impl Tool {
    /// Build an idle tool of the given kind.
    pub fn new(kind: ToolKind, charset: CharacterSet, freeform_character: char) -> Self {
        match kind {
            ToolKind::Box => Tool::Box(BoxTool::new(charset)),
            ToolKind::Line => Tool::Line(LineTool::line(charset)),
            ToolKind::Arrow => Tool::Arrow(LineTool::arrow(charset)),
            ToolKind::Freeform => Tool::Freeform(FreeformTool::new(freeform_character)),
            ToolKind::Text => Tool::Text(TextTool::new()),
            ToolKind::Select => Tool::Select(SelectTool::new()),
            ToolKind::Null => Tool::Null(NullTool),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::Box(_) => ToolKind::Box,
            Tool::Line(_) => ToolKind::Line,
            Tool::Arrow(_) => ToolKind::Arrow,
            Tool::Freeform(_) => ToolKind::Freeform,
            Tool::Text(_) => ToolKind::Text,
            Tool::Select(_) => ToolKind::Select,
            Tool::Null(_) => ToolKind::Null,
        }
    }

    fn as_tool(&self) -> &dyn DrawTool {
        match self {
            Tool::Box(t) => t,
            Tool::Line(t) | Tool::Arrow(t) => t,
            Tool::Freeform(t) => t,
            Tool::Text(t) => t,
            Tool::Select(t) => t,
            Tool::Null(t) => t,
        }
    }

    fn as_tool_mut(&mut self) -> &mut dyn DrawTool {
        match self {
            Tool::Box(t) => t,
            Tool::Line(t) | Tool::Arrow(t) => t,
            Tool::Freeform(t) => t,
            Tool::Text(t) => t,
            Tool::Select(t) => t,
            Tool::Null(t) => t,
        }
    }
}

impl DrawTool for Tool {
    fn start(&mut self, canvas: &mut CanvasState, cell: Vector, modifiers: Modifiers) {
        self.as_tool_mut().start(canvas, cell, modifiers);
    }

    fn move_to(&mut self, canvas: &mut CanvasState, cell: Vector, modifiers: Modifiers) {
        self.as_tool_mut().move_to(canvas, cell, modifiers);
    }

    fn end(&mut self, canvas: &mut CanvasState) {
        self.as_tool_mut().end(canvas);
    }

    fn handle_key(&mut self, canvas: &mut CanvasState, key: &Key, modifiers: Modifiers) -> bool {
        self.as_tool_mut().handle_key(canvas, key, modifiers)
    }

    fn cursor(&self, canvas: &CanvasState, cell: Vector, modifiers: Modifiers) -> CursorKind {
        self.as_tool().cursor(canvas, cell, modifiers)
    }

    fn cleanup(&mut self, canvas: &mut CanvasState) {
        self.as_tool_mut().cleanup(canvas);
    }

    fn is_active(&self) -> bool {
        self.as_tool().is_active()
    }
}

/// Manages the current tool and the settings new tools are built with.
#[derive(Debug, Clone)]
pub struct ToolManager {
    tool: Tool,
    charset: CharacterSet,
    freeform_character: char,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(ToolKind::default(), CharacterSet::default(), DEFAULT_FREEFORM_CHARACTER)
    }
}

impl ToolManager {
    pub fn new(kind: ToolKind, charset: CharacterSet, freeform_character: char) -> Self {
        Self {
            tool: Tool::new(kind, charset, freeform_character),
            charset,
            freeform_character,
        }
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut Tool {
        &mut self.tool
    }

    pub fn character_set(&self) -> CharacterSet {
        self.charset
    }

    pub fn freeform_character(&self) -> char {
        self.freeform_character
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, canvas: &mut CanvasState, kind: ToolKind) {
        self.tool.cleanup(canvas);
        self.tool = Tool::new(kind, self.charset, self.freeform_character);
        log::debug!("Switched to {:?} tool", kind);
    }

    /// Change the line character set. Applies to the next redraw.
    pub fn set_character_set(&mut self, charset: CharacterSet) {
        self.charset = charset;
        match &mut self.tool {
            Tool::Box(t) => t.set_character_set(charset),
            Tool::Line(t) | Tool::Arrow(t) => t.set_character_set(charset),
            _ => {}
        }
    }

    pub fn set_freeform_character(&mut self, ch: char) {
        self.freeform_character = ch;
        if let Tool::Freeform(t) = &mut self.tool {
            t.set_character(ch);
        }
    }

    /// Forward a key to the tool, tracking freeform character changes.
    pub fn handle_key(&mut self, canvas: &mut CanvasState, key: &Key, modifiers: Modifiers) -> bool {
        let handled = self.tool.handle_key(canvas, key, modifiers);
        if let Tool::Freeform(t) = &self.tool {
            self.freeform_character = t.character();
        }
        handled
    }

    /// Remove the selected content and return it as text.
    ///
    /// Only the select tool has a selection to cut.
    pub fn cut_selection(&mut self, canvas: &mut CanvasState) -> Option<String> {
        match &mut self.tool {
            Tool::Select(t) => t.cut_selection(canvas),
            _ => None,
        }
    }

    /// The selected content as text, for copying.
    pub fn selected_text(&self, canvas: &CanvasState) -> Option<String> {
        match &self.tool {
            Tool::Select(t) => t.selected_text(canvas),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::layer_to_text;

    #[test]
    fn test_tool_selection() {
        let mut canvas = CanvasState::new();
        let mut tm = ToolManager::default();
        assert_eq!(tm.current_tool(), ToolKind::Box);

        tm.set_tool(&mut canvas, ToolKind::Arrow);
        assert_eq!(tm.current_tool(), ToolKind::Arrow);
    }

    #[test]
    fn test_switching_tools_abandons_gesture() {
        let mut canvas = CanvasState::new();
        let mut tm = ToolManager::default();

        tm.tool_mut().start(&mut canvas, Vector::new(1, 1), Modifiers::NONE);
        tm.tool_mut().move_to(&mut canvas, Vector::new(4, 3), Modifiers::NONE);
        assert!(tm.tool().is_active());
        assert!(!canvas.scratch().is_empty());

        tm.set_tool(&mut canvas, ToolKind::Line);
        assert!(!tm.tool().is_active());
        assert!(canvas.scratch().is_empty());
        assert!(canvas.committed().is_empty());
    }

    #[test]
    fn test_null_tool_is_inert() {
        let mut canvas = CanvasState::new();
        let mut tm = ToolManager::new(ToolKind::Null, CharacterSet::Unicode, 'x');
        let revision = canvas.revision();

        let tool = tm.tool_mut();
        tool.start(&mut canvas, Vector::new(1, 1), Modifiers::NONE);
        tool.move_to(&mut canvas, Vector::new(5, 5), Modifiers::NONE);
        tool.end(&mut canvas);
        assert!(!tm.handle_key(&mut canvas, &Key::Char('a'), Modifiers::NONE));
        assert_eq!(canvas.revision(), revision);
        assert_eq!(
            tm.tool().cursor(&canvas, Vector::new(1, 1), Modifiers::NONE),
            CursorKind::Default
        );
    }

    #[test]
    fn test_character_set_applies_to_active_tool() {
        let mut canvas = CanvasState::new();
        let mut tm = ToolManager::default();
        tm.set_character_set(CharacterSet::Ascii);

        let tool = tm.tool_mut();
        tool.start(&mut canvas, Vector::new(1, 1), Modifiers::NONE);
        tool.move_to(&mut canvas, Vector::new(3, 2), Modifiers::NONE);
        tool.end(&mut canvas);
        assert_eq!(layer_to_text(canvas.committed(), None), "+-+\n+-+");
    }

    #[test]
    fn test_freeform_character_tracked() {
        let mut canvas = CanvasState::new();
        let mut tm = ToolManager::default();
        tm.set_tool(&mut canvas, ToolKind::Freeform);
        assert!(tm.handle_key(&mut canvas, &Key::Char('#'), Modifiers::NONE));
        assert_eq!(tm.freeform_character(), '#');

        tm.set_tool(&mut canvas, ToolKind::Box);
        tm.set_tool(&mut canvas, ToolKind::Freeform);
        match tm.tool() {
            Tool::Freeform(t) => assert_eq!(t.character(), '#'),
            other => panic!("unexpected tool {:?}", other),
        }
    }
}
