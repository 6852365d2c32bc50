//! GridSketch Core Library
//!
//! Platform-agnostic grid engine, draw tools, codecs and persistence for
//! GridSketch text diagrams.

pub mod canvas;
pub mod codec;
pub mod drawing;
pub mod editor;
pub mod glyphs;
pub mod input;
pub mod layer;
pub mod shortcuts;
pub mod storage;
pub mod text;
pub mod tools;
pub mod transform;
pub mod vector;

pub use canvas::{CanvasChange, CanvasState, MAX_UNDO_HISTORY, SubscriptionId};
pub use codec::{DecodeError, Drawing, DrawingStringifier, ShareStringifier, Stringifier};
pub use drawing::{DrawingId, DrawingStore};
pub use editor::Editor;
pub use glyphs::CharacterSet;
pub use input::{Key, Modifiers, PointerEvent, WheelEvent};
pub use layer::{Cell, Layer, LayerView};
pub use shortcuts::{Shortcut, ShortcutRegistry};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};
pub use text::{layer_to_text, text_to_layer};
pub use tools::{CursorKind, DrawTool, Tool, ToolKind, ToolManager};
pub use transform::{CellMetrics, MAX_GRID_HEIGHT, MAX_GRID_WIDTH, ViewTransform};
pub use vector::{GridBox, Vector};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
