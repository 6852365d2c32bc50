//! Normalized input events consumed by the editor.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Modifier keys state. Missing modifiers are simply `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer events in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, modifiers: Modifiers },
    Move { position: Point, modifiers: Modifiers },
    Up { position: Point, modifiers: Modifiers },
    /// The gesture was interrupted (focus loss, extra touch points).
    Cancel,
}

/// A wheel or trackpad scroll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub position: Point,
    pub delta: Vec2,
    pub modifiers: Modifiers,
}

/// A keyboard key, named after DOM `KeyboardEvent.key` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A key producing a single character.
    Char(char),
    Enter,
    Backspace,
    Delete,
    Escape,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Anything else, by name.
    Other(String),
}

impl Key {
    /// Parse a DOM-style key name (`"a"`, `"Enter"`, `"ArrowLeft"`, ...).
    pub fn from_name(name: &str) -> Key {
        match name {
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Key::Char(ch),
                    _ => Key::Other(name.to_string()),
                }
            }
        }
    }

    /// The character typed by this key, if it is printable.
    pub fn printable(&self) -> Option<char> {
        match self {
            Key::Char(ch) if !ch.is_control() => Some(*ch),
            _ => None,
        }
    }

    /// Unit step for arrow keys.
    pub fn arrow_step(&self) -> Option<crate::vector::Vector> {
        use crate::vector::Vector;
        match self {
            Key::ArrowUp => Some(Vector::UP),
            Key::ArrowDown => Some(Vector::DOWN),
            Key::ArrowLeft => Some(Vector::LEFT),
            Key::ArrowRight => Some(Vector::RIGHT),
            _ => None,
        }
    }
}
