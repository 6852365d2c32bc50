//! Keyboard shortcut registry and documentation.

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Ctrl, or Cmd on macOS.
    pub command: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        command: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            command,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.command {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of the shortcuts the editor and its tools understand.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("Shift+Drag", false, false, "Line: bend the other way / Select: new selection"),
            Shortcut::new("Delete", false, false, "Erase selection or character at text cursor"),
            Shortcut::new("Backspace", false, false, "Erase selection or character before text cursor"),
            Shortcut::new("Enter", false, false, "Text: commit typed text"),
            Shortcut::new("Enter", false, true, "Text: next line"),
            Shortcut::new("Escape", false, false, "Clear selection / finish typing"),
            Shortcut::new("Arrows", false, false, "Text: move cursor"),
            Shortcut::new("Any character", false, false, "Freeform: change drawing character"),
            Shortcut::new("Wheel", false, false, "Pan"),
            Shortcut::new("Wheel", true, false, "Zoom around pointer"),
        ]
    }

    /// Render all shortcuts as an aligned table.
    pub fn describe() -> String {
        Self::all()
            .iter()
            .map(|shortcut| format!("  {:20} {}", shortcut.format(), shortcut.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(Shortcut::new("Z", true, true, "Redo").format(), "Ctrl+Shift+Z");
        assert_eq!(Shortcut::new("Delete", false, false, "").format(), "Delete");
    }

    #[test]
    fn test_describe_lists_every_shortcut() {
        let text = ShortcutRegistry::describe();
        assert_eq!(text.lines().count(), ShortcutRegistry::all().len());
        assert!(text.contains("Ctrl+Y"));
    }
}
