//! Line glyph selection.
//!
//! Every line cell is described by the set of directions it connects to.
//! When a new stroke crosses or touches an existing line glyph the two
//! direction sets are unioned, so shared edges and crossings come out as
//! proper junctions (`┬`, `┼`, `┤`, ...).

use crate::layer::Layer;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};

/// A set of connection directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Directions(u8);

impl Directions {
    pub const NONE: Directions = Directions(0);
    pub const UP: Directions = Directions(1);
    pub const DOWN: Directions = Directions(2);
    pub const LEFT: Directions = Directions(4);
    pub const RIGHT: Directions = Directions(8);
    pub const ALL: Directions = Directions(15);

    pub fn contains(self, other: Directions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn has_horizontal(self) -> bool {
        self.0 & (Self::LEFT.0 | Self::RIGHT.0) != 0
    }

    fn has_vertical(self) -> bool {
        self.0 & (Self::UP.0 | Self::DOWN.0) != 0
    }

    /// The direction of a single grid step from `from` to `to`.
    pub fn toward(from: Vector, to: Vector) -> Directions {
        let d = to - from;
        match (d.x.signum(), d.y.signum()) {
            (0, -1) => Self::UP,
            (0, 1) => Self::DOWN,
            (-1, 0) => Self::LEFT,
            (1, 0) => Self::RIGHT,
            _ => Self::NONE,
        }
    }
}

impl BitOr for Directions {
    type Output = Directions;

    fn bitor(self, rhs: Directions) -> Directions {
        Directions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Directions {
    fn bitor_assign(&mut self, rhs: Directions) {
        self.0 |= rhs.0;
    }
}

/// Directions an existing character already connects to, if it is a line glyph.
pub fn directions_of(ch: char) -> Option<Directions> {
    use Directions as D;
    let dirs = match ch {
        '─' | '-' => D::LEFT | D::RIGHT,
        '│' | '|' => D::UP | D::DOWN,
        '┌' => D::RIGHT | D::DOWN,
        '┐' => D::LEFT | D::DOWN,
        '└' => D::RIGHT | D::UP,
        '┘' => D::LEFT | D::UP,
        '├' => D::UP | D::DOWN | D::RIGHT,
        '┤' => D::UP | D::DOWN | D::LEFT,
        '┬' => D::LEFT | D::RIGHT | D::DOWN,
        '┴' => D::LEFT | D::RIGHT | D::UP,
        '┼' | '+' => D::ALL,
        _ => return None,
    };
    Some(dirs)
}

/// Which characters the line tools draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSet {
    #[default]
    Unicode,
    Ascii,
}

impl CharacterSet {
    /// The glyph for a cell connecting in `dirs`.
    pub fn line_glyph(self, dirs: Directions) -> Option<char> {
        if dirs.is_empty() {
            return None;
        }
        match self {
            CharacterSet::Ascii => Some(match (dirs.has_horizontal(), dirs.has_vertical()) {
                (true, true) => '+',
                (true, false) => '-',
                _ => '|',
            }),
            CharacterSet::Unicode => Some(unicode_line_glyph(dirs)),
        }
    }

    /// Arrowhead pointing in `dir`.
    pub fn arrow_head(self, dir: Directions) -> char {
        use Directions as D;
        match (self, dir) {
            (CharacterSet::Unicode, D::UP) => '▲',
            (CharacterSet::Unicode, D::DOWN) => '▼',
            (CharacterSet::Unicode, D::LEFT) => '◄',
            (CharacterSet::Unicode, _) => '►',
            (CharacterSet::Ascii, D::UP) => '^',
            (CharacterSet::Ascii, D::DOWN) => 'v',
            (CharacterSet::Ascii, D::LEFT) => '<',
            (CharacterSet::Ascii, _) => '>',
        }
    }
}

fn unicode_line_glyph(dirs: Directions) -> char {
    let up = dirs.contains(Directions::UP);
    let down = dirs.contains(Directions::DOWN);
    let left = dirs.contains(Directions::LEFT);
    let right = dirs.contains(Directions::RIGHT);
    match (up, down, left, right) {
        (true, true, true, true) => '┼',
        (true, true, false, true) => '├',
        (true, true, true, false) => '┤',
        (false, true, true, true) => '┬',
        (true, false, true, true) => '┴',
        (false, true, false, true) => '┌',
        (false, true, true, false) => '┐',
        (true, false, false, true) => '└',
        (true, false, true, false) => '┘',
        (_, _, false, false) => '│',
        _ => '─',
    }
}

/// Accumulates the connections of axis-aligned strokes before they are
/// turned into glyphs.
#[derive(Debug, Clone, Default)]
pub struct Strokes {
    connections: HashMap<Vector, Directions>,
}

impl Strokes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a horizontal or vertical segment between two cells.
    ///
    /// Diagonal segments are drawn horizontal-first.
    pub fn segment(&mut self, from: Vector, to: Vector) {
        if from.x != to.x && from.y != to.y {
            let bend = Vector::new(to.x, from.y);
            self.segment(from, bend);
            self.segment(bend, to);
            return;
        }

        self.connections.entry(from).or_default();
        let step = Vector::new((to.x - from.x).signum(), (to.y - from.y).signum());
        let mut current = from;
        while current != to {
            let next = current + step;
            *self.connections.entry(current).or_default() |= Directions::toward(current, next);
            *self.connections.entry(next).or_default() |= Directions::toward(next, current);
            current = next;
        }
    }

    /// Connections recorded for `v`.
    pub fn at(&self, v: Vector) -> Directions {
        self.connections.get(&v).copied().unwrap_or_default()
    }

    /// Render the strokes as glyphs, merging with line glyphs already in `base`.
    pub fn render(&self, base: &Layer, charset: CharacterSet) -> Layer {
        let mut layer = Layer::new();
        for (&v, &dirs) in &self.connections {
            if dirs.is_empty() {
                continue;
            }
            let merged = base
                .get(v)
                .and_then(directions_of)
                .map_or(dirs, |existing| existing | dirs);
            if let Some(ch) = charset.line_glyph(merged) {
                layer.set(v, ch);
            }
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{layer_to_text, text_to_layer};

    #[test]
    fn test_glyph_directions_roundtrip() {
        for ch in ['─', '│', '┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼'] {
            let dirs = directions_of(ch).unwrap();
            assert_eq!(CharacterSet::Unicode.line_glyph(dirs), Some(ch));
        }
    }

    #[test]
    fn test_single_direction_is_straight() {
        assert_eq!(CharacterSet::Unicode.line_glyph(Directions::UP), Some('│'));
        assert_eq!(CharacterSet::Unicode.line_glyph(Directions::LEFT), Some('─'));
        assert_eq!(CharacterSet::Unicode.line_glyph(Directions::NONE), None);
    }

    #[test]
    fn test_ascii_glyphs() {
        let set = CharacterSet::Ascii;
        assert_eq!(set.line_glyph(Directions::LEFT | Directions::RIGHT), Some('-'));
        assert_eq!(set.line_glyph(Directions::UP), Some('|'));
        assert_eq!(set.line_glyph(Directions::RIGHT | Directions::DOWN), Some('+'));
        assert_eq!(set.arrow_head(Directions::DOWN), 'v');
    }

    #[test]
    fn test_segment_connects_neighbours() {
        let mut strokes = Strokes::new();
        strokes.segment(Vector::new(0, 0), Vector::new(3, 0));
        assert_eq!(strokes.at(Vector::new(0, 0)), Directions::RIGHT);
        assert_eq!(strokes.at(Vector::new(1, 0)), Directions::LEFT | Directions::RIGHT);
        assert_eq!(strokes.at(Vector::new(3, 0)), Directions::LEFT);
    }

    #[test]
    fn test_crossing_existing_line_makes_junction() {
        let base = text_to_layer("│\n│\n│", Vector::new(2, 0));
        let mut strokes = Strokes::new();
        strokes.segment(Vector::new(0, 1), Vector::new(4, 1));
        let drawn = strokes.render(&base, CharacterSet::Unicode);
        let (merged, _) = base.apply(&drawn);
        assert_eq!(layer_to_text(&merged, None), "  │\n──┼──\n  │");
    }

    #[test]
    fn test_ending_on_existing_line_makes_tee() {
        let base = text_to_layer("│\n│\n│", Vector::new(3, 0));
        let mut strokes = Strokes::new();
        strokes.segment(Vector::new(0, 1), Vector::new(3, 1));
        let drawn = strokes.render(&base, CharacterSet::Unicode);
        let (merged, _) = base.apply(&drawn);
        assert_eq!(layer_to_text(&merged, None), "   │\n───┤\n   │");
    }
}
