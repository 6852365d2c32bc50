//! Sparse character grid and layer compositing.
//!
//! A [`Layer`] maps cells to either a glyph or an erase marker. Committed
//! layers only ever hold glyphs; scratch layers and undo diffs use erase
//! markers to say "this cell becomes empty".

use crate::vector::{GridBox, Vector};
use std::collections::HashMap;

/// Returns the character if it may be stored in a grid cell.
///
/// Control characters (including carriage returns) and spaces are never
/// stored; an empty cell already renders as a space.
pub fn normalize_glyph(ch: char) -> Option<char> {
    if ch.is_control() || ch == ' ' {
        None
    } else {
        Some(ch)
    }
}

/// The value a layer holds for a cell it defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// A visible character.
    Glyph(char),
    /// The cell is cleared when this layer is composited or applied.
    Erase,
}

impl Cell {
    /// The glyph, if this is not an erase marker.
    pub fn glyph(self) -> Option<char> {
        match self {
            Cell::Glyph(ch) => Some(ch),
            Cell::Erase => None,
        }
    }

    fn from_glyph(glyph: Option<char>) -> Self {
        glyph.map_or(Cell::Erase, Cell::Glyph)
    }
}

/// A sparse grid of characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    cells: HashMap<Vector, Cell>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The glyph at `v`, or `None` for empty and erased cells.
    pub fn get(&self, v: Vector) -> Option<char> {
        self.cells.get(&v).and_then(|cell| cell.glyph())
    }

    /// The raw cell value, distinguishing "not defined" from "erased".
    pub fn cell(&self, v: Vector) -> Option<Cell> {
        self.cells.get(&v).copied()
    }

    /// Whether this layer defines `v` (glyph or erase marker).
    pub fn defines(&self, v: Vector) -> bool {
        self.cells.contains_key(&v)
    }

    /// Set a glyph. Characters that cannot be stored become an erase marker.
    pub fn set(&mut self, v: Vector, ch: char) {
        self.cells.insert(v, Cell::from_glyph(normalize_glyph(ch)));
    }

    /// Mark `v` as erased.
    pub fn delete(&mut self, v: Vector) {
        self.cells.insert(v, Cell::Erase);
    }

    /// Forget whatever this layer holds for `v`. Returns whether it held anything.
    pub fn remove(&mut self, v: Vector) -> bool {
        self.cells.remove(&v).is_some()
    }

    /// Snapshot of all defined positions.
    pub fn keys(&self) -> Vec<Vector> {
        self.cells.keys().copied().collect()
    }

    /// Snapshot of all defined positions with their values.
    pub fn entries(&self) -> Vec<(Vector, Cell)> {
        self.cells.iter().map(|(v, c)| (*v, *c)).collect()
    }

    /// Iterate the visible glyphs, skipping erase markers.
    pub fn glyphs(&self) -> impl Iterator<Item = (Vector, char)> + '_ {
        self.cells
            .iter()
            .filter_map(|(v, c)| c.glyph().map(|ch| (*v, ch)))
    }

    /// Number of defined cells, erase markers included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Keep only the cells for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(Vector, Cell) -> bool) {
        self.cells.retain(|v, cell| keep(*v, *cell));
    }

    /// Bounding box of the visible glyphs.
    pub fn bounds(&self) -> Option<GridBox> {
        self.glyphs()
            .map(|(v, _)| GridBox::cell(v))
            .reduce(|acc, b| acc.union(&b))
    }

    /// Overwrite every cell `delta` defines.
    ///
    /// Returns the resulting layer and the inverse diff: for every cell whose
    /// value changed, what this layer held before (an erase marker when it was
    /// empty). Applying the inverse to the result yields this layer again.
    pub fn apply(&self, delta: &Layer) -> (Layer, Layer) {
        let mut result = self.clone();
        let mut inverse = Layer::new();

        for (&v, &cell) in &delta.cells {
            let before = self.get(v);
            let after = cell.glyph();
            if before == after {
                continue;
            }
            inverse.cells.insert(v, Cell::from_glyph(before));
            match after {
                Some(ch) => {
                    result.cells.insert(v, Cell::Glyph(ch));
                }
                None => {
                    result.cells.remove(&v);
                }
            }
        }

        (result, inverse)
    }
}

impl FromIterator<(Vector, char)> for Layer {
    fn from_iter<I: IntoIterator<Item = (Vector, char)>>(iter: I) -> Self {
        let mut layer = Layer::new();
        for (v, ch) in iter {
            layer.set(v, ch);
        }
        layer
    }
}

/// A read-only overlay of layers; later layers paint over earlier ones.
#[derive(Debug, Clone, Default)]
pub struct LayerView<'a> {
    layers: Vec<&'a Layer>,
}

impl<'a> LayerView<'a> {
    pub fn new(layers: Vec<&'a Layer>) -> Self {
        Self { layers }
    }

    /// The value of the topmost layer defining `v`.
    pub fn get(&self, v: Vector) -> Option<char> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.cell(v))
            .and_then(Cell::glyph)
    }

    /// Every position defined by any layer. May include erased cells.
    pub fn keys(&self) -> Vec<Vector> {
        let mut keys: Vec<Vector> = self.layers.iter().flat_map(|l| l.cells.keys().copied()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Flatten the overlay into a single glyph-only layer.
    pub fn flatten(&self) -> Layer {
        self.keys()
            .into_iter()
            .filter_map(|v| self.get(v).map(|ch| (v, ch)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(cells: &[(i32, i32, char)]) -> Layer {
        cells
            .iter()
            .map(|&(x, y, ch)| (Vector::new(x, y), ch))
            .collect()
    }

    #[test]
    fn test_set_and_get() {
        let mut l = Layer::new();
        l.set(Vector::new(1, 2), 'a');
        assert_eq!(l.get(Vector::new(1, 2)), Some('a'));
        assert_eq!(l.get(Vector::new(2, 1)), None);
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_control_and_space_never_stored() {
        let mut l = Layer::new();
        for (i, ch) in ['\u{0}', '\t', '\n', '\r', '\u{1f}', '\u{7f}', ' '].into_iter().enumerate() {
            let v = Vector::new(i as i32, 0);
            l.set(v, ch);
            assert_eq!(l.get(v), None, "{:?} was stored", ch);
            assert_eq!(l.cell(v), Some(Cell::Erase));
        }
        assert_eq!(l.glyphs().count(), 0);
    }

    #[test]
    fn test_apply_overwrites_and_clears() {
        let base = layer(&[(0, 0, 'a'), (1, 0, 'b')]);
        let mut delta = layer(&[(0, 0, 'z'), (2, 0, 'c')]);
        delta.delete(Vector::new(1, 0));

        let (result, inverse) = base.apply(&delta);
        assert_eq!(result, layer(&[(0, 0, 'z'), (2, 0, 'c')]));
        assert_eq!(inverse.cell(Vector::new(0, 0)), Some(Cell::Glyph('a')));
        assert_eq!(inverse.cell(Vector::new(1, 0)), Some(Cell::Glyph('b')));
        assert_eq!(inverse.cell(Vector::new(2, 0)), Some(Cell::Erase));
    }

    #[test]
    fn test_apply_inverse_restores_exactly() {
        let base = layer(&[(0, 0, '┌'), (1, 0, '─'), (5, 5, 'q')]);
        let mut delta = layer(&[(1, 0, '┬'), (9, 9, 'x')]);
        delta.delete(Vector::new(5, 5));
        delta.delete(Vector::new(7, 7));

        let (result, inverse) = base.apply(&delta);
        let (restored, redo) = result.apply(&inverse);
        assert_eq!(restored, base);
        assert_eq!(restored.keys().len(), base.keys().len());
        assert_eq!(result.apply(&inverse).0.apply(&redo).0, result);
    }

    #[test]
    fn test_apply_skips_unchanged_cells() {
        let base = layer(&[(0, 0, 'a')]);
        let mut delta = layer(&[(0, 0, 'a')]);
        delta.delete(Vector::new(3, 3));
        let (result, inverse) = base.apply(&delta);
        assert_eq!(result, base);
        assert!(inverse.is_empty());
    }

    #[test]
    fn test_committed_result_has_no_markers() {
        let base = Layer::new();
        let mut delta = Layer::new();
        delta.delete(Vector::new(0, 0));
        delta.set(Vector::new(1, 1), 'k');
        let (result, _) = base.apply(&delta);
        assert_eq!(result.entries(), vec![(Vector::new(1, 1), Cell::Glyph('k'))]);
    }

    #[test]
    fn test_bounds() {
        let mut l = layer(&[(2, 3, 'a'), (-1, 7, 'b')]);
        l.delete(Vector::new(100, 100));
        let b = l.bounds().unwrap();
        assert_eq!(b.top_left(), Vector::new(-1, 3));
        assert_eq!(b.bottom_right(), Vector::new(2, 7));
        assert!(Layer::new().bounds().is_none());
    }

    #[test]
    fn test_view_later_layers_win() {
        let committed = layer(&[(0, 0, 'a'), (1, 0, 'b'), (2, 0, 'c')]);
        let mut scratch = layer(&[(1, 0, 'X')]);
        scratch.delete(Vector::new(2, 0));

        let view = LayerView::new(vec![&committed, &scratch]);
        assert_eq!(view.get(Vector::new(0, 0)), Some('a'));
        assert_eq!(view.get(Vector::new(1, 0)), Some('X'));
        assert_eq!(view.get(Vector::new(2, 0)), None);
        assert_eq!(view.get(Vector::new(3, 0)), None);
        assert_eq!(view.flatten(), layer(&[(0, 0, 'a'), (1, 0, 'X')]));
    }
}
