//! Conversion between plain text blocks and layers.

use crate::layer::{Layer, normalize_glyph};
use crate::vector::{GridBox, Vector};

/// Normalize `\r\n` and lone `\r` line breaks to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Place a block of text on a new layer with its first character at `origin`.
///
/// Spaces and control characters leave their cell empty. Characters whose
/// position would overflow the coordinate range are dropped.
pub fn text_to_layer(text: &str, origin: Vector) -> Layer {
    let mut layer = Layer::new();
    for (row, line) in normalize_line_endings(text).split('\n').enumerate() {
        let Some(y) = i32::try_from(row).ok().and_then(|row| origin.y.checked_add(row)) else {
            break;
        };
        for (col, ch) in line.chars().enumerate() {
            let Some(x) = i32::try_from(col).ok().and_then(|col| origin.x.checked_add(col)) else {
                break;
            };
            if let Some(ch) = normalize_glyph(ch) {
                layer.set(Vector::new(x, y), ch);
            }
        }
    }
    layer
}

/// Render the glyphs of `layer` inside `area` (or the layer's bounds) as text.
///
/// Empty cells become spaces and trailing spaces are trimmed from each line.
pub fn layer_to_text(layer: &Layer, area: Option<GridBox>) -> String {
    let Some(area) = area.or_else(|| layer.bounds()) else {
        return String::new();
    };

    let tl = area.top_left();
    let br = area.bottom_right();
    let mut lines = Vec::with_capacity(area.height() as usize);
    for y in tl.y..=br.y {
        let line: String = (tl.x..=br.x)
            .map(|x| layer.get(Vector::new(x, y)).unwrap_or(' '))
            .collect();
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}
