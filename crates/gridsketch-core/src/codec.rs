//! Versioned string encodings for layers, drawings and share links.
//!
//! Layers are always written in the sparse version 2 shape:
//!
//! ```json
//! {"version": 2, "cells": [[x, y, "c"], [x, y, ""]]}
//! ```
//!
//! where an empty string is an erase marker (used by undo diffs). The dense
//! version 1 shape `{"x": .., "y": .., "text": ".."}` is still accepted on read.

use crate::layer::{Cell, Layer, normalize_glyph};
use crate::text::text_to_layer;
use crate::transform::{MAX_GRID_HEIGHT, MAX_GRID_WIDTH, on_grid};
use crate::vector::Vector;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};
use std::marker::PhantomData;
use thiserror::Error;

/// The layer format version written by this crate.
pub const LAYER_VERSION: u64 = 2;

/// Upper bound on the decompressed size of a share payload.
pub const MAX_SHARE_BYTES: u64 = 16 * 1024 * 1024;

/// Errors produced while decoding stored or shared data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u64),
    #[error("Unrecognized data shape")]
    UnrecognizedShape,
    #[error("Invalid cell value {value:?} at {at}")]
    InvalidCell { value: String, at: Vector },
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Corrupt compressed payload: {0}")]
    Compression(#[from] std::io::Error),
    #[error("Share payload expands beyond {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A string codec for one value type.
pub trait Stringifier<T> {
    fn encode(&self, value: &T) -> String;
    fn decode(&self, encoded: &str) -> Result<T, DecodeError>;
}

/// A named drawing: the unit of sharing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drawing {
    pub name: String,
    pub layer: Layer,
}

impl Drawing {
    pub fn new(name: impl Into<String>, layer: Layer) -> Self {
        Self {
            name: name.into(),
            layer,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LayerV2 {
    version: u64,
    cells: Vec<(i32, i32, String)>,
}

#[derive(Deserialize)]
struct LayerV1 {
    x: i32,
    y: i32,
    text: String,
}

#[derive(Serialize)]
struct DrawingV2<'a> {
    version: u64,
    name: &'a str,
    cells: Vec<(i32, i32, String)>,
}

fn encode_cells(layer: &Layer) -> Vec<(i32, i32, String)> {
    let mut entries = layer.entries();
    entries.sort_unstable_by_key(|(v, _)| (v.y, v.x));
    entries
        .into_iter()
        .map(|(v, cell)| {
            let value = match cell {
                Cell::Glyph(ch) => ch.to_string(),
                Cell::Erase => String::new(),
            };
            (v.x, v.y, value)
        })
        .collect()
}

/// Cells outside the grid are dropped.
fn decode_cells(cells: Vec<(i32, i32, String)>) -> Result<Layer, DecodeError> {
    let mut layer = Layer::new();
    for (x, y, value) in cells {
        let at = Vector::new(x, y);
        if !on_grid(at) {
            log::debug!("Dropping off-grid cell at {}", at);
            continue;
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => layer.delete(at),
            (Some(ch), None) => {
                if let Some(ch) = normalize_glyph(ch) {
                    layer.set(at, ch);
                }
            }
            _ => return Err(DecodeError::InvalidCell { value, at }),
        }
    }
    Ok(layer)
}

/// Decode a layer from either stored shape, dispatching on `version` first.
fn layer_from_value(value: Value) -> Result<Layer, DecodeError> {
    match value.get("version") {
        Some(version) => match version.as_u64() {
            Some(LAYER_VERSION) => {
                let v2: LayerV2 = serde_json::from_value(value)?;
                decode_cells(v2.cells)
            }
            Some(other) => Err(DecodeError::UnsupportedVersion(other)),
            None => Err(DecodeError::UnrecognizedShape),
        },
        None if value.get("text").is_some() => {
            let v1: LayerV1 = serde_json::from_value(value)?;
            let origin = Vector::new(
                v1.x.clamp(0, MAX_GRID_WIDTH - 1),
                v1.y.clamp(0, MAX_GRID_HEIGHT - 1),
            );
            let mut layer = text_to_layer(&v1.text, origin);
            layer.retain(|v, _| on_grid(v));
            Ok(layer)
        }
        None => Err(DecodeError::UnrecognizedShape),
    }
}

/// Codec for a single layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerStringifier;

impl Stringifier<Layer> for LayerStringifier {
    fn encode(&self, layer: &Layer) -> String {
        let v2 = LayerV2 {
            version: LAYER_VERSION,
            cells: encode_cells(layer),
        };
        to_json(&v2)
    }

    fn decode(&self, encoded: &str) -> Result<Layer, DecodeError> {
        layer_from_value(serde_json::from_str(encoded)?)
    }
}

/// Codec for a named drawing.
///
/// Also reads the older `{name, layer}` record and bare version 1 layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawingStringifier;

impl Stringifier<Drawing> for DrawingStringifier {
    fn encode(&self, drawing: &Drawing) -> String {
        let v2 = DrawingV2 {
            version: LAYER_VERSION,
            name: &drawing.name,
            cells: encode_cells(&drawing.layer),
        };
        to_json(&v2)
    }

    fn decode(&self, encoded: &str) -> Result<Drawing, DecodeError> {
        let mut value: Value = serde_json::from_str(encoded)?;
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let layer = if value.get("version").is_some() || value.get("text").is_some() {
            layer_from_value(value)?
        } else if let Some(layer) = value.get_mut("layer") {
            layer_from_value(layer.take())?
        } else {
            return Err(DecodeError::UnrecognizedShape);
        };

        Ok(Drawing { name, layer })
    }
}

/// Codec for a list of values, each encoded by `S`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayStringifier<S> {
    inner: S,
}

impl<S> ArrayStringifier<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<T, S: Stringifier<T>> Stringifier<Vec<T>> for ArrayStringifier<S> {
    fn encode(&self, values: &Vec<T>) -> String {
        let encoded: Vec<String> = values.iter().map(|v| self.inner.encode(v)).collect();
        to_json(&encoded)
    }

    fn decode(&self, encoded: &str) -> Result<Vec<T>, DecodeError> {
        let items: Vec<String> = serde_json::from_str(encoded)?;
        items.iter().map(|item| self.inner.decode(item)).collect()
    }
}

/// Codec for plain serde values (zoom, offsets, name lists, settings).
#[derive(Debug, Clone, Copy)]
pub struct JsonStringifier<T>(PhantomData<fn() -> T>);

impl<T> Default for JsonStringifier<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> JsonStringifier<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Serialize + DeserializeOwned> Stringifier<T> for JsonStringifier<T> {
    fn encode(&self, value: &T) -> String {
        to_json(value)
    }

    fn decode(&self, encoded: &str) -> Result<T, DecodeError> {
        Ok(serde_json::from_str(encoded)?)
    }
}

/// Codec for share links: the drawing JSON, zlib-compressed and base64url
/// encoded so it can sit in a URL fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShareStringifier;

impl Stringifier<Drawing> for ShareStringifier {
    fn encode(&self, drawing: &Drawing) -> String {
        let json = DrawingStringifier.encode(drawing);
        URL_SAFE_NO_PAD.encode(deflate(json.as_bytes()))
    }

    fn decode(&self, encoded: &str) -> Result<Drawing, DecodeError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim().trim_end_matches('='))?;
        let json = String::from_utf8(inflate(&bytes)?)?;
        DrawingStringifier.decode(&json)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("Failed to encode value as JSON: {}", e);
        String::new()
    })
}

fn deflate(input: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    if let Err(e) = encoder.write_all(input) {
        log::error!("Failed to compress share payload: {}", e);
        return Vec::new();
    }
    encoder.finish().unwrap_or_else(|e| {
        log::error!("Failed to compress share payload: {}", e);
        Vec::new()
    })
}

fn inflate(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    ZlibDecoder::new(input)
        .take(MAX_SHARE_BYTES + 1)
        .read_to_end(&mut out)?;
    if out.len() as u64 > MAX_SHARE_BYTES {
        return Err(DecodeError::TooLarge {
            limit: MAX_SHARE_BYTES,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::layer_to_text;
    use std::collections::HashSet;

    const V1_BOX: &str = "┌──┬──┐\n│  │  │\n├──┼──┤\n│  │  │\n└──┴──┘";

    #[test]
    fn test_decode_v1() {
        let payload = serde_json::json!({"x": 987, "y": 286, "text": V1_BOX}).to_string();
        let layer = LayerStringifier.decode(&payload).unwrap();
        assert_eq!(layer.get(Vector::new(987, 286)), Some('┌'));
        assert_eq!(layer.get(Vector::new(990, 288)), Some('┼'));
        assert_eq!(layer_to_text(&layer, None), V1_BOX);
    }

    #[test]
    fn test_decode_v1_crlf() {
        let payload = serde_json::json!({"x": 0, "y": 0, "text": "ab\r\ncd\re"}).to_string();
        let layer = LayerStringifier.decode(&payload).unwrap();
        assert_eq!(layer_to_text(&layer, None), "ab\ncd\ne");
    }

    #[test]
    fn test_encode_writes_v2() {
        let layer = text_to_layer("++", Vector::new(5, 10));
        let encoded = LayerStringifier.encode(&layer);
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(encoded, r#"{"version":2,"cells":[[5,10,"+"],[6,10,"+"]]}"#);

        let decoded = LayerStringifier.decode(&encoded).unwrap();
        assert_eq!(layer_to_text(&decoded, None), "++");
        assert_eq!(decoded, layer);
    }

    #[test]
    fn test_layer_roundtrip_preserves_entries() {
        let mut layer = text_to_layer("┌─┐\n└─┘\nhello", Vector::new(3, 7));
        layer.delete(Vector::new(100, 100));
        let decoded = LayerStringifier.decode(&LayerStringifier.encode(&layer)).unwrap();
        let a: HashSet<_> = layer.entries().into_iter().collect();
        let b: HashSet<_> = decoded.entries().into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_unknown_shapes() {
        assert!(matches!(
            LayerStringifier.decode(r#"{"version":3,"cells":[]}"#),
            Err(DecodeError::UnsupportedVersion(3))
        ));
        assert!(matches!(
            LayerStringifier.decode(r#"{"foo":1}"#),
            Err(DecodeError::UnrecognizedShape)
        ));
        assert!(matches!(
            LayerStringifier.decode(r#"{"version":2,"cells":[[0,0,"ab"]]}"#),
            Err(DecodeError::InvalidCell { .. })
        ));
        assert!(matches!(LayerStringifier.decode("not json"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_drops_control_characters() {
        let layer = LayerStringifier
            .decode(r#"{"version":2,"cells":[[0,0,"\r"],[1,0,"a"]]}"#)
            .unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.get(Vector::new(0, 0)), None);
    }

    #[test]
    fn test_drawing_roundtrip_keeps_name() {
        let drawing = Drawing::new("network map", text_to_layer("a─b", Vector::new(2, 2)));
        let encoded = DrawingStringifier.encode(&drawing);
        assert_eq!(DrawingStringifier.decode(&encoded).unwrap(), drawing);
    }

    #[test]
    fn test_drawing_accepts_legacy_records() {
        let nested = serde_json::json!({
            "name": "old",
            "layer": {"x": 1, "y": 1, "text": "hi"},
        })
        .to_string();
        let drawing = DrawingStringifier.decode(&nested).unwrap();
        assert_eq!(drawing.name, "old");
        assert_eq!(drawing.layer.get(Vector::new(2, 1)), Some('i'));

        let bare = serde_json::json!({"x": 0, "y": 0, "text": "x"}).to_string();
        let drawing = DrawingStringifier.decode(&bare).unwrap();
        assert_eq!(drawing.name, "");
        assert_eq!(drawing.layer.len(), 1);
    }

    #[test]
    fn test_array_of_layers() {
        let mut diff = Layer::new();
        diff.delete(Vector::new(1, 1));
        let stack = vec![text_to_layer("a", Vector::ZERO), diff];
        let codec = ArrayStringifier::new(LayerStringifier);
        let decoded = codec.decode(&codec.encode(&stack)).unwrap();
        assert_eq!(decoded, stack);
    }

    #[test]
    fn test_json_values() {
        let codec = JsonStringifier::<f64>::new();
        assert!((codec.decode(&codec.encode(&1.25)).unwrap() - 1.25).abs() < f64::EPSILON);

        let names = JsonStringifier::<Vec<String>>::new();
        let list = vec!["a".to_string(), "b c".to_string()];
        assert_eq!(names.decode(&names.encode(&list)).unwrap(), list);
        assert!(codec.decode("\"x\"").is_err());
    }

    #[test]
    fn test_share_roundtrip() {
        let drawing = Drawing::new("shared", text_to_layer(V1_BOX, Vector::new(900, 250)));
        let encoded = ShareStringifier.encode(&drawing);
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(ShareStringifier.decode(&encoded).unwrap(), drawing);
    }

    #[test]
    fn test_share_rejects_bad_payloads() {
        let encoded = ShareStringifier.encode(&Drawing::new("x", text_to_layer("abc", Vector::ZERO)));

        let truncated = &encoded[..encoded.len() / 2];
        assert!(ShareStringifier.decode(truncated).is_err());
        assert!(ShareStringifier.decode("!!!not base64!!!").is_err());
        assert!(ShareStringifier.decode(&URL_SAFE_NO_PAD.encode(b"plain text")).is_err());
        assert!(ShareStringifier.decode("").is_err());
    }

    #[test]
    fn test_decode_drops_off_grid_cells() {
        let layer = LayerStringifier
            .decode(r#"{"version":2,"cells":[[0,-2147483648,"a"],[0,2147483647,"b"],[4,4,"c"]]}"#)
            .unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer_to_text(&layer, None), "c");

        let edge = LayerStringifier
            .decode(r#"{"version":2,"cells":[[1999,599,"z"],[2000,0,"y"],[-1,5,"x"]]}"#)
            .unwrap();
        assert_eq!(edge.keys(), vec![Vector::new(1999, 599)]);
    }

    #[test]
    fn test_decode_v1_clamps_origin() {
        let layer = LayerStringifier
            .decode(r#"{"x":2147483647,"y":0,"text":"ab"}"#)
            .unwrap();
        assert_eq!(layer.keys(), vec![Vector::new(MAX_GRID_WIDTH - 1, 0)]);
        assert_eq!(layer_to_text(&layer, None), "a");

        let layer = LayerStringifier
            .decode(r#"{"x":-5,"y":-2147483648,"text":"ab\ncd"}"#)
            .unwrap();
        assert_eq!(layer_to_text(&layer, None), "ab\ncd");
        assert_eq!(layer.get(Vector::new(0, 0)), Some('a'));
    }

    #[test]
    fn test_share_rejects_oversized_payloads() {
        let json = vec![b' '; MAX_SHARE_BYTES as usize + 1];
        let encoded = URL_SAFE_NO_PAD.encode(deflate(&json));
        assert!(encoded.len() < 64 * 1024);
        assert!(matches!(
            ShareStringifier.decode(&encoded),
            Err(DecodeError::TooLarge { .. })
        ));
    }
}
