//! Drawing identities and the store that loads and persists their canvases.
//!
//! Every local drawing owns a key namespace in the [`Storage`] medium:
//!
//! | key                              | value                         |
//! |----------------------------------|-------------------------------|
//! | `<ns>/committed-layer`           | layer                         |
//! | `<ns>/undo-layers`               | array of layer diffs          |
//! | `<ns>/redo-layers`               | array of layer diffs          |
//! | `<ns>/zoom`                      | number                        |
//! | `<ns>/offset`                    | `{x, y}` in legacy pixels     |
//!
//! where `<ns>` is `default-drawing` or `drawing/<url-encoded name>`.
//! Shared drawings live only in their route and are never written.

use crate::canvas::{CanvasState, UnsavedChanges};
use crate::codec::{
    ArrayStringifier, Drawing, JsonStringifier, LayerStringifier, ShareStringifier, Stringifier,
};
use crate::glyphs::CharacterSet;
use crate::layer::Layer;
use crate::storage::{Storage, StorageResult, decode_component, encode_component};
use crate::tools::{DEFAULT_FREEFORM_CHARACTER, ToolKind};
use crate::transform::{CellMetrics, DEFAULT_ZOOM};
use kurbo::Vec2;
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_DRAWING_NAMESPACE: &str = "default-drawing";
pub const LOCAL_DRAWING_IDS_KEY: &str = "local-drawing-ids";
pub const TOOL_SETTING_KEY: &str = "settings/tool";
pub const FREEFORM_CHARACTER_SETTING_KEY: &str = "settings/freeform-character";
pub const CHARACTER_SET_SETTING_KEY: &str = "settings/character-set";

const COMMITTED_LAYER: &str = "committed-layer";
const UNDO_LAYERS: &str = "undo-layers";
const REDO_LAYERS: &str = "redo-layers";
const ZOOM: &str = "zoom";
const OFFSET: &str = "offset";
const DRAWING_KEYS: [&str; 5] = [COMMITTED_LAYER, UNDO_LAYERS, REDO_LAYERS, ZOOM, OFFSET];

/// Identity of a drawing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DrawingId {
    /// A persisted drawing; `None` is the default drawing.
    Local(Option<String>),
    /// A read-only drawing decoded from a share payload.
    Share(String),
}

impl Default for DrawingId {
    fn default() -> Self {
        DrawingId::Local(None)
    }
}

impl DrawingId {
    /// A named local drawing. An empty name means the default drawing.
    pub fn local(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            DrawingId::Local(None)
        } else {
            DrawingId::Local(Some(name))
        }
    }

    pub fn share(payload: impl Into<String>) -> Self {
        DrawingId::Share(payload.into())
    }

    /// Shared drawings cannot be edited or undone.
    pub fn is_read_only(&self) -> bool {
        matches!(self, DrawingId::Share(_))
    }

    /// The name of a named local drawing.
    pub fn name(&self) -> Option<&str> {
        match self {
            DrawingId::Local(name) => name.as_deref(),
            DrawingId::Share(_) => None,
        }
    }

    /// The URL fragment route for this drawing.
    pub fn to_route(&self) -> String {
        match self {
            DrawingId::Local(None) => "/local".to_string(),
            DrawingId::Local(Some(name)) => format!("/local/{}", encode_component(name)),
            DrawingId::Share(payload) => format!("/share/{}", payload),
        }
    }

    /// Parse a route produced by [`DrawingId::to_route`]. A leading `#` is
    /// ignored and the empty route is the default drawing.
    pub fn from_route(route: &str) -> Option<DrawingId> {
        let route = route.trim().trim_start_matches('#');
        let route = route.strip_prefix('/').unwrap_or(route);
        let mut parts = route.splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(""), None) | (Some("local"), None) => Some(DrawingId::Local(None)),
            (Some("local"), Some(name)) => {
                Some(DrawingId::local(decode_component(name).unwrap_or_default()))
            }
            (Some("share"), Some(payload)) if !payload.is_empty() => {
                Some(DrawingId::Share(payload.to_string()))
            }
            _ => None,
        }
    }

    /// Storage namespace; shared drawings have none.
    fn namespace(&self) -> Option<String> {
        match self {
            DrawingId::Local(None) => Some(DEFAULT_DRAWING_NAMESPACE.to_string()),
            DrawingId::Local(Some(name)) => Some(format!("drawing/{}", encode_component(name))),
            DrawingId::Share(_) => None,
        }
    }
}

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawingId::Local(None) => write!(f, "default drawing"),
            DrawingId::Local(Some(name)) => write!(f, "drawing {:?}", name),
            DrawingId::Share(_) => write!(f, "shared drawing"),
        }
    }
}

fn storage_key(namespace: &str, suffix: &str) -> String {
    format!("{}/{}", namespace, suffix)
}

/// Read and decode one value, logging and discarding anything unreadable.
fn read_value<S: Storage, T>(storage: &S, key: &str, codec: &impl Stringifier<T>) -> Option<T> {
    match storage.get(key) {
        Ok(Some(raw)) => match codec.decode(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring unreadable value for {}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            None
        }
    }
}

fn load_canvas<S: Storage>(storage: &S, metrics: CellMetrics, id: &DrawingId) -> CanvasState {
    let namespace = match id {
        DrawingId::Share(payload) => {
            let layer = match ShareStringifier.decode(payload) {
                Ok(drawing) => drawing.layer,
                Err(e) => {
                    log::warn!("Could not decode shared drawing, showing an empty one: {}", e);
                    Layer::new()
                }
            };
            return CanvasState::restore(
                layer,
                Vec::new(),
                Vec::new(),
                DEFAULT_ZOOM,
                metrics.default_offset(),
                metrics,
            );
        }
        DrawingId::Local(_) => id.namespace().unwrap_or_default(),
    };

    let key = |suffix| storage_key(&namespace, suffix);
    let layers = ArrayStringifier::new(LayerStringifier);
    let committed: Layer =
        read_value(storage, &key(COMMITTED_LAYER), &LayerStringifier).unwrap_or_default();
    let undo: Vec<Layer> = read_value(storage, &key(UNDO_LAYERS), &layers).unwrap_or_default();
    let redo: Vec<Layer> = read_value(storage, &key(REDO_LAYERS), &layers).unwrap_or_default();
    let zoom = read_value(storage, &key(ZOOM), &JsonStringifier::<f64>::new())
        .unwrap_or(DEFAULT_ZOOM);
    let offset = read_value(storage, &key(OFFSET), &JsonStringifier::<Vec2>::new())
        .map_or_else(|| metrics.default_offset(), |stored| metrics.from_legacy_offset(stored));

    log::info!("Loaded {} ({} cells, {} undo steps)", id, committed.len(), undo.len());
    CanvasState::restore(committed, undo, redo, zoom, offset, metrics)
}

fn write_canvas<S: Storage>(
    storage: &mut S,
    namespace: &str,
    canvas: &CanvasState,
    groups: UnsavedChanges,
    metrics: CellMetrics,
) -> StorageResult<()> {
    if groups.layers {
        let layers = ArrayStringifier::new(LayerStringifier);
        storage.set(
            &storage_key(namespace, COMMITTED_LAYER),
            &LayerStringifier.encode(canvas.committed()),
        )?;
        storage.set(
            &storage_key(namespace, UNDO_LAYERS),
            &layers.encode(&canvas.undo_stack().to_vec()),
        )?;
        storage.set(
            &storage_key(namespace, REDO_LAYERS),
            &layers.encode(&canvas.redo_stack().to_vec()),
        )?;
    }
    if groups.view {
        storage.set(
            &storage_key(namespace, ZOOM),
            &JsonStringifier::<f64>::new().encode(&canvas.zoom()),
        )?;
        storage.set(
            &storage_key(namespace, OFFSET),
            &JsonStringifier::<Vec2>::new().encode(&metrics.to_legacy_offset(canvas.offset())),
        )?;
    }
    Ok(())
}

const ALL_GROUPS: UnsavedChanges = UnsavedChanges {
    layers: true,
    view: true,
};

/// Owns one lazily loaded [`CanvasState`] per drawing and persists them.
pub struct DrawingStore<S: Storage> {
    storage: S,
    metrics: CellMetrics,
    canvases: HashMap<DrawingId, CanvasState>,
}

impl<S: Storage> fmt::Debug for DrawingStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingStore")
            .field("metrics", &self.metrics)
            .field("loaded", &self.canvases.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: Storage> DrawingStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_metrics(storage, CellMetrics::default())
    }

    /// Create a store whose offsets are measured in `metrics`.
    pub fn with_metrics(storage: S, metrics: CellMetrics) -> Self {
        Self {
            storage,
            metrics,
            canvases: HashMap::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Change the measured cell size, rescaling the offsets of loaded canvases.
    pub fn set_metrics(&mut self, metrics: CellMetrics) {
        self.metrics = metrics;
        for canvas in self.canvases.values_mut() {
            canvas.set_metrics(metrics);
        }
    }

    /// The canvas for `id`, loading it on first access.
    ///
    /// Unreadable stored parts fall back to their defaults.
    pub fn canvas(&mut self, id: &DrawingId) -> &mut CanvasState {
        let Self {
            storage,
            metrics,
            canvases,
        } = self;
        canvases
            .entry(id.clone())
            .or_insert_with(|| load_canvas(storage, *metrics, id))
    }

    /// Drop the cached canvas of `id`. Unsaved changes are discarded.
    pub fn unload(&mut self, id: &DrawingId) -> bool {
        self.canvases.remove(id).is_some()
    }

    /// The canvas for `id` if it has been loaded.
    pub fn loaded(&self, id: &DrawingId) -> Option<&CanvasState> {
        self.canvases.get(id)
    }

    /// Write the parts of a loaded local drawing that changed since the last save.
    ///
    /// Parts stay marked unsaved until a write succeeds.
    pub fn persist(&mut self, id: &DrawingId) -> StorageResult<()> {
        let Some(namespace) = id.namespace() else {
            return Ok(());
        };
        let Some(canvas) = self.canvases.get(id) else {
            return Ok(());
        };
        let unsaved = canvas.unsaved();
        if !unsaved.any() {
            return Ok(());
        }

        write_canvas(&mut self.storage, &namespace, canvas, unsaved, self.metrics)?;
        if let Some(name) = id.name() {
            self.register(name)?;
        }
        if let Some(canvas) = self.canvases.get_mut(id) {
            canvas.take_unsaved();
        }
        log::debug!("Saved {}", id);
        Ok(())
    }

    /// Names of the local drawings, in creation order.
    pub fn local_drawings(&self) -> Vec<String> {
        read_value(
            &self.storage,
            LOCAL_DRAWING_IDS_KEY,
            &JsonStringifier::<Vec<String>>::new(),
        )
        .unwrap_or_default()
    }

    fn write_index(&mut self, names: Vec<String>) -> StorageResult<()> {
        self.storage.set(
            LOCAL_DRAWING_IDS_KEY,
            &JsonStringifier::<Vec<String>>::new().encode(&names),
        )
    }

    fn register(&mut self, name: &str) -> StorageResult<()> {
        let mut names = self.local_drawings();
        if names.iter().any(|n| n == name) {
            return Ok(());
        }
        names.push(name.to_string());
        self.write_index(names)
    }

    /// Rename a local drawing. Returns false when `from` does not exist or
    /// `to` is empty or already taken.
    pub fn rename_drawing(&mut self, from: &str, to: &str) -> StorageResult<bool> {
        let to = to.trim();
        let mut names = self.local_drawings();
        if to.is_empty() || from == to || names.iter().any(|n| n == to) {
            return Ok(false);
        }
        let Some(position) = names.iter().position(|n| n == from) else {
            return Ok(false);
        };

        let old = DrawingId::local(from);
        let new = DrawingId::local(to);
        self.persist(&old)?;

        let (Some(old_ns), Some(new_ns)) = (old.namespace(), new.namespace()) else {
            return Ok(false);
        };
        for suffix in DRAWING_KEYS {
            let old_key = storage_key(&old_ns, suffix);
            if let Some(value) = self.storage.get(&old_key)? {
                self.storage.set(&storage_key(&new_ns, suffix), &value)?;
            }
            self.storage.remove(&old_key)?;
        }
        if let Some(canvas) = self.canvases.remove(&old) {
            self.canvases.insert(new, canvas);
        }

        names[position] = to.to_string();
        self.write_index(names)?;
        log::info!("Renamed drawing {:?} to {:?}", from, to);
        Ok(true)
    }

    /// Forget a drawing and remove every key it owns.
    ///
    /// Deleting the default drawing resets it to empty.
    pub fn delete_drawing(&mut self, id: &DrawingId) -> StorageResult<()> {
        self.canvases.remove(id);
        let Some(namespace) = id.namespace() else {
            return Ok(());
        };
        for suffix in DRAWING_KEYS {
            self.storage.remove(&storage_key(&namespace, suffix))?;
        }
        if let Some(name) = id.name() {
            let mut names = self.local_drawings();
            names.retain(|n| n != name);
            self.write_index(names)?;
        }
        log::info!("Deleted {}", id);
        Ok(())
    }

    /// Copy the committed content of `id` into a new local drawing called
    /// `name` and return its id. History is not copied.
    pub fn save_shared(&mut self, id: &DrawingId, name: &str) -> StorageResult<DrawingId> {
        let target = DrawingId::local(name.trim());
        let layer = self.canvas(id).committed().clone();
        let canvas = CanvasState::restore(
            layer,
            Vec::new(),
            Vec::new(),
            DEFAULT_ZOOM,
            self.metrics.default_offset(),
            self.metrics,
        );

        if let Some(namespace) = target.namespace() {
            write_canvas(&mut self.storage, &namespace, &canvas, ALL_GROUPS, self.metrics)?;
        }
        if let Some(name) = target.name() {
            self.register(name)?;
        }
        self.canvases.insert(target.clone(), canvas);
        log::info!("Saved {} as {}", id, target);
        Ok(target)
    }

    /// A share id carrying the committed content of `id`.
    pub fn share_link(&mut self, id: &DrawingId) -> DrawingId {
        if let DrawingId::Share(_) = id {
            return id.clone();
        }
        let name = id.name().unwrap_or_default().to_string();
        let layer = self.canvas(id).committed().clone();
        DrawingId::Share(ShareStringifier.encode(&Drawing::new(name, layer)))
    }

    /// The name stored inside a drawing: the local name or the shared drawing's name.
    pub fn drawing_name(&self, id: &DrawingId) -> String {
        match id {
            DrawingId::Local(name) => name.clone().unwrap_or_default(),
            DrawingId::Share(payload) => ShareStringifier
                .decode(payload)
                .map(|drawing| drawing.name)
                .unwrap_or_default(),
        }
    }

    pub fn saved_tool(&self) -> ToolKind {
        read_value(&self.storage, TOOL_SETTING_KEY, &JsonStringifier::<ToolKind>::new())
            .unwrap_or_default()
    }

    pub fn save_tool(&mut self, tool: ToolKind) -> StorageResult<()> {
        self.storage
            .set(TOOL_SETTING_KEY, &JsonStringifier::<ToolKind>::new().encode(&tool))
    }

    pub fn saved_freeform_character(&self) -> char {
        read_value(
            &self.storage,
            FREEFORM_CHARACTER_SETTING_KEY,
            &JsonStringifier::<char>::new(),
        )
        .unwrap_or(DEFAULT_FREEFORM_CHARACTER)
    }

    pub fn save_freeform_character(&mut self, ch: char) -> StorageResult<()> {
        self.storage.set(
            FREEFORM_CHARACTER_SETTING_KEY,
            &JsonStringifier::<char>::new().encode(&ch),
        )
    }

    pub fn saved_character_set(&self) -> CharacterSet {
        read_value(
            &self.storage,
            CHARACTER_SET_SETTING_KEY,
            &JsonStringifier::<CharacterSet>::new(),
        )
            .unwrap_or_default()
    }

    pub fn save_character_set(&mut self, charset: CharacterSet) -> StorageResult<()> {
        self.storage.set(
            CHARACTER_SET_SETTING_KEY,
            &JsonStringifier::<CharacterSet>::new().encode(&charset),
        )
    }
}
