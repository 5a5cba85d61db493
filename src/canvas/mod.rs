// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The layer stack of one editing session.
//!
//! Layers are kept in paint order (index 0 is the back). The QR symbol, the
//! centre logo and the frame are singletons tracked by id; the frame, when
//! present, always sits at index 0 and never takes part in selection,
//! dragging or reordering.

pub mod frame;
pub mod raster;
pub mod svg;

use crate::error::{Result, StudioError};
use crate::models::design::{Color, FrameTemplate};
use crate::models::layer::{text_layer_name, Layer, LayerId, LayerKind};
use crate::models::scene::{Anchor, ObjectProps, SceneObject, Shape};
use crate::qr::QrGraphic;
use crate::util::geometry::{centered_origin, fit_scale};
use image::RgbaImage;
use rusttype::Font;
use std::collections::HashMap;
use std::sync::Arc;

/// Edge length of a freshly inserted QR layer.
pub const DEFAULT_QR_SIZE: f64 = 200.0;
/// Bounding square a new logo is fitted into.
pub const LOGO_MAX: f64 = 80.0;
/// Bounding square a centre logo is fitted into.
pub const CENTER_LOGO_MAX: f64 = 60.0;

const DEFAULT_INSERT: (f64, f64) = (50.0, 50.0);
const DEFAULT_TEXT_SIZE: f64 = 24.0;
const DEFAULT_TEXT_FILL: Color = Color::rgb(0x1a, 0x36, 0x5d);
const DEFAULT_FONT_FAMILY: &str = "Arial";
const DEFAULT_SHAPE_FILL: Color = Color::rgb(0x2d, 0xd4, 0xbf);
const DEFAULT_SHAPE_SIZE: f64 = 100.0;
const DEFAULT_CIRCLE_WIDTH: f64 = 50.0;
const RECT_RADIUS: f64 = 8.0;

/// New visual content for the QR layer.
#[derive(Debug, Clone)]
pub enum QrArtwork {
    /// A pre-rendered bitmap.
    Raster(RgbaImage),
    /// A styled symbol, painted natively by both output paths.
    Symbol(QrGraphic),
}

impl QrArtwork {
    fn into_shape(self) -> Shape {
        match self {
            QrArtwork::Raster(image) => Shape::Image { image: Arc::new(image) },
            QrArtwork::Symbol(graphic) => Shape::Qr { graphic },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
}

#[derive(Debug, Clone, Default)]
pub struct ShapeOptions {
    pub fill: Option<Color>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    pub font_size: Option<f64>,
    pub fill: Option<Color>,
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the front.
    Up,
    /// Towards the back.
    Down,
}

/// Layered composition backing the editor.
pub struct Canvas {
    width: u32,
    height: u32,
    background: Color,
    layers: Vec<Layer>,
    index: HashMap<LayerId, usize>,
    selected: Option<LayerId>,
    qr_layer: Option<LayerId>,
    center_logo_layer: Option<LayerId>,
    frame_layer: Option<LayerId>,
    next_id: u64,
    font: Option<Arc<Font<'static>>>,
    preview: Option<RgbaImage>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            width,
            height,
            background,
            layers: Vec::new(),
            index: HashMap::new(),
            selected: None,
            qr_layer: None,
            center_logo_layer: None,
            frame_layer: None,
            next_id: 0,
            font: None,
            preview: None,
        }
    }

    /// Font used to rasterize text layers. Without one, raster output skips
    /// text; SVG output is unaffected.
    pub fn with_font(mut self, font: Option<Arc<Font<'static>>>) -> Self {
        self.font = font;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
        self.touch();
    }

    pub fn font(&self) -> Option<&Font<'static>> {
        self.font.as_deref()
    }

    /// Layers in paint order, back first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.index_of(id).map(|i| &self.layers[i])
    }

    /// Z position of a layer (0 is the back).
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn qr_layer(&self) -> Option<LayerId> {
        self.qr_layer
    }

    pub fn center_logo_layer(&self) -> Option<LayerId> {
        self.center_logo_layer
    }

    pub fn frame_layer(&self) -> Option<LayerId> {
        self.frame_layer
    }

    /// Displayed edge length of the QR layer, if there is one.
    pub fn qr_display_size(&self) -> Option<f64> {
        self.qr_layer
            .and_then(|id| self.layer(id))
            .map(|layer| layer.object.scaled_size().0)
    }

    /// Insert or refresh the QR layer.
    ///
    /// An existing QR layer keeps its position, displayed size and z
    /// position; only its content changes. Otherwise a new layer is placed
    /// at the canvas centre at [`DEFAULT_QR_SIZE`] and brought to front.
    pub fn upsert_qr(&mut self, artwork: QrArtwork) -> Result<LayerId> {
        let shape = artwork.into_shape();
        let (natural_w, natural_h) = shape.natural_size();
        if natural_w <= 0.0 || natural_h <= 0.0 {
            return Err(StudioError::RenderFailure("QR artwork has no pixels".into()));
        }

        if let Some(i) = self.qr_layer.and_then(|id| self.index_of(id)) {
            let layer = &mut self.layers[i];
            let (shown_w, shown_h) = layer.object.scaled_size();
            layer.object.props.scale_x = shown_w / natural_w;
            layer.object.props.scale_y = shown_h / natural_h;
            layer.object.shape = shape;
            let id = layer.id;
            log::debug!("Updated QR layer {id} in place");
            self.touch();
            return Ok(id);
        }

        let origin = centered_origin(self.width as f64, self.height as f64, DEFAULT_QR_SIZE, DEFAULT_QR_SIZE);
        let props = ObjectProps::at(origin.x, origin.y).scaled(DEFAULT_QR_SIZE / natural_w, DEFAULT_QR_SIZE / natural_h);
        let id = self.push_layer("QR Code", LayerKind::Qr, SceneObject::new(props, shape));
        self.qr_layer = Some(id);
        log::info!("Added QR layer {id}");
        Ok(id)
    }

    /// Replace the centre logo with `image`, fitted into
    /// [`CENTER_LOGO_MAX`] and centred on the canvas. The new layer is
    /// selected and brought to front.
    pub fn set_center_logo(&mut self, image: RgbaImage) -> Result<LayerId> {
        let object = self.centered_image(image, CENTER_LOGO_MAX)?;
        if let Some(old) = self.center_logo_layer {
            self.delete_layer(old);
        }
        let id = self.push_layer("Center Logo", LayerKind::CenterLogo, object);
        self.center_logo_layer = Some(id);
        self.selected = Some(id);
        log::info!("Set centre logo {id}");
        Ok(id)
    }

    /// Add a free logo fitted into [`LOGO_MAX`] at the canvas centre.
    pub fn add_logo(&mut self, image: RgbaImage, name: Option<&str>) -> Result<LayerId> {
        let object = self.centered_image(image, LOGO_MAX)?;
        let name = name.filter(|n| !n.is_empty()).unwrap_or("Logo");
        let id = self.push_layer(name, LayerKind::Logo, object);
        self.selected = Some(id);
        log::info!("Added logo {id} ({name})");
        Ok(id)
    }

    pub fn add_text(&mut self, text: &str, options: TextOptions) -> LayerId {
        let shape = Shape::Text {
            text: text.to_string(),
            font_size: options.font_size.unwrap_or(DEFAULT_TEXT_SIZE),
            fill: options.fill.unwrap_or(DEFAULT_TEXT_FILL),
            font_family: options.font_family.unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
            bold: false,
        };
        let object = SceneObject::new(ObjectProps::at(DEFAULT_INSERT.0, DEFAULT_INSERT.1), shape);
        let id = self.push_layer(text_layer_name(text), LayerKind::Text, object);
        self.selected = Some(id);
        log::info!("Added text layer {id}");
        id
    }

    /// Edit the text of a text layer, keeping its name in step.
    pub fn set_text(&mut self, id: LayerId, new_text: &str) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        let layer = &mut self.layers[i];
        match &mut layer.object.shape {
            Shape::Text { text, .. } => {
                *text = new_text.to_string();
                layer.name = text_layer_name(new_text);
            }
            _ => return false,
        }
        self.touch();
        true
    }

    pub fn add_shape(&mut self, kind: ShapeKind, options: ShapeOptions) -> LayerId {
        let fill = options.fill.unwrap_or(DEFAULT_SHAPE_FILL);
        let (shape, name) = match kind {
            ShapeKind::Rect => (
                Shape::Rect {
                    width: options.width.unwrap_or(DEFAULT_SHAPE_SIZE),
                    height: options.height.unwrap_or(DEFAULT_SHAPE_SIZE),
                    fill,
                    stroke: None,
                    stroke_width: 0.0,
                    radius: RECT_RADIUS,
                },
                "Rectangle",
            ),
            ShapeKind::Circle => (
                Shape::Circle {
                    radius: options.width.unwrap_or(DEFAULT_CIRCLE_WIDTH) / 2.0,
                    fill,
                },
                "Circle",
            ),
        };
        let object = SceneObject::new(ObjectProps::at(DEFAULT_INSERT.0, DEFAULT_INSERT.1), shape);
        let id = self.push_layer(name, LayerKind::Shape, object);
        self.selected = Some(id);
        log::info!("Added {name} layer {id}");
        id
    }

    /// Make `id` the active layer. Hidden, locked and unknown layers are
    /// refused and the current selection stays.
    pub fn select(&mut self, id: LayerId) -> bool {
        match self.layer(id) {
            Some(layer) if layer.is_selectable() => {
                self.selected = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Remove a layer, dropping the selection and any singleton reference
    /// that pointed at it.
    pub fn delete_layer(&mut self, id: LayerId) -> Option<Layer> {
        let i = self.index_of(id)?;
        let layer = self.layers.remove(i);
        self.reindex();
        self.forget(id);
        log::info!("Deleted layer {id} ({}), {} remaining", layer.name, self.layers.len());
        self.touch();
        Some(layer)
    }

    /// Flip visibility. Returns the new state.
    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<bool> {
        let i = self.index_of(id)?;
        let layer = &mut self.layers[i];
        let visible = !layer.visible;
        layer.set_visible(visible);
        if !visible && self.selected == Some(id) {
            self.selected = None;
        }
        log::info!("Layer {id} {}", if visible { "shown" } else { "hidden" });
        self.touch();
        Some(visible)
    }

    /// Flip the lock. Locking the active layer clears the selection.
    pub fn toggle_lock(&mut self, id: LayerId) -> Option<bool> {
        let i = self.index_of(id)?;
        let layer = &mut self.layers[i];
        let locked = !layer.locked;
        layer.set_locked(locked);
        if locked && self.selected == Some(id) {
            self.selected = None;
        }
        log::info!("Layer {id} {}", if locked { "locked" } else { "unlocked" });
        Some(locked)
    }

    /// Swap with the neighbour in `direction`. Moving past either end, or
    /// below the frame, does nothing.
    pub fn reorder(&mut self, id: LayerId, direction: Direction) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        if Some(id) == self.frame_layer {
            return false;
        }
        let target = match direction {
            Direction::Up if i + 1 < self.layers.len() => i + 1,
            Direction::Down if i > self.floor() => i - 1,
            _ => return false,
        };
        self.layers.swap(i, target);
        self.reindex();
        log::info!("Moved layer {id} from {i} to {target}");
        self.touch();
        true
    }

    pub fn bring_to_front(&mut self, id: LayerId) -> bool {
        let top = self.layers.len().saturating_sub(1);
        self.move_to(id, top)
    }

    /// Move to the back, which is directly above the frame when there is one.
    pub fn send_to_back(&mut self, id: LayerId) -> bool {
        let floor = self.floor();
        self.move_to(id, floor)
    }

    /// Move a layer by an offset, as a pointer drag would.
    pub fn drag(&mut self, id: LayerId, dx: f64, dy: f64) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        let layer = &mut self.layers[i];
        if !layer.is_selectable() {
            log::debug!("Ignored drag on {id}: not interactive");
            return false;
        }
        layer.object.translate(dx, dy);
        self.touch();
        true
    }

    /// Rebuild the frame for `template` around a QR symbol of `qr_size`
    /// units. The `none` template only removes the current frame.
    pub fn apply_frame(&mut self, template: &FrameTemplate, qr_size: f64) -> Option<LayerId> {
        let built = frame::build_frame(template, qr_size, self.width as f64, self.height as f64);
        if let Some(old) = self.frame_layer {
            self.delete_layer(old);
        }
        let object = built?;

        let id = self.allocate_id();
        let mut layer = Layer::new(id, "Frame", LayerKind::Frame, object);
        layer.set_locked(true);
        self.layers.insert(0, layer);
        self.reindex();
        self.frame_layer = Some(id);
        log::info!("Applied frame '{}' as {id}", template.id);
        self.touch();
        Some(id)
    }

    /// Remove every layer.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.index.clear();
        self.selected = None;
        self.qr_layer = None;
        self.center_logo_layer = None;
        self.frame_layer = None;
        log::info!("Cleared canvas");
        self.touch();
    }

    /// Replace the whole stack with generic layers built from `objects`.
    ///
    /// Restored layers carry no singleton role; the caller regenerates the
    /// QR symbol, frame and centre logo to re-establish them.
    pub fn restore(&mut self, width: u32, height: u32, background: Color, objects: Vec<SceneObject>) {
        let mut layers = Vec::with_capacity(objects.len());
        for (n, object) in objects.into_iter().enumerate() {
            let id = self.allocate_id();
            let locked = !object.props.selectable;
            let mut layer = Layer::new(id, format!("Layer {}", n + 1), LayerKind::Shape, object);
            layer.set_locked(locked);
            layers.push(layer);
        }

        self.clear();
        self.width = width;
        self.height = height;
        self.background = background;
        self.layers = layers;
        self.reindex();
        log::info!("Restored {} layers", self.layers.len());
    }

    /// Give a restored layer one of the singleton roles again.
    ///
    /// Refused when the role is already taken or `kind` is not a singleton.
    /// A frame can only be adopted from the back of the stack.
    pub fn adopt(&mut self, id: LayerId, kind: LayerKind) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        let slot = match kind {
            LayerKind::Qr => &mut self.qr_layer,
            LayerKind::CenterLogo => &mut self.center_logo_layer,
            LayerKind::Frame if i == 0 => &mut self.frame_layer,
            _ => return false,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(id);

        let layer = &mut self.layers[i];
        layer.kind = kind;
        layer.name = match kind {
            LayerKind::Qr => "QR Code",
            LayerKind::CenterLogo => "Center Logo",
            _ => "Frame",
        }
        .to_string();
        if kind == LayerKind::Frame {
            layer.set_locked(true);
            if self.selected == Some(id) {
                self.selected = None;
            }
        }
        log::info!("Layer {id} adopted as {kind}");
        true
    }

    /// Every object in paint order, as stored.
    pub fn objects(&self) -> Vec<SceneObject> {
        self.layers.iter().map(|l| l.object.clone()).collect()
    }

    /// Repaint the preview if anything changed since the last pass.
    pub fn render_all(&mut self) -> &RgbaImage {
        if self.preview.is_none() {
            let image = raster::render(self, 1.0);
            log::debug!("Rendered preview with {} layers", self.layers.len());
            self.preview = Some(image);
        }
        self.preview.get_or_insert_with(|| RgbaImage::new(0, 0))
    }

    fn touch(&mut self) {
        self.preview = None;
    }

    fn allocate_id(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    /// Append a new layer at the front.
    fn push_layer(&mut self, name: impl Into<String>, kind: LayerKind, object: SceneObject) -> LayerId {
        let id = self.allocate_id();
        self.layers.push(Layer::new(id, name, kind, object));
        self.index.insert(id, self.layers.len() - 1);
        self.touch();
        id
    }

    fn centered_image(&self, image: RgbaImage, max: f64) -> Result<SceneObject> {
        let (w, h) = (image.width() as f64, image.height() as f64);
        if w == 0.0 || h == 0.0 {
            return Err(StudioError::AssetLoadFailure("image has no pixels".into()));
        }
        let scale = fit_scale(w, h, max);
        let props = ObjectProps {
            anchor: Anchor::Center,
            ..ObjectProps::at(self.width as f64 / 2.0, self.height as f64 / 2.0)
        }
        .scaled(scale, scale);
        Ok(SceneObject::new(props, Shape::Image { image: Arc::new(image) }))
    }

    /// Lowest index an ordinary layer may occupy.
    fn floor(&self) -> usize {
        usize::from(self.frame_layer.is_some())
    }

    fn move_to(&mut self, id: LayerId, target: usize) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        if Some(id) == self.frame_layer || i == target {
            return false;
        }
        let layer = self.layers.remove(i);
        self.layers.insert(target, layer);
        self.reindex();
        log::info!("Moved layer {id} from {i} to {target}");
        self.touch();
        true
    }

    fn forget(&mut self, id: LayerId) {
        for slot in [
            &mut self.selected,
            &mut self.qr_layer,
            &mut self.center_logo_layer,
            &mut self.frame_layer,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }

    fn reindex(&mut self) {
        self.index = self.layers.iter().enumerate().map(|(i, l)| (l.id, i)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::design::{find_frame_template, QrDesign};
    use proptest::prelude::*;
    use image::Rgba;

    fn canvas() -> Canvas {
        Canvas::new(400, 400, Color::WHITE)
    }

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 30, 30, 255]))
    }

    fn symbol(text: &str, size: u32) -> QrArtwork {
        let design = QrDesign {
            size,
            ..Default::default()
        };
        QrArtwork::Symbol(crate::qr::render(text, &design).unwrap())
    }

    fn kinds(canvas: &Canvas) -> Vec<LayerKind> {
        canvas.layers().iter().map(|l| l.kind).collect()
    }

    fn assert_consistent(canvas: &Canvas) {
        for (i, layer) in canvas.layers().iter().enumerate() {
            assert_eq!(canvas.index_of(layer.id), Some(i));
        }
        assert_eq!(canvas.index.len(), canvas.layers().len());
        for kind in [LayerKind::Qr, LayerKind::Frame, LayerKind::CenterLogo] {
            assert!(kinds(canvas).iter().filter(|&&k| k == kind).count() <= 1);
        }
        for (slot, kind) in [
            (canvas.qr_layer(), LayerKind::Qr),
            (canvas.center_logo_layer(), LayerKind::CenterLogo),
            (canvas.frame_layer(), LayerKind::Frame),
        ] {
            if let Some(id) = slot {
                assert_eq!(canvas.layer(id).map(|l| l.kind), Some(kind));
            }
        }
        if let Some(id) = canvas.frame_layer() {
            assert_eq!(canvas.index_of(id), Some(0));
        }
        if let Some(id) = canvas.selected() {
            assert!(canvas.layer(id).is_some_and(Layer::is_selectable));
        }
    }

    #[test]
    fn test_new_qr_centred_at_default_size() {
        let mut canvas = canvas();
        canvas.add_text("first", TextOptions::default());
        let id = canvas.upsert_qr(symbol("hello", 300)).unwrap();
        let layer = canvas.layer(id).unwrap();
        assert_eq!(layer.name, "QR Code");
        assert_eq!(layer.bounds().left, 100.0);
        assert_eq!(layer.bounds().top, 100.0);
        let (w, h) = layer.object.scaled_size();
        assert!((w - 200.0).abs() < 1e-9 && (h - 200.0).abs() < 1e-9);
        assert_eq!(canvas.index_of(id), Some(1));
    }

    #[test]
    fn test_regeneration_preserves_placement() {
        let mut canvas = canvas();
        let id = canvas.upsert_qr(symbol("hello", 300)).unwrap();
        canvas.drag(id, 15.0, -10.0);
        {
            let layer = &mut canvas.layers[0];
            layer.object.props.scale_x *= 1.5;
            layer.object.props.scale_y *= 1.5;
        }
        let before = canvas.layer(id).unwrap().bounds();
        canvas.add_shape(ShapeKind::Circle, ShapeOptions::default());

        let again = canvas.upsert_qr(QrArtwork::Raster(solid(512, 512))).unwrap();
        assert_eq!(again, id);
        let after = canvas.layer(id).unwrap().bounds();
        assert_eq!(after.left, before.left);
        assert_eq!(after.top, before.top);
        assert!((after.width - before.width).abs() < 1e-9);
        assert!((after.height - before.height).abs() < 1e-9);
        assert_eq!(canvas.index_of(id), Some(0));
        assert_eq!(canvas.layers().iter().filter(|l| l.kind == LayerKind::Qr).count(), 1);
    }

    #[test]
    fn test_deleted_qr_is_recreated() {
        let mut canvas = canvas();
        let id = canvas.upsert_qr(symbol("hello", 200)).unwrap();
        canvas.delete_layer(id);
        assert_eq!(canvas.qr_layer(), None);
        let fresh = canvas.upsert_qr(symbol("hello", 200)).unwrap();
        assert_ne!(fresh, id);
        assert_eq!(canvas.layers().len(), 1);
    }

    #[test]
    fn test_center_logo_replaces_previous() {
        let mut canvas = canvas();
        let first = canvas.set_center_logo(solid(120, 60)).unwrap();
        let second = canvas.set_center_logo(solid(30, 30)).unwrap();
        assert!(canvas.layer(first).is_none());
        assert_eq!(canvas.center_logo_layer(), Some(second));
        assert_eq!(canvas.selected(), Some(second));

        let layer = canvas.layer(second).unwrap();
        let bounds = layer.bounds();
        assert_eq!((bounds.width, bounds.height), (60.0, 60.0));
        assert_eq!(bounds.center().x, 200.0);
        assert_eq!(bounds.center().y, 200.0);
    }

    #[test]
    fn test_logo_fits_within_footprint() {
        let mut canvas = canvas();
        let id = canvas.add_logo(solid(160, 40), Some("brand")).unwrap();
        let layer = canvas.layer(id).unwrap();
        assert_eq!(layer.name, "brand");
        assert_eq!(layer.object.scaled_size(), (80.0, 20.0));
        assert!(canvas.add_logo(RgbaImage::new(0, 0), None).is_err());
        assert_eq!(canvas.layers().len(), 1);
    }

    #[test]
    fn test_text_name_follows_edits() {
        let mut canvas = canvas();
        let id = canvas.add_text("Hello", TextOptions::default());
        assert!(canvas.set_text(id, "A much longer caption for the code"));
        assert_eq!(canvas.layer(id).unwrap().name, "A much longer captio");
        assert!(canvas.set_text(id, ""));
        assert_eq!(canvas.layer(id).unwrap().name, "Text");

        let shape = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        assert!(!canvas.set_text(shape, "nope"));
    }

    #[test]
    fn test_default_shapes() {
        let mut canvas = canvas();
        let rect = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        let circle = canvas.add_shape(ShapeKind::Circle, ShapeOptions::default());
        assert_eq!(canvas.layer(rect).unwrap().name, "Rectangle");
        assert_eq!(canvas.layer(rect).unwrap().object.scaled_size(), (100.0, 100.0));
        assert_eq!(canvas.layer(circle).unwrap().object.scaled_size(), (50.0, 50.0));
        assert_eq!(canvas.selected(), Some(circle));
    }

    #[test]
    fn test_select_rejects_hidden_and_locked() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        let b = canvas.add_shape(ShapeKind::Circle, ShapeOptions::default());
        canvas.toggle_lock(a);
        assert!(!canvas.select(a));
        assert_eq!(canvas.selected(), Some(b));

        canvas.toggle_lock(a);
        canvas.toggle_visibility(a);
        assert!(!canvas.select(a));
        assert!(!canvas.select(LayerId(999)));
        assert_eq!(canvas.selected(), Some(b));
    }

    #[test]
    fn test_locking_selected_clears_selection() {
        let mut canvas = canvas();
        let id = canvas.add_text("hi", TextOptions::default());
        assert_eq!(canvas.toggle_lock(id), Some(true));
        assert_eq!(canvas.selected(), None);
        assert!(!canvas.layer(id).unwrap().object.props.selectable);
        assert!(!canvas.drag(id, 5.0, 5.0));

        assert_eq!(canvas.toggle_lock(id), Some(false));
        assert!(canvas.drag(id, 5.0, 5.0));
        assert_eq!(canvas.layer(id).unwrap().bounds().left, 55.0);
    }

    #[test]
    fn test_locked_layer_still_reorders_and_deletes() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        canvas.add_shape(ShapeKind::Circle, ShapeOptions::default());
        canvas.toggle_lock(a);
        assert!(canvas.bring_to_front(a));
        assert_eq!(canvas.index_of(a), Some(1));
        canvas.toggle_visibility(a);
        assert!(canvas.delete_layer(a).is_some());
        assert_eq!(canvas.layers().len(), 1);
    }

    #[test]
    fn test_reorder_boundaries() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        let b = canvas.add_shape(ShapeKind::Circle, ShapeOptions::default());
        assert!(!canvas.reorder(b, Direction::Up));
        assert!(!canvas.reorder(a, Direction::Down));
        assert!(canvas.reorder(a, Direction::Up));
        assert_eq!(canvas.layers()[1].id, a);
        assert!(canvas.send_to_back(a));
        assert_eq!(canvas.layers()[0].id, a);
        assert!(!canvas.send_to_back(a));
    }

    #[test]
    fn test_frame_stays_at_back() {
        let mut canvas = canvas();
        let qr = canvas.upsert_qr(symbol("hello", 200)).unwrap();
        let banner = find_frame_template("banner").unwrap();
        let frame = canvas.apply_frame(&banner, canvas.qr_display_size().unwrap()).unwrap();
        assert_eq!(canvas.index_of(frame), Some(0));

        let layer = canvas.layer(frame).unwrap();
        assert!(layer.locked);
        assert!(!layer.object.props.selectable);
        assert!(!canvas.select(frame));
        assert!(!canvas.drag(frame, 1.0, 1.0));

        assert!(!canvas.reorder(qr, Direction::Down));
        assert!(!canvas.send_to_back(qr));
        assert!(!canvas.bring_to_front(frame));
        assert!(!canvas.reorder(frame, Direction::Up));
        assert_eq!(canvas.index_of(frame), Some(0));

        // Unlocking does not make the frame interactive.
        canvas.toggle_lock(frame);
        assert!(!canvas.select(frame));
    }

    #[test]
    fn test_frame_none_removes_frame() {
        let mut canvas = canvas();
        canvas.upsert_qr(symbol("hello", 200)).unwrap();
        let banner = find_frame_template("banner").unwrap();
        canvas.apply_frame(&banner, 200.0);
        canvas.apply_frame(&banner, 200.0);
        assert_eq!(kinds(&canvas), vec![LayerKind::Frame, LayerKind::Qr]);

        assert!(canvas.apply_frame(&FrameTemplate::none(), 200.0).is_none());
        assert_eq!(canvas.frame_layer(), None);
        assert_eq!(kinds(&canvas), vec![LayerKind::Qr]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut canvas = canvas();
        canvas.upsert_qr(symbol("hello", 200)).unwrap();
        canvas.set_center_logo(solid(10, 10)).unwrap();
        canvas.apply_frame(&find_frame_template("simple").unwrap(), 200.0);
        canvas.clear();
        assert!(canvas.layers().is_empty());
        assert_eq!(canvas.selected(), None);
        assert_eq!(canvas.qr_layer(), None);
        assert_eq!(canvas.center_logo_layer(), None);
        assert_eq!(canvas.frame_layer(), None);
    }

    #[test]
    fn test_restore_makes_generic_layers() {
        let mut canvas = canvas();
        canvas.upsert_qr(symbol("hello", 200)).unwrap();
        let mut objects = canvas.objects();
        objects[0].props.selectable = false;
        objects.push(SceneObject::new(
            ObjectProps::at(1.0, 2.0),
            Shape::Circle {
                radius: 3.0,
                fill: Color::BLACK,
            },
        ));

        let mut fresh = Canvas::new(10, 10, Color::BLACK);
        fresh.restore(400, 300, Color::WHITE, objects);
        assert_eq!(fresh.width(), 400);
        assert_eq!(fresh.height(), 300);
        assert_eq!(kinds(&fresh), vec![LayerKind::Shape, LayerKind::Shape]);
        assert_eq!(fresh.layers()[0].name, "Layer 1");
        assert!(fresh.layers()[0].locked);
        assert!(!fresh.layers()[1].locked);
        assert_eq!(fresh.qr_layer(), None);
        assert_consistent(&fresh);
    }

    #[test]
    fn test_adopt_restored_roles() {
        let mut canvas = canvas();
        canvas.upsert_qr(symbol("hello", 200)).unwrap();
        canvas.apply_frame(&find_frame_template("simple").unwrap(), 200.0);
        let mut fresh = Canvas::new(400, 400, Color::WHITE);
        fresh.restore(400, 400, Color::WHITE, canvas.objects());
        let frame = fresh.layers()[0].id;
        let qr = fresh.layers()[1].id;

        assert!(!fresh.adopt(qr, LayerKind::Frame));
        assert!(!fresh.adopt(qr, LayerKind::Text));
        assert!(fresh.adopt(qr, LayerKind::Qr));
        assert!(!fresh.adopt(frame, LayerKind::Qr));
        assert!(fresh.adopt(frame, LayerKind::Frame));
        assert_eq!(fresh.qr_layer(), Some(qr));
        assert_eq!(fresh.frame_layer(), Some(frame));
        assert_eq!(fresh.layer(qr).unwrap().name, "QR Code");
        assert!(!fresh.select(frame));
        assert_consistent(&fresh);

        let placement = fresh.layer(qr).unwrap().bounds();
        fresh.upsert_qr(symbol("changed", 300)).unwrap();
        assert_eq!(fresh.layers().len(), 2);
        let after = fresh.layer(qr).unwrap().bounds();
        assert_eq!((after.left, after.top), (placement.left, placement.top));
        assert!((after.width - placement.width).abs() < 1e-9);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Qr(u32),
        CenterLogo(u32, u32),
        Logo,
        Text,
        Shape(bool),
        Frame(usize),
        Delete(usize),
        Visibility(usize),
        Lock(usize),
        Select(usize),
        Reorder(usize, bool),
        Front(usize),
        Back(usize),
        Drag(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (128u32..=256).prop_map(Op::Qr),
            (1u32..200, 1u32..200).prop_map(|(w, h)| Op::CenterLogo(w, h)),
            Just(Op::Logo),
            Just(Op::Text),
            any::<bool>().prop_map(Op::Shape),
            (0usize..6).prop_map(Op::Frame),
            any::<usize>().prop_map(Op::Delete),
            any::<usize>().prop_map(Op::Visibility),
            any::<usize>().prop_map(Op::Lock),
            any::<usize>().prop_map(Op::Select),
            (any::<usize>(), any::<bool>()).prop_map(|(i, up)| Op::Reorder(i, up)),
            any::<usize>().prop_map(Op::Front),
            any::<usize>().prop_map(Op::Back),
            any::<usize>().prop_map(Op::Drag),
        ]
    }

    fn pick(canvas: &Canvas, i: usize) -> Option<LayerId> {
        let n = canvas.layers().len();
        (n > 0).then(|| canvas.layers()[i % n].id)
    }

    fn apply(canvas: &mut Canvas, op: Op) {
        let catalog = crate::models::design::frame_templates();
        match op {
            Op::Qr(size) => {
                let graphic = QrGraphic {
                    size,
                    ..match symbol("prop", 128) {
                        QrArtwork::Symbol(g) => g,
                        QrArtwork::Raster(_) => unreachable!(),
                    }
                };
                canvas.upsert_qr(QrArtwork::Symbol(graphic)).unwrap();
            }
            Op::CenterLogo(w, h) => {
                canvas.set_center_logo(RgbaImage::new(w, h)).unwrap();
            }
            Op::Logo => {
                canvas.add_logo(RgbaImage::new(4, 4), None).unwrap();
            }
            Op::Text => {
                canvas.add_text("prop", TextOptions::default());
            }
            Op::Shape(rect) => {
                let kind = if rect { ShapeKind::Rect } else { ShapeKind::Circle };
                canvas.add_shape(kind, ShapeOptions::default());
            }
            Op::Frame(i) => {
                let size = canvas.qr_display_size().unwrap_or(DEFAULT_QR_SIZE);
                canvas.apply_frame(&catalog[i % catalog.len()], size);
            }
            Op::Delete(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.delete_layer(id);
                }
            }
            Op::Visibility(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.toggle_visibility(id);
                }
            }
            Op::Lock(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.toggle_lock(id);
                }
            }
            Op::Select(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.select(id);
                }
            }
            Op::Reorder(i, up) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.reorder(id, if up { Direction::Up } else { Direction::Down });
                }
            }
            Op::Front(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.bring_to_front(id);
                }
            }
            Op::Back(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.send_to_back(id);
                }
            }
            Op::Drag(i) => {
                if let Some(id) = pick(canvas, i) {
                    canvas.drag(id, 3.0, -2.0);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_layer_invariants_hold(ops in proptest::collection::vec(op(), 1..40)) {
            let mut canvas = canvas();
            for op in ops {
                apply(&mut canvas, op);
                assert_consistent(&canvas);
            }
        }

        #[test]
        fn prop_center_logo_is_singleton(sizes in proptest::collection::vec((1u32..300, 1u32..300), 1..10)) {
            let mut canvas = canvas();
            for (w, h) in sizes {
                canvas.set_center_logo(RgbaImage::new(w, h)).unwrap();
            }
            let count = canvas.layers().iter().filter(|l| l.kind == LayerKind::CenterLogo).count();
            prop_assert_eq!(count, 1);
        }

        #[test]
        fn prop_boundary_moves_are_noops(n in 1usize..8) {
            let mut canvas = canvas();
            for _ in 0..n {
                canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
            }
            let order: Vec<LayerId> = canvas.layers().iter().map(|l| l.id).collect();
            let front = *order.last().unwrap();
            let back = order[0];
            prop_assert!(!canvas.reorder(front, Direction::Up));
            prop_assert!(!canvas.reorder(back, Direction::Down));
            let after: Vec<LayerId> = canvas.layers().iter().map(|l| l.id).collect();
            prop_assert_eq!(order, after);
        }
    }
}
