// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Retained scene objects.
//!
//! A scene object is a shape plus placement: position, anchor, scale,
//! visibility and interactivity. Groups hold children positioned relative to
//! the group's top-left corner.

use crate::models::design::Color;
use crate::qr::QrGraphic;
use crate::util::geometry::Bounds;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which point of the object `left`/`top` refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    TopLeft,
    Center,
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// Placement and interaction state shared by every object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectProps {
    pub left: f64,
    pub top: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default = "yes")]
    pub visible: bool,
    /// Can be selected and dragged.
    #[serde(default = "yes")]
    pub selectable: bool,
}

impl ObjectProps {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            scale_x: 1.0,
            scale_y: 1.0,
            anchor: Anchor::TopLeft,
            visible: true,
            selectable: true,
        }
    }

    pub fn centered_at(x: f64, y: f64) -> Self {
        Self {
            anchor: Anchor::Center,
            ..Self::at(x, y)
        }
    }

    pub fn scaled(mut self, sx: f64, sy: f64) -> Self {
        self.scale_x = sx;
        self.scale_y = sy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Image {
        #[serde(rename = "src", with = "crate::io::media::data_url")]
        image: Arc<RgbaImage>,
    },
    Qr {
        graphic: QrGraphic,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font_size: f64,
        fill: Color,
        font_family: String,
        #[serde(default)]
        bold: bool,
    },
    #[serde(rename_all = "camelCase")]
    Rect {
        width: f64,
        height: f64,
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Color>,
        #[serde(default)]
        stroke_width: f64,
        #[serde(default)]
        radius: f64,
    },
    Circle {
        radius: f64,
        fill: Color,
    },
    Group {
        children: Vec<SceneObject>,
    },
}

/// Average glyph advance as a fraction of the font size, used when no font
/// metrics are available.
pub const APPROX_ADVANCE: f64 = 0.6;
/// Line box height as a fraction of the font size.
pub const LINE_HEIGHT: f64 = 1.16;

impl Shape {
    /// Unscaled size of the shape in canvas units.
    pub fn natural_size(&self) -> (f64, f64) {
        match self {
            Shape::Image { image } => (image.width() as f64, image.height() as f64),
            Shape::Qr { graphic } => (graphic.size as f64, graphic.size as f64),
            Shape::Text {
                text, font_size, ..
            } => (
                text.chars().count() as f64 * font_size * APPROX_ADVANCE,
                font_size * LINE_HEIGHT,
            ),
            Shape::Rect { width, height, .. } => (*width, *height),
            Shape::Circle { radius, .. } => (radius * 2.0, radius * 2.0),
            Shape::Group { children } => {
                let extent = children
                    .iter()
                    .map(SceneObject::bounds)
                    .reduce(|a, b| a.union(&b));
                match extent {
                    // Children are relative to the group's top-left, so the
                    // size reaches from the origin to the far edge.
                    Some(b) => (b.right().max(0.0), b.bottom().max(0.0)),
                    None => (0.0, 0.0),
                }
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Image { .. } => "image",
            Shape::Qr { .. } => "qr",
            Shape::Text { .. } => "text",
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Group { .. } => "group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(flatten)]
    pub props: ObjectProps,
    #[serde(flatten)]
    pub shape: Shape,
}

impl SceneObject {
    pub fn new(props: ObjectProps, shape: Shape) -> Self {
        Self { props, shape }
    }

    /// Rendered width and height (natural size times scale).
    pub fn scaled_size(&self) -> (f64, f64) {
        let (w, h) = self.shape.natural_size();
        (w * self.props.scale_x, h * self.props.scale_y)
    }

    /// Rendered bounding box in the parent's coordinate space.
    pub fn bounds(&self) -> Bounds {
        let (w, h) = self.scaled_size();
        match self.props.anchor {
            Anchor::TopLeft => Bounds::new(self.props.left, self.props.top, w, h),
            Anchor::Center => Bounds::new(self.props.left - w / 2.0, self.props.top - h / 2.0, w, h),
        }
    }

    /// Shift the anchor point by an offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.props.left += dx;
        self.props.top += dy;
    }
}

/// Current scene document format.
pub const SCENE_VERSION: u32 = 1;

/// Persistable snapshot of a whole canvas: size, background and every
/// object in paint order (back first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default = "scene_version")]
    pub version: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default = "white")]
    pub background: Color,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

fn scene_version() -> u32 {
    SCENE_VERSION
}

fn white() -> Color {
    Color::WHITE
}
