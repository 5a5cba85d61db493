// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Layer identity and per-layer state.

use super::scene::{SceneObject, Shape};
use crate::util::geometry::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a layer within one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Qr,
    Frame,
    CenterLogo,
    Logo,
    Text,
    Shape,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Qr => "qr",
            LayerKind::Frame => "frame",
            LayerKind::CenterLogo => "center-logo",
            LayerKind::Logo => "logo",
            LayerKind::Text => "text",
            LayerKind::Shape => "shape",
        }
    }

    /// Kinds of which at most one layer may exist.
    pub fn is_singleton(&self) -> bool {
        matches!(self, LayerKind::Qr | LayerKind::Frame | LayerKind::CenterLogo)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressable entry in the layer stack.
///
/// `visible` and `locked` are the layer's own flags; the wrapped object's
/// `visible`/`selectable` props mirror them so renderers and hit testing
/// only need to look at the object.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub visible: bool,
    pub locked: bool,
    pub object: SceneObject,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, kind: LayerKind, object: SceneObject) -> Self {
        let mut layer = Self {
            id,
            name: name.into(),
            kind,
            visible: object.props.visible,
            locked: false,
            object,
        };
        layer.sync_object();
        layer
    }

    pub fn bounds(&self) -> Bounds {
        self.object.bounds()
    }

    /// Can become the active selection.
    pub fn is_selectable(&self) -> bool {
        self.visible && !self.locked && self.object.props.selectable
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.sync_object();
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        self.sync_object();
    }

    fn sync_object(&mut self) {
        self.object.props.visible = self.visible;
        // The frame is never interactive, whatever its lock state.
        self.object.props.selectable = !self.locked && self.kind != LayerKind::Frame;
    }

    /// Text of a text layer.
    pub fn text(&self) -> Option<&str> {
        match &self.object.shape {
            Shape::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Display length of a text layer's name.
pub const TEXT_NAME_LEN: usize = 20;

/// Layer name for a text layer showing `text`.
pub fn text_layer_name(text: &str) -> String {
    let name: String = text.chars().take(TEXT_NAME_LEN).collect();
    if name.trim().is_empty() {
        "Text".to_string()
    } else {
        name
    }
}
