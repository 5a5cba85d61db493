// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Scene coordinates are canvas units with the origin at the top-left
//! corner of the canvas and y growing downwards.

use serde::{Deserialize, Serialize};

/// A 2D point in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right() && p.y >= self.top && p.y < self.bottom()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Bounds::new(
            left,
            top,
            self.right().max(other.right()) - left,
            self.bottom().max(other.bottom()) - top,
        )
    }
}

/// Uniform scale that fits `width`×`height` inside a `max`×`max` square,
/// preserving aspect ratio.
pub fn fit_scale(width: f64, height: f64, max: f64) -> f64 {
    if width <= 0.0 || height <= 0.0 {
        return 1.0;
    }
    (max / width).min(max / height)
}

/// Top-left corner that centers a `width`×`height` box on the canvas.
pub fn centered_origin(canvas_width: f64, canvas_height: f64, width: f64, height: f64) -> Point {
    Point::new((canvas_width - width) / 2.0, (canvas_height - height) / 2.0)
}

/// Does the point `(x, y)` fall inside a rounded rectangle at the origin of
/// size `w`×`h` with corner radius `r`.
pub fn rounded_rect_contains(x: f64, y: f64, w: f64, h: f64, r: f64) -> bool {
    if x < 0.0 || y < 0.0 || x > w || y > h {
        return false;
    }
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    if r == 0.0 {
        return true;
    }
    let cx = x.clamp(r, w - r);
    let cy = y.clamp(r, h - r);
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy <= r * r
}
