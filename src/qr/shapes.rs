// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Module and finder pattern shapes.
//!
//! Every data module is a unit cell with an independent radius on each
//! corner (in cell units, up to 1.0). The same description drives the
//! point-in test used by the raster path and the outline used by SVG.

use super::matrix::ModuleMatrix;
use super::style::{CornerDotShape, CornerSquareShape};
use crate::models::design::DotStyle;
use crate::util::svg::num;

/// Corner radii of a unit cell: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellShape {
    pub radii: [f64; 4],
}

const TL: usize = 0;
const TR: usize = 1;
const BR: usize = 2;
const BL: usize = 3;

impl CellShape {
    pub const SQUARE: CellShape = CellShape { radii: [0.0; 4] };
    pub const CIRCLE: CellShape = CellShape { radii: [0.5; 4] };

    fn with(corners: &[usize], radius: f64) -> Self {
        let mut radii = [0.0; 4];
        for &c in corners {
            radii[c] = radius;
        }
        CellShape { radii }
    }

    /// Point-in test for `(u, v)` in `0.0..1.0` cell coordinates.
    pub fn contains(&self, u: f64, v: f64) -> bool {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return false;
        }
        let [tl, tr, br, bl] = self.radii;
        let outside = |r: f64, cx: f64, cy: f64, in_box: bool| {
            r > 0.0 && in_box && (u - cx).powi(2) + (v - cy).powi(2) > r * r
        };
        !(outside(tl, tl, tl, u < tl && v < tl)
            || outside(tr, 1.0 - tr, tr, u > 1.0 - tr && v < tr)
            || outside(br, 1.0 - br, 1.0 - br, u > 1.0 - br && v > 1.0 - br)
            || outside(bl, bl, 1.0 - bl, u < bl && v > 1.0 - bl))
    }

    /// Closed SVG outline of the cell placed at `(x, y)` with side `size`.
    pub fn path(&self, x: f64, y: f64, size: f64) -> String {
        let [tl, tr, br, bl] = self.radii.map(|r| r * size);
        let mut d = format!("M{},{}", num(x + tl), num(y));
        d += &format!("H{}", num(x + size - tr));
        if tr > 0.0 {
            d += &arc(tr, x + size, y + tr);
        }
        d += &format!("V{}", num(y + size - br));
        if br > 0.0 {
            d += &arc(br, x + size - br, y + size);
        }
        d += &format!("H{}", num(x + bl));
        if bl > 0.0 {
            d += &arc(bl, x, y + size - bl);
        }
        d += &format!("V{}", num(y + tl));
        if tl > 0.0 {
            d += &arc(tl, x + tl, y);
        }
        d.push('Z');
        d
    }
}

fn arc(r: f64, x: f64, y: f64) -> String {
    format!("A{},{} 0 0 1 {},{}", num(r), num(r), num(x), num(y))
}

/// Shape of the dark module at `(x, y)` for the given dot style. Styles
/// other than `square` and `dots` look at the four direct neighbours.
pub fn dot_shape(style: DotStyle, matrix: &ModuleMatrix, x: usize, y: usize) -> CellShape {
    let (xi, yi) = (x as i64, y as i64);
    let neighbour = |dx: i64, dy: i64| {
        let (nx, ny) = (xi + dx, yi + dy);
        // Finder areas are drawn separately and never count as neighbours.
        nx >= 0
            && ny >= 0
            && matrix.is_dark(nx, ny)
            && !matrix.in_finder(nx as usize, ny as usize)
    };
    let left = neighbour(-1, 0);
    let right = neighbour(1, 0);
    let top = neighbour(0, -1);
    let bottom = neighbour(0, 1);
    let count = [left, right, top, bottom].iter().filter(|&&n| n).count();

    match style {
        DotStyle::Square => CellShape::SQUARE,
        DotStyle::Dots => CellShape::CIRCLE,
        DotStyle::Rounded => {
            if count == 0 {
                CellShape::CIRCLE
            } else if count > 2 || (left && right) || (top && bottom) {
                CellShape::SQUARE
            } else if count == 2 {
                // Round the corner facing away from both neighbours.
                let corner = match (left, top) {
                    (true, true) => BR,
                    (true, false) => TR,
                    (false, true) => BL,
                    (false, false) => TL,
                };
                CellShape::with(&[corner], 0.5)
            } else if top {
                CellShape::with(&[BL, BR], 0.5)
            } else if bottom {
                CellShape::with(&[TL, TR], 0.5)
            } else if left {
                CellShape::with(&[TR, BR], 0.5)
            } else {
                CellShape::with(&[TL, BL], 0.5)
            }
        }
        DotStyle::Classy | DotStyle::ClassyRounded => {
            let radius = if style == DotStyle::Classy { 0.5 } else { 1.0 };
            if count == 0 {
                CellShape::with(&[TL, BR], radius)
            } else if !left && !top {
                CellShape::with(&[TL], radius)
            } else if !right && !bottom {
                CellShape::with(&[BR], radius)
            } else {
                CellShape::SQUARE
            }
        }
    }
}

/// Point-in test for the 7×7 finder ring, `(u, v)` in module units.
pub fn finder_ring_contains(shape: CornerSquareShape, u: f64, v: f64) -> bool {
    match shape {
        CornerSquareShape::Square => {
            let outer = (0.0..7.0).contains(&u) && (0.0..7.0).contains(&v);
            let inner = (1.0..6.0).contains(&u) && (1.0..6.0).contains(&v);
            outer && !inner
        }
        CornerSquareShape::Dot => {
            let d2 = (u - 3.5).powi(2) + (v - 3.5).powi(2);
            d2 <= 3.5 * 3.5 && d2 > 2.5 * 2.5
        }
        CornerSquareShape::ExtraRounded => {
            let outer = crate::util::geometry::rounded_rect_contains(u, v, 7.0, 7.0, 2.5);
            let inner = crate::util::geometry::rounded_rect_contains(u - 1.0, v - 1.0, 5.0, 5.0, 1.5);
            outer && !inner
        }
    }
}

/// Point-in test for the 3×3 finder centre, `(u, v)` in module units
/// relative to the finder's top-left.
pub fn finder_dot_contains(shape: CornerDotShape, u: f64, v: f64) -> bool {
    match shape {
        CornerDotShape::Square => (2.0..5.0).contains(&u) && (2.0..5.0).contains(&v),
        CornerDotShape::Dot => (u - 3.5).powi(2) + (v - 3.5).powi(2) <= 1.5 * 1.5,
    }
}

/// SVG outline of the finder ring at `(x, y)`, `m` pixels per module.
/// Use with `fill-rule="evenodd"`.
pub fn finder_ring_path(shape: CornerSquareShape, x: f64, y: f64, m: f64) -> String {
    match shape {
        CornerSquareShape::Square => {
            format!(
                "{}{}",
                rect_path(x, y, 7.0 * m, 7.0 * m, 0.0),
                rect_path(x + m, y + m, 5.0 * m, 5.0 * m, 0.0)
            )
        }
        CornerSquareShape::Dot => format!(
            "{}{}",
            circle_path(x + 3.5 * m, y + 3.5 * m, 3.5 * m),
            circle_path(x + 3.5 * m, y + 3.5 * m, 2.5 * m)
        ),
        CornerSquareShape::ExtraRounded => format!(
            "{}{}",
            rect_path(x, y, 7.0 * m, 7.0 * m, 2.5 * m),
            rect_path(x + m, y + m, 5.0 * m, 5.0 * m, 1.5 * m)
        ),
    }
}

pub fn finder_dot_path(shape: CornerDotShape, x: f64, y: f64, m: f64) -> String {
    match shape {
        CornerDotShape::Square => rect_path(x + 2.0 * m, y + 2.0 * m, 3.0 * m, 3.0 * m, 0.0),
        CornerDotShape::Dot => circle_path(x + 3.5 * m, y + 3.5 * m, 1.5 * m),
    }
}

fn rect_path(x: f64, y: f64, w: f64, h: f64, r: f64) -> String {
    if r <= 0.0 {
        return format!("M{},{}h{}v{}h{}Z", num(x), num(y), num(w), num(h), num(-w));
    }
    let mut d = format!("M{},{}", num(x + r), num(y));
    d += &format!("H{}", num(x + w - r));
    d += &arc(r, x + w, y + r);
    d += &format!("V{}", num(y + h - r));
    d += &arc(r, x + w - r, y + h);
    d += &format!("H{}", num(x + r));
    d += &arc(r, x, y + h - r);
    d += &format!("V{}", num(y + r));
    d += &arc(r, x + r, y);
    d.push('Z');
    d
}

fn circle_path(cx: f64, cy: f64, r: f64) -> String {
    format!(
        "M{},{}a{},{} 0 1 0 {},0a{},{} 0 1 0 {},0Z",
        num(cx - r),
        num(cy),
        num(r),
        num(r),
        num(2.0 * r),
        num(r),
        num(r),
        num(-2.0 * r)
    )
}
