// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! QR symbol rendering.
//!
//! [`render`] turns an encoded payload and a [`QrDesign`] into a
//! [`QrGraphic`]: the module grid plus resolved styling at a fixed pixel
//! size. A graphic rasterizes to an RGBA bitmap or writes itself as SVG;
//! both outputs are pure functions of the graphic, so regenerating from the
//! same inputs is pixel-identical.

pub mod matrix;
pub mod shapes;
pub mod style;

use crate::error::{Result, StudioError};
use crate::models::design::{Color, QrDesign};
use crate::util::svg::{self, num};
use image::{Rgba, RgbaImage};
use matrix::{ModuleMatrix, FINDER_SIZE};
use serde::{Deserialize, Serialize};
use shapes::{dot_shape, finder_dot_contains, finder_dot_path, finder_ring_contains, finder_ring_path};
use style::{Paint, SymbolStyle};

/// A styled QR symbol at a fixed pixel size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrGraphic {
    pub size: u32,
    pub matrix: ModuleMatrix,
    pub style: SymbolStyle,
}

/// Pixel layout of the module grid inside the symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    module: f64,
    offset: f64,
    count: usize,
}

/// Build the styled symbol for `encoded` with `design`.
pub fn render(encoded: &str, design: &QrDesign) -> Result<QrGraphic> {
    let matrix = ModuleMatrix::encode(encoded, design.error_correction)?;
    let size = design.pixel_size();
    if (size as usize) < matrix.width() {
        return Err(StudioError::RenderFailure(format!(
            "a {}×{} module symbol does not fit in {size}px",
            matrix.width(),
            matrix.width()
        )));
    }
    log::debug!(
        "Rendered QR symbol: {} modules, {}px, level {:?}",
        matrix.width(),
        size,
        design.error_correction
    );
    Ok(QrGraphic {
        size,
        matrix,
        style: SymbolStyle::resolve(design),
    })
}

/// Convenience: render straight to a bitmap.
pub fn render_raster(encoded: &str, design: &QrDesign) -> Result<RgbaImage> {
    Ok(render(encoded, design)?.to_raster())
}

/// Convenience: render straight to an SVG document.
pub fn render_svg(encoded: &str, design: &QrDesign) -> Result<String> {
    Ok(render(encoded, design)?.to_svg())
}

impl QrGraphic {
    fn layout(&self) -> Layout {
        let count = self.matrix.width();
        let module = (self.size as usize / count) as f64;
        let offset = ((self.size as usize - count * module as usize) / 2) as f64;
        Layout {
            module,
            offset,
            count,
        }
    }

    /// Rasterize at the graphic's natural size.
    pub fn to_raster(&self) -> RgbaImage {
        let layout = self.layout();
        let size = self.size as f64;
        let body = Paint::for_body(&self.style.body, size);
        let background = self.style.background.to_rgba();
        let finders = self.matrix.finder_origins();

        RgbaImage::from_fn(self.size, self.size, |px, py| {
            let (x, y) = (px as f64 + 0.5, py as f64 + 0.5);
            let gx = (x - layout.offset) / layout.module;
            let gy = (y - layout.offset) / layout.module;
            if gx < 0.0 || gy < 0.0 || gx >= layout.count as f64 || gy >= layout.count as f64 {
                return background;
            }

            for &(fx, fy) in &finders {
                let (u, v) = (gx - fx as f64, gy - fy as f64);
                if (0.0..FINDER_SIZE as f64).contains(&u) && (0.0..FINDER_SIZE as f64).contains(&v) {
                    if finder_ring_contains(self.style.corner_square, u, v) {
                        return self.style.corner_square_color.to_rgba();
                    }
                    if finder_dot_contains(self.style.corner_dot, u, v) {
                        return self.style.corner_dot_color.to_rgba();
                    }
                    return background;
                }
            }

            let (mx, my) = (gx.floor() as usize, gy.floor() as usize);
            if !self.matrix.is_dark(mx as i64, my as i64) {
                return background;
            }
            let shape = dot_shape(self.style.dots, &self.matrix, mx, my);
            if shape.contains(gx - mx as f64, gy - my as f64) {
                over(background, body.color_at(x, y).to_rgba())
            } else {
                background
            }
        })
    }

    /// Standalone SVG document at the graphic's natural size.
    pub fn to_svg(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\">\n{1}</svg>\n",
            self.size,
            self.svg_elements("qr")
        )
    }

    /// The symbol's SVG elements in its own pixel space. `id` prefixes the
    /// gradient definition so several symbols can share one document.
    pub fn svg_elements(&self, id: &str) -> String {
        let layout = self.layout();
        let size = self.size as f64;
        let m = layout.module;
        let mut out = String::new();

        let body_fill = match Paint::for_body(&self.style.body, size) {
            Paint::Solid(color) => svg::paint("fill", &color),
            Paint::Linear {
                start,
                end,
                from,
                to,
            } => {
                out += &format!(
                    "<defs><linearGradient id=\"{id}-dots\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">{}</linearGradient></defs>\n",
                    num(start.0),
                    num(start.1),
                    num(end.0),
                    num(end.1),
                    stops(&from, &to)
                );
                format!("fill=\"url(#{id}-dots)\"")
            }
            Paint::Radial {
                center,
                radius,
                from,
                to,
            } => {
                out += &format!(
                    "<defs><radialGradient id=\"{id}-dots\" gradientUnits=\"userSpaceOnUse\" cx=\"{}\" cy=\"{}\" r=\"{}\">{}</radialGradient></defs>\n",
                    num(center.0),
                    num(center.1),
                    num(radius),
                    stops(&from, &to)
                );
                format!("fill=\"url(#{id}-dots)\"")
            }
        };

        out += &format!(
            "<rect x=\"0\" y=\"0\" width=\"{0}\" height=\"{0}\" {1}/>\n",
            self.size,
            svg::paint("fill", &self.style.background)
        );

        let mut dots = String::new();
        for my in 0..layout.count {
            for mx in 0..layout.count {
                if !self.matrix.is_dark(mx as i64, my as i64) || self.matrix.in_finder(mx, my) {
                    continue;
                }
                let shape = dot_shape(self.style.dots, &self.matrix, mx, my);
                dots += &shape.path(
                    layout.offset + mx as f64 * m,
                    layout.offset + my as f64 * m,
                    m,
                );
            }
        }
        out += &format!("<path d=\"{dots}\" {body_fill}/>\n");

        let mut rings = String::new();
        let mut centres = String::new();
        for (fx, fy) in self.matrix.finder_origins() {
            let x = layout.offset + fx as f64 * m;
            let y = layout.offset + fy as f64 * m;
            rings += &finder_ring_path(self.style.corner_square, x, y, m);
            centres += &finder_dot_path(self.style.corner_dot, x, y, m);
        }
        out += &format!(
            "<path d=\"{rings}\" fill-rule=\"evenodd\" {}/>\n",
            svg::paint("fill", &self.style.corner_square_color)
        );
        out += &format!(
            "<path d=\"{centres}\" {}/>\n",
            svg::paint("fill", &self.style.corner_dot_color)
        );
        out
    }
}

fn stops(from: &Color, to: &Color) -> String {
    let stop = |offset: u8, c: &Color| {
        format!(
            "<stop offset=\"{offset}\" stop-color=\"#{:02x}{:02x}{:02x}\" stop-opacity=\"{}\"/>",
            c.r,
            c.g,
            c.b,
            num(c.a as f64 / 255.0)
        )
    };
    format!("{}{}", stop(0, from), stop(1, to))
}

/// Source-over of `src` onto `dst`, both straight alpha.
pub(crate) fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as f64 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.0[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        ((s as f64 * sa + d as f64 * da * (1.0 - sa)) / out_a).round() as u8
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        (out_a * 255.0).round() as u8,
    ])
}
