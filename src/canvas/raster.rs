// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Flattening the layer stack into a bitmap.
//!
//! Shapes are sampled at pixel centres without anti-aliasing, images are
//! resampled to their displayed size and alpha-blended, and text is drawn
//! with `rusttype` when the canvas has a font. Images magnified far past the
//! output are sampled per covered pixel instead of resampled whole.

use super::Canvas;
use crate::models::design::Color;
use crate::models::scene::{Anchor, SceneObject, Shape, LINE_HEIGHT};
use crate::qr::over;
use crate::util::geometry::rounded_rect_contains;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

/// Maps an object's local units to output pixels.
#[derive(Debug, Clone, Copy)]
struct Transform {
    dx: f64,
    dy: f64,
    sx: f64,
    sy: f64,
}

impl Transform {
    fn scale(multiplier: f64) -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            sx: multiplier,
            sy: multiplier,
        }
    }

    /// Transform for the contents of `obj` placed in this space.
    fn child(&self, obj: &SceneObject) -> Self {
        let bounds = obj.bounds();
        Self {
            dx: self.dx + bounds.left * self.sx,
            dy: self.dy + bounds.top * self.sy,
            sx: self.sx * obj.props.scale_x,
            sy: self.sy * obj.props.scale_y,
        }
    }
}

/// Paint every visible layer, back to front, over the canvas background.
/// `multiplier` scales the output (0.5 gives a half-size thumbnail).
pub fn render(canvas: &Canvas, multiplier: f64) -> RgbaImage {
    render_over(canvas, multiplier, canvas.background())
}

/// Like [`render`], but starting from `base` instead of the background.
/// The canvas background is still painted over `base`.
pub fn render_over(canvas: &Canvas, multiplier: f64, base: Color) -> RgbaImage {
    let width = (canvas.width() as f64 * multiplier).round().max(0.0) as u32;
    let height = (canvas.height() as f64 * multiplier).round().max(0.0) as u32;
    let fill = over(base.to_rgba(), canvas.background().to_rgba());
    let mut img = RgbaImage::from_pixel(width, height, fill);

    let root = Transform::scale(multiplier);
    for layer in canvas.layers().iter().filter(|l| l.visible) {
        paint(&mut img, &layer.object, root, canvas.font());
    }
    img
}

fn paint(img: &mut RgbaImage, obj: &SceneObject, parent: Transform, font: Option<&Font<'static>>) {
    if !obj.props.visible {
        return;
    }
    let t = parent.child(obj);
    match &obj.shape {
        Shape::Image { image } => blit(img, image, t, FilterType::Triangle),
        // Nearest keeps module edges crisp.
        Shape::Qr { graphic } => blit(img, &graphic.to_raster(), t, FilterType::Nearest),
        Shape::Rect {
            width,
            height,
            fill,
            stroke,
            stroke_width,
            radius,
        } => paint_rect(img, t, *width, *height, *fill, stroke.filter(|_| *stroke_width > 0.0), *stroke_width, *radius),
        Shape::Circle { radius, fill } => {
            let r = *radius;
            let color = fill.to_rgba();
            fill_region(img, t, (0.0, 0.0, 2.0 * r, 2.0 * r), |u, v| {
                ((u - r).powi(2) + (v - r).powi(2) <= r * r).then_some(color)
            });
        }
        Shape::Text {
            text,
            font_size,
            fill,
            bold,
            ..
        } => match font {
            Some(font) => {
                let (w, h) = obj.shape.natural_size();
                paint_text(img, font, t, obj.props.anchor, (w, h), text, *font_size, *fill, *bold);
            }
            None => log::debug!("No font loaded, skipping text '{text}'"),
        },
        Shape::Group { children } => {
            for child in children {
                paint(img, child, t, font);
            }
        }
    }
}

/// Largest resampled copy `blit` makes, as a multiple of the output area.
const MAX_RESIZE_RATIO: f64 = 4.0;

fn blit(img: &mut RgbaImage, src: &RgbaImage, t: Transform, filter: FilterType) {
    let w = (src.width() as f64 * t.sx).round();
    let h = (src.height() as f64 * t.sy).round();
    if w < 1.0 || h < 1.0 {
        return;
    }
    let (x, y) = (t.dx.round() as i64, t.dy.round() as i64);
    if (w as u32, h as u32) == src.dimensions() {
        imageops::overlay(img, src, x, y);
    } else if w * h <= MAX_RESIZE_RATIO * img.width().max(1) as f64 * img.height().max(1) as f64 {
        let resized = imageops::resize(src, w as u32, h as u32, filter);
        imageops::overlay(img, &resized, x, y);
    } else {
        // Too large to resample whole: look up only the covered output pixels.
        let (sw, sh) = src.dimensions();
        fill_region(img, t, (0.0, 0.0, sw as f64, sh as f64), |u, v| {
            let sx = (u.floor().max(0.0) as u32).min(sw - 1);
            let sy = (v.floor().max(0.0) as u32).min(sh - 1);
            Some(*src.get_pixel(sx, sy))
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_rect(
    img: &mut RgbaImage,
    t: Transform,
    w: f64,
    h: f64,
    fill: Color,
    stroke: Option<Color>,
    stroke_width: f64,
    r: f64,
) {
    let half = if stroke.is_some() { stroke_width / 2.0 } else { 0.0 };
    let fill = fill.to_rgba();
    let stroke = stroke.map(|c| c.to_rgba());

    fill_region(img, t, (-half, -half, w + half, h + half), |u, v| {
        let mut out = None;
        if fill.0[3] > 0 && rounded_rect_contains(u, v, w, h, r) {
            out = Some(fill);
        }
        if let Some(color) = stroke {
            // The stroke straddles the edge, half inside and half outside.
            let outer = rounded_rect_contains(u + half, v + half, w + 2.0 * half, h + 2.0 * half, r + half);
            let inner = w > 2.0 * half
                && h > 2.0 * half
                && rounded_rect_contains(u - half, v - half, w - 2.0 * half, h - 2.0 * half, (r - half).max(0.0));
            if outer && !inner {
                out = Some(over(out.unwrap_or(Rgba([0, 0, 0, 0])), color));
            }
        }
        out
    });
}

/// Blend `sample(u, v)` over every pixel whose centre maps into the local
/// box `(left, top, right, bottom)`.
fn fill_region(
    img: &mut RgbaImage,
    t: Transform,
    (left, top, right, bottom): (f64, f64, f64, f64),
    sample: impl Fn(f64, f64) -> Option<Rgba<u8>>,
) {
    if t.sx <= 0.0 || t.sy <= 0.0 {
        return;
    }
    let clamp_x = |v: f64| v.clamp(0.0, img.width() as f64) as u32;
    let clamp_y = |v: f64| v.clamp(0.0, img.height() as f64) as u32;
    let (x0, x1) = (clamp_x((t.dx + left * t.sx).floor()), clamp_x((t.dx + right * t.sx).ceil()));
    let (y0, y1) = (clamp_y((t.dy + top * t.sy).floor()), clamp_y((t.dy + bottom * t.sy).ceil()));

    for py in y0..y1 {
        for px in x0..x1 {
            let u = (px as f64 + 0.5 - t.dx) / t.sx;
            let v = (py as f64 + 0.5 - t.dy) / t.sy;
            if let Some(color) = sample(u, v) {
                let dst = img.get_pixel_mut(px, py);
                *dst = over(*dst, color);
            }
        }
    }
}

/// Pixel width of `text` set at `px`.
fn text_width(font: &Font<'static>, px: f32, text: &str) -> f32 {
    let scale = Scale::uniform(px);
    font.layout(text, scale, point(0.0, 0.0))
        .filter_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x as f32))
        .fold(0.0, f32::max)
}

#[allow(clippy::too_many_arguments)]
fn paint_text(
    img: &mut RgbaImage,
    font: &Font<'static>,
    t: Transform,
    anchor: Anchor,
    (box_w, box_h): (f64, f64),
    text: &str,
    font_size: f64,
    fill: Color,
    bold: bool,
) {
    let px = (font_size * t.sy) as f32;
    if px < 1.0 || text.is_empty() {
        return;
    }
    let scale = Scale::uniform(px);
    let vm = font.v_metrics(scale);
    let line = (font_size * LINE_HEIGHT * t.sy) as f32;

    let (mut x, mut y) = (t.dx as f32, t.dy as f32 + (line - (vm.ascent - vm.descent)) / 2.0);
    if anchor == Anchor::Center {
        // Centre the measured run inside the nominal box.
        let actual = text_width(font, px, text);
        x += ((box_w * t.sx) as f32 - actual) / 2.0;
        y = t.dy as f32 + ((box_h * t.sy) as f32 - (vm.ascent - vm.descent)) / 2.0;
    }

    draw_run(img, font, scale, x, y + vm.ascent, fill, text);
    if bold {
        let offset = (px / 24.0).max(1.0);
        draw_run(img, font, scale, x + offset, y + vm.ascent, fill, text);
    }
}

fn draw_run(img: &mut RgbaImage, font: &Font<'static>, scale: Scale, x: f32, baseline: f32, fill: Color, text: &str) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for glyph in font.layout(text, scale, point(x, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let (px, py) = (gx as i32 + bb.min.x, gy as i32 + bb.min.y);
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            let alpha = (fill.a as f32 * coverage).round() as u8;
            if alpha == 0 {
                return;
            }
            let dst = img.get_pixel_mut(px as u32, py as u32);
            *dst = over(*dst, Rgba([fill.r, fill.g, fill.b, alpha]));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{ShapeKind, ShapeOptions, TextOptions};
    use crate::models::scene::ObjectProps;
    use std::sync::Arc;

    const TEAL: Rgba<u8> = Rgba([0x2d, 0xd4, 0xbf, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_empty_canvas_is_background() {
        let canvas = Canvas::new(40, 30, Color::rgb(1, 2, 3));
        let img = render(&canvas, 1.0);
        assert_eq!(img.dimensions(), (40, 30));
        assert!(img.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn test_rect_and_hidden_layer() {
        let mut canvas = Canvas::new(400, 400, Color::WHITE);
        let id = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        let img = render(&canvas, 1.0);
        assert_eq!(*img.get_pixel(100, 100), TEAL);
        assert_eq!(*img.get_pixel(10, 10), WHITE);
        // Rounded corner stays clear.
        assert_eq!(*img.get_pixel(50, 50), WHITE);

        canvas.toggle_visibility(id);
        let img = render(&canvas, 1.0);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_multiplier_scales_output() {
        let mut canvas = Canvas::new(400, 400, Color::WHITE);
        canvas.add_shape(ShapeKind::Circle, ShapeOptions::default());
        let img = render(&canvas, 0.5);
        assert_eq!(img.dimensions(), (200, 200));
        // Circle of radius 25 at (50,50) has its centre at (75,75), halved.
        assert_eq!(*img.get_pixel(37, 37), TEAL);
        assert_eq!(*img.get_pixel(26, 26), WHITE);
    }

    #[test]
    fn test_stroke_straddles_edge() {
        let mut canvas = Canvas::new(100, 100, Color::WHITE);
        canvas.restore(
            100,
            100,
            Color::WHITE,
            vec![SceneObject::new(
                ObjectProps::at(20.0, 20.0),
                Shape::Rect {
                    width: 60.0,
                    height: 60.0,
                    fill: Color::TRANSPARENT,
                    stroke: Some(Color::BLACK),
                    stroke_width: 10.0,
                    radius: 0.0,
                },
            )],
        );
        let img = render(&canvas, 1.0);
        let black = Rgba([0, 0, 0, 255]);
        assert_eq!(*img.get_pixel(16, 50), black);
        assert_eq!(*img.get_pixel(23, 50), black);
        assert_eq!(*img.get_pixel(50, 50), WHITE);
        assert_eq!(*img.get_pixel(10, 50), WHITE);
    }

    #[test]
    fn test_logo_blended_at_centre() {
        let mut canvas = Canvas::new(200, 200, Color::WHITE);
        canvas
            .add_logo(RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255])), None)
            .unwrap();
        let img = render(&canvas, 1.0);
        assert_eq!(*img.get_pixel(100, 100), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(59, 100), WHITE);
        assert_eq!(*img.get_pixel(61, 100), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_huge_scale_image_samples_visible_pixels() {
        let mut src = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let props = ObjectProps::at(0.0, 0.0).scaled(1.0e6, 1.0e6);
        let mut canvas = Canvas::new(50, 50, Color::WHITE);
        canvas.restore(
            50,
            50,
            Color::WHITE,
            vec![SceneObject::new(props, Shape::Image { image: Arc::new(src) })],
        );
        // The top-left source pixel alone covers the whole output.
        let img = render(&canvas, 1.0);
        assert_eq!(img.dimensions(), (50, 50));
        assert!(img.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_large_scale_image_keeps_layout() {
        let mut src = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let props = ObjectProps::at(-40.0, 0.0).scaled(50.0, 50.0);
        let mut canvas = Canvas::new(20, 20, Color::WHITE);
        canvas.restore(
            20,
            20,
            Color::WHITE,
            vec![SceneObject::new(props, Shape::Image { image: Arc::new(src) })],
        );
        // Source column 0 spans x in -40..10, column 1 spans 10..60.
        let img = render(&canvas, 1.0);
        assert_eq!(*img.get_pixel(5, 5), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(15, 5), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_group_children_are_relative() {
        let child = SceneObject::new(
            ObjectProps::at(10.0, 10.0),
            Shape::Rect {
                width: 5.0,
                height: 5.0,
                fill: Color::BLACK,
                stroke: None,
                stroke_width: 0.0,
                radius: 0.0,
            },
        );
        let group = SceneObject::new(ObjectProps::at(20.0, 30.0), Shape::Group { children: vec![child] });
        let mut canvas = Canvas::new(60, 60, Color::WHITE);
        canvas.restore(60, 60, Color::WHITE, vec![group]);
        let img = render(&canvas, 1.0);
        assert_eq!(*img.get_pixel(32, 42), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(12, 12), WHITE);
    }

    #[test]
    fn test_text_without_font_is_skipped() {
        let mut canvas = Canvas::new(100, 100, Color::WHITE);
        canvas.add_text("hello", TextOptions::default());
        let img = render(&canvas, 1.0);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_render_over_base() {
        let canvas = Canvas::new(4, 4, Color::TRANSPARENT);
        let img = render_over(&canvas, 1.0, Color::WHITE);
        assert!(img.pixels().all(|p| *p == WHITE));
    }
}
