// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Writing the layer stack as an SVG document.
//!
//! Each visible layer becomes a `<g>` carrying its id, name and kind and a
//! transform for its position and scale. Hidden layers and hidden objects
//! are left out of the document entirely, the same as the raster path.

use super::Canvas;
use crate::error::Result;
use crate::io::media;
use crate::models::scene::{Anchor, SceneObject, Shape};
use crate::util::svg::{escape, num, paint};
use std::fmt::Write;

/// Serialize every visible layer, back to front.
pub fn render(canvas: &Canvas) -> Result<String> {
    let (w, h) = (canvas.width(), canvas.height());
    let mut out = String::new();
    out += "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n";
    out += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
    );
    out += &format!(
        "<rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" {}/>\n",
        paint("fill", &canvas.background())
    );

    for layer in canvas.layers().iter().filter(|l| l.visible) {
        let id = layer.id.to_string();
        let attrs = format!(
            " id=\"{id}\" data-name=\"{}\" data-kind=\"{}\"",
            escape(&layer.name),
            layer.kind
        );
        write_object(&mut out, &layer.object, &id, &attrs)?;
    }

    out += "</svg>\n";
    Ok(out)
}

fn write_object(out: &mut String, obj: &SceneObject, id: &str, attrs: &str) -> Result<()> {
    if !obj.props.visible {
        return Ok(());
    }
    let bounds = obj.bounds();
    let _ = writeln!(
        out,
        "<g{attrs} transform=\"translate({} {}) scale({} {})\">",
        num(bounds.left),
        num(bounds.top),
        num(obj.props.scale_x),
        num(obj.props.scale_y)
    );

    match &obj.shape {
        Shape::Image { image } => {
            let _ = writeln!(
                out,
                "<image width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
                image.width(),
                image.height(),
                media::png_data_url(image)?
            );
        }
        Shape::Qr { graphic } => *out += &graphic.svg_elements(id),
        Shape::Rect {
            width,
            height,
            fill,
            stroke,
            stroke_width,
            radius,
        } => {
            let corners = if *radius > 0.0 {
                format!(" rx=\"{0}\" ry=\"{0}\"", num(*radius))
            } else {
                String::new()
            };
            let stroke = match stroke {
                Some(color) if *stroke_width > 0.0 => {
                    format!(" {} stroke-width=\"{}\"", paint("stroke", color), num(*stroke_width))
                }
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\"{corners} {}{stroke}/>",
                num(*width),
                num(*height),
                paint("fill", fill)
            );
        }
        Shape::Circle { radius, fill } => {
            let _ = writeln!(
                out,
                "<circle cx=\"{0}\" cy=\"{0}\" r=\"{0}\" {1}/>",
                num(*radius),
                paint("fill", fill)
            );
        }
        Shape::Text {
            text,
            font_size,
            fill,
            font_family,
            bold,
        } => {
            let (w, h) = obj.shape.natural_size();
            let (x, anchor) = match obj.props.anchor {
                Anchor::Center => (w / 2.0, "middle"),
                Anchor::TopLeft => (0.0, "start"),
            };
            let weight = if *bold { " font-weight=\"bold\"" } else { "" };
            let _ = writeln!(
                out,
                "<text x=\"{}\" y=\"{}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\"{weight} {}>{}</text>",
                num(x),
                num(h / 2.0),
                escape(font_family),
                num(*font_size),
                paint("fill", fill),
                escape(text)
            );
        }
        Shape::Group { children } => {
            for (i, child) in children.iter().enumerate() {
                write_object(out, child, &format!("{id}-{i}"), "")?;
            }
        }
    }

    *out += "</g>\n";
    Ok(())
}
