// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Exporting the composition as PNG, JPEG or SVG.
//!
//! Every export repaints the canvas first so pending edits are captured.
//! JPEG has no alpha channel, so JPEG output is flattened onto white
//! before the canvas background and layers are painted.

use crate::canvas::{raster, svg, Canvas};
use crate::error::{Result, StudioError};
use crate::io::media::{encode_png, to_data_url};
use crate::models::design::Color;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use std::str::FromStr;

/// Longest side a raster export may have, in pixels.
pub const MAX_OUTPUT_SIDE: f64 = 16384.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(format!("unsupported export format '{other}' (expected png, jpeg or svg)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Output scale relative to the canvas size.
    pub multiplier: f64,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            multiplier: 1.0,
            jpeg_quality: 92,
        }
    }
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }
}

/// An encoded export.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Png(Vec<u8>),
    Jpeg(Vec<u8>),
    Svg(String),
}

impl Artifact {
    pub fn format(&self) -> ExportFormat {
        match self {
            Artifact::Png(_) => ExportFormat::Png,
            Artifact::Jpeg(_) => ExportFormat::Jpeg,
            Artifact::Svg(_) => ExportFormat::Svg,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Png(bytes) | Artifact::Jpeg(bytes) => bytes,
            Artifact::Svg(text) => text.as_bytes(),
        }
    }

    pub fn to_data_url(&self) -> String {
        to_data_url(self.format().mime(), self.as_bytes())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.as_bytes())?;
        log::info!("Wrote {} export to {}", self.format().extension(), path.display());
        Ok(())
    }
}

/// Render the canvas in the requested format.
pub fn export(canvas: &mut Canvas, options: &ExportOptions) -> Result<Artifact> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(StudioError::ExportFailure("the canvas has no area".into()));
    }
    if !(options.multiplier.is_finite() && options.multiplier > 0.0) {
        return Err(StudioError::ExportFailure(format!(
            "invalid output scale {}",
            options.multiplier
        )));
    }
    let longest = canvas.width().max(canvas.height()) as f64 * options.multiplier;
    if options.format != ExportFormat::Svg && longest > MAX_OUTPUT_SIDE {
        return Err(StudioError::ExportFailure(format!(
            "output scale {} would make a {longest:.0}px image, the limit is {MAX_OUTPUT_SIDE}px",
            options.multiplier
        )));
    }
    canvas.render_all();

    let artifact = match options.format {
        ExportFormat::Png => Artifact::Png(encode_png(&flatten(canvas, options))?),
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(flatten(canvas, options)).to_rgb8();
            let mut bytes = Vec::new();
            JpegEncoder::new_with_quality(&mut bytes, options.jpeg_quality.clamp(1, 100))
                .encode_image(&rgb)
                .map_err(|e| StudioError::ExportFailure(format!("JPEG encoding failed: {e}")))?;
            Artifact::Jpeg(bytes)
        }
        ExportFormat::Svg => Artifact::Svg(svg::render(canvas)?),
    };
    log::info!(
        "Exported {} ({} bytes, {} layers)",
        options.format.extension(),
        artifact.as_bytes().len(),
        canvas.layers().len()
    );
    Ok(artifact)
}

/// The bitmap a raster export would encode.
pub fn flatten(canvas: &mut Canvas, options: &ExportOptions) -> RgbaImage {
    match options.format {
        ExportFormat::Jpeg => raster::render_over(canvas, options.multiplier, Color::WHITE),
        _ if options.multiplier == 1.0 => canvas.render_all().clone(),
        _ => raster::render(canvas, options.multiplier),
    }
}

/// Downscaled PNG data URL for project listings.
pub fn thumbnail(canvas: &mut Canvas, scale: f64) -> Result<String> {
    let options = ExportOptions {
        multiplier: scale,
        ..ExportOptions::new(ExportFormat::Png)
    };
    Ok(export(canvas, &options)?.to_data_url())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{QrArtwork, ShapeKind, ShapeOptions};
    use crate::models::design::{find_frame_template, FrameTemplate, QrDesign};
    use crate::io::media::decode_image;
    use image::Rgba;

    fn qr_canvas(background: Color) -> Canvas {
        let mut canvas = Canvas::new(400, 400, background);
        let design = QrDesign {
            background_color: Color::TRANSPARENT,
            size: 200,
            ..Default::default()
        };
        let graphic = crate::qr::render("https://example.com", &design).unwrap();
        canvas.upsert_qr(QrArtwork::Symbol(graphic)).unwrap();
        canvas
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JPG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!(ExportFormat::from_path(Path::new("out.svg")), Some(ExportFormat::Svg));
        assert_eq!(ExportFormat::from_path(Path::new("out.gif")), None);
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let mut canvas = qr_canvas(Color::WHITE);
        let artifact = export(&mut canvas, &ExportOptions::default()).unwrap();
        let decoded = decode_image(artifact.as_bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (400, 400));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert!(artifact.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_is_flattened_onto_white() {
        let mut canvas = qr_canvas(Color::TRANSPARENT);
        let flat = flatten(&mut canvas, &ExportOptions::new(ExportFormat::Jpeg));
        assert!(flat.pixels().all(|p| p.0[3] == 255));
        assert_eq!(*flat.get_pixel(5, 5), Rgba([255, 255, 255, 255]));

        let artifact = export(&mut canvas, &ExportOptions::new(ExportFormat::Jpeg)).unwrap();
        assert!(matches!(artifact, Artifact::Jpeg(_)));
        let decoded = decode_image(artifact.as_bytes()).unwrap();
        assert!(decoded.pixels().all(|p| p.0[3] == 255));
        let corner = decoded.get_pixel(5, 5);
        assert!(corner.0[..3].iter().all(|&c| c > 240));
    }

    #[test]
    fn test_thumbnail_is_half_size() {
        let mut canvas = qr_canvas(Color::WHITE);
        let url = thumbnail(&mut canvas, 0.5).unwrap();
        let thumb = crate::io::media::decode_data_url(&url).unwrap();
        assert_eq!(thumb.dimensions(), (200, 200));
    }

    #[test]
    fn test_export_reflects_pending_edits() {
        let mut canvas = Canvas::new(100, 100, Color::WHITE);
        canvas.render_all();
        canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
        let flat = flatten(&mut canvas, &ExportOptions::default());
        assert_eq!(*flat.get_pixel(75, 75), Rgba([0x2d, 0xd4, 0xbf, 255]));
    }

    #[test]
    fn test_zero_size_canvas_fails() {
        let mut canvas = Canvas::new(0, 100, Color::WHITE);
        for format in [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Svg] {
            let err = export(&mut canvas, &ExportOptions::new(format)).unwrap_err();
            assert!(matches!(err, StudioError::ExportFailure(_)));
        }
        let mut canvas = qr_canvas(Color::WHITE);
        let options = ExportOptions {
            multiplier: 0.0,
            ..Default::default()
        };
        assert!(export(&mut canvas, &options).is_err());
    }

    #[test]
    fn test_oversized_output_scale_fails() {
        let mut canvas = qr_canvas(Color::WHITE);
        for format in [ExportFormat::Png, ExportFormat::Jpeg] {
            let options = ExportOptions {
                multiplier: 1.0e6,
                ..ExportOptions::new(format)
            };
            let err = export(&mut canvas, &options).unwrap_err();
            assert!(matches!(err, StudioError::ExportFailure(_)));
        }
        // SVG output is resolution independent.
        let options = ExportOptions {
            multiplier: 1.0e6,
            ..ExportOptions::new(ExportFormat::Svg)
        };
        assert!(export(&mut canvas, &options).is_ok());
    }

    #[test]
    fn test_removed_banner_leaves_no_pixels() {
        let mut canvas = qr_canvas(Color::WHITE);
        let plain = flatten(&mut canvas, &ExportOptions::default());

        canvas.apply_frame(&find_frame_template("banner").unwrap(), 200.0);
        let framed = flatten(&mut canvas, &ExportOptions::default());
        assert_ne!(framed, plain);
        // Banner strip below the frame square.
        assert_ne!(*framed.get_pixel(200, 330), Rgba([255, 255, 255, 255]));

        canvas.apply_frame(&FrameTemplate::none(), 200.0);
        assert!(canvas.frame_layer().is_none());
        assert_eq!(flatten(&mut canvas, &ExportOptions::default()), plain);
    }

    #[test]
    fn test_hidden_layers_match_across_formats() {
        const TEAL: Rgba<u8> = Rgba([0x2d, 0xd4, 0xbf, 255]);
        const RED: Rgba<u8> = Rgba([200, 0, 0, 255]);

        for (hide_rect, hide_circle) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut canvas = Canvas::new(200, 200, Color::WHITE);
            let rect = canvas.add_shape(ShapeKind::Rect, ShapeOptions::default());
            let circle = canvas.add_shape(
                ShapeKind::Circle,
                ShapeOptions {
                    fill: Some(Color::rgb(200, 0, 0)),
                    ..Default::default()
                },
            );
            if hide_rect {
                canvas.toggle_visibility(rect);
            }
            if hide_circle {
                canvas.toggle_visibility(circle);
            }

            let flat = flatten(&mut canvas, &ExportOptions::default());
            let svg = match export(&mut canvas, &ExportOptions::new(ExportFormat::Svg)).unwrap() {
                Artifact::Svg(text) => text,
                other => panic!("expected svg, got {:?}", other.format()),
            };

            assert_eq!(flat.pixels().any(|p| *p == TEAL), !hide_rect);
            assert_eq!(flat.pixels().any(|p| *p == RED), !hide_circle);
            assert_eq!(svg.contains(&format!("id=\"{rect}\"")), !hide_rect);
            assert_eq!(svg.contains(&format!("id=\"{circle}\"")), !hide_circle);
        }
    }
}
