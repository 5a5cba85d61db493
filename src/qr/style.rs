// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Resolution of a [`QrDesign`] into concrete drawing primitives.
//!
//! The design offers five corner styles but the renderer only has three
//! corner-square shapes and two corner-dot shapes, so several styles
//! collapse onto the same primitive (`classy` draws exactly like `square`).
//! With a gradient enabled, corner squares take the first stop and corner
//! dots the second; the body uses the full gradient.

use crate::models::design::{Color, CornerStyle, DotStyle, GradientType, QrDesign};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareShape {
    Square,
    ExtraRounded,
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotShape {
    Square,
    Dot,
}

pub fn corner_square_shape(style: CornerStyle) -> CornerSquareShape {
    match style {
        CornerStyle::Square => CornerSquareShape::Square,
        CornerStyle::Rounded => CornerSquareShape::ExtraRounded,
        CornerStyle::Circle => CornerSquareShape::Dot,
        CornerStyle::Classy => CornerSquareShape::Square,
        CornerStyle::ClassyRounded => CornerSquareShape::ExtraRounded,
    }
}

pub fn corner_dot_shape(style: CornerStyle) -> CornerDotShape {
    match style {
        CornerStyle::Square => CornerDotShape::Square,
        CornerStyle::Rounded => CornerDotShape::Square,
        CornerStyle::Circle => CornerDotShape::Dot,
        CornerStyle::Classy => CornerDotShape::Square,
        CornerStyle::ClassyRounded => CornerDotShape::Dot,
    }
}

/// Fill used for the data modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BodyPaint {
    Solid {
        color: Color,
    },
    Gradient {
        kind: GradientType,
        /// Radians.
        rotation: f64,
        from: Color,
        to: Color,
    },
}

/// Everything the renderer needs besides the module grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolStyle {
    pub dots: DotStyle,
    pub corner_square: CornerSquareShape,
    pub corner_dot: CornerDotShape,
    pub body: BodyPaint,
    pub corner_square_color: Color,
    pub corner_dot_color: Color,
    pub background: Color,
}

impl SymbolStyle {
    pub fn resolve(design: &QrDesign) -> Self {
        let gradient = &design.gradient;
        let (body, corner_square_color, corner_dot_color) = if gradient.enabled {
            (
                BodyPaint::Gradient {
                    kind: gradient.gradient_type,
                    rotation: gradient.rotation_radians(),
                    from: gradient.color1,
                    to: gradient.color2,
                },
                gradient.color1,
                gradient.color2,
            )
        } else {
            let fg = design.foreground_color;
            (BodyPaint::Solid { color: fg }, fg, fg)
        };

        Self {
            dots: design.dot_style,
            corner_square: corner_square_shape(design.corner_style),
            corner_dot: corner_dot_shape(design.corner_dot_style),
            body,
            corner_square_color,
            corner_dot_color,
            background: design.background_color,
        }
    }
}

/// Body paint resolved against a concrete symbol size.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        start: (f64, f64),
        end: (f64, f64),
        from: Color,
        to: Color,
    },
    Radial {
        center: (f64, f64),
        radius: f64,
        from: Color,
        to: Color,
    },
}

impl Paint {
    pub fn for_body(body: &BodyPaint, size: f64) -> Self {
        match body {
            BodyPaint::Solid { color } => Paint::Solid(*color),
            BodyPaint::Gradient {
                kind: GradientType::Radial,
                from,
                to,
                ..
            } => Paint::Radial {
                center: (size / 2.0, size / 2.0),
                radius: size / 2.0,
                from: *from,
                to: *to,
            },
            BodyPaint::Gradient {
                kind: GradientType::Linear,
                rotation,
                from,
                to,
            } => {
                let (start, end) = linear_axis(*rotation, size);
                Paint::Linear {
                    start,
                    end,
                    from: *from,
                    to: *to,
                }
            }
        }
    }

    pub fn color_at(&self, x: f64, y: f64) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::Linear {
                start,
                end,
                from,
                to,
            } => {
                let (dx, dy) = (end.0 - start.0, end.1 - start.1);
                let len2 = dx * dx + dy * dy;
                if len2 == 0.0 {
                    return *from;
                }
                let t = ((x - start.0) * dx + (y - start.1) * dy) / len2;
                from.lerp(to, t)
            }
            Paint::Radial {
                center,
                radius,
                from,
                to,
            } => {
                if *radius <= 0.0 {
                    return *from;
                }
                let dist = ((x - center.0).powi(2) + (y - center.1).powi(2)).sqrt();
                from.lerp(to, dist / radius)
            }
        }
    }
}

/// Gradient axis through the centre of a `size`×`size` square, chosen so the
/// axis ends on the square's edges for any rotation.
fn linear_axis(rotation: f64, size: f64) -> ((f64, f64), (f64, f64)) {
    let r = rotation.rem_euclid(2.0 * PI);
    let half = size / 2.0;
    let (cx, cy) = (half, half);
    if r <= 0.25 * PI || r > 1.75 * PI {
        let dy = half * r.tan();
        ((cx - half, cy - dy), (cx + half, cy + dy))
    } else if r <= 0.75 * PI {
        let dx = half / r.tan();
        ((cx - dx, cy - half), (cx + dx, cy + half))
    } else if r <= 1.25 * PI {
        let dy = half * r.tan();
        ((cx + half, cy + dy), (cx - half, cy - dy))
    } else {
        let dx = half / r.tan();
        ((cx + dx, cy + half), (cx - dx, cy - half))
    }
}
