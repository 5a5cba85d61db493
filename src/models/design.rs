// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Visual design of a QR code.
//!
//! This module defines colors, gradients, dot and corner styles, the
//! error correction level and the frame templates the editor offers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB color with straight alpha. Serialized as `#rrggbb` (opaque) or
/// `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `transparent`, `white` or `black`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "transparent" => return Ok(Color::TRANSPARENT),
            "white" => return Ok(Color::WHITE),
            "black" => return Ok(Color::BLACK),
            _ => {}
        }

        let hex = s
            .strip_prefix('#')
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| format!("invalid color: {s}"))?;
        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>() + "ff",
            6 => format!("{hex}ff"),
            8 => hex.to_string(),
            _ => return Err(format!("invalid color: {s}")),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| format!("invalid color: {s}"))
        };
        Ok(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: channel(6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_rgba(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    /// Linear interpolation between two colors, `t` in `0.0..=1.0`.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    #[default]
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub gradient_type: GradientType,
    pub color1: Color,
    pub color2: Color,
    /// Degrees, 0 to 360.
    pub rotation: f64,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gradient_type: GradientType::Linear,
            color1: Color::rgb(0x1a, 0x36, 0x5d),
            color2: Color::rgb(0x2d, 0xd4, 0xbf),
            rotation: 45.0,
        }
    }
}

impl GradientConfig {
    pub fn rotation_radians(&self) -> f64 {
        self.rotation.to_radians()
    }
}

/// Shape of the data modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotStyle {
    #[default]
    Square,
    Dots,
    Rounded,
    Classy,
    ClassyRounded,
}

/// Style choice for the finder patterns (outer square and inner dot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerStyle {
    #[default]
    Square,
    Rounded,
    Circle,
    Classy,
    ClassyRounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl ErrorCorrection {
    pub fn to_ec_level(self) -> qrcode::EcLevel {
        match self {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

impl std::str::FromStr for ErrorCorrection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L" => Ok(ErrorCorrection::L),
            "M" => Ok(ErrorCorrection::M),
            "Q" => Ok(ErrorCorrection::Q),
            "H" => Ok(ErrorCorrection::H),
            other => Err(format!("unknown error correction level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    #[default]
    None,
    Simple,
    Rounded,
    Label,
    Banner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Top,
    #[default]
    Bottom,
}

/// A named, reusable frame configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_position: Option<LabelPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Default for FrameTemplate {
    fn default() -> Self {
        Self::none()
    }
}

impl FrameTemplate {
    pub fn none() -> Self {
        Self {
            id: "none".into(),
            name: "None".into(),
            frame_type: FrameType::None,
            label_text: None,
            label_position: None,
            color: None,
        }
    }

    fn styled(id: &str, name: &str, frame_type: FrameType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            frame_type,
            label_text: None,
            label_position: None,
            color: Some(BRAND_NAVY),
        }
    }

    fn labelled(id: &str, name: &str, frame_type: FrameType, text: &str, position: LabelPosition) -> Self {
        Self {
            label_text: Some(text.into()),
            label_position: Some(position),
            ..Self::styled(id, name, frame_type)
        }
    }

    pub fn is_none(&self) -> bool {
        self.frame_type == FrameType::None
    }
}

const BRAND_NAVY: Color = Color::rgb(0x1a, 0x36, 0x5d);

/// The fixed catalog of frame templates shipped with the editor.
pub fn frame_templates() -> Vec<FrameTemplate> {
    vec![
        FrameTemplate::none(),
        FrameTemplate::styled("simple", "Simple Border", FrameType::Simple),
        FrameTemplate::styled("rounded", "Rounded Border", FrameType::Rounded),
        FrameTemplate::labelled("scan-me-top", "Scan Me (Top)", FrameType::Label, "SCAN ME", LabelPosition::Top),
        FrameTemplate::labelled(
            "scan-me-bottom",
            "Scan Me (Bottom)",
            FrameType::Label,
            "SCAN ME",
            LabelPosition::Bottom,
        ),
        FrameTemplate::labelled("banner", "Banner", FrameType::Banner, "SCAN TO VISIT", LabelPosition::Bottom),
    ]
}

/// Look up a catalog template by id.
pub fn find_frame_template(id: &str) -> Option<FrameTemplate> {
    frame_templates().into_iter().find(|t| t.id == id)
}

pub const MIN_SIZE: u32 = 128;
pub const MAX_SIZE: u32 = 512;

/// Complete styling of a QR code. Missing fields load as defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrDesign {
    pub foreground_color: Color,
    pub background_color: Color,
    pub gradient: GradientConfig,
    pub dot_style: DotStyle,
    pub corner_style: CornerStyle,
    pub corner_dot_style: CornerStyle,
    pub error_correction: ErrorCorrection,
    /// Target pixel size, 128 to 512.
    pub size: u32,
    pub frame: FrameTemplate,
}

impl Default for QrDesign {
    fn default() -> Self {
        Self {
            foreground_color: BRAND_NAVY,
            background_color: Color::WHITE,
            gradient: GradientConfig::default(),
            dot_style: DotStyle::Square,
            corner_style: CornerStyle::Square,
            corner_dot_style: CornerStyle::Square,
            error_correction: ErrorCorrection::M,
            size: 300,
            frame: FrameTemplate::none(),
        }
    }
}

impl QrDesign {
    /// Size clamped into the supported range.
    pub fn pixel_size(&self) -> u32 {
        self.size.clamp(MIN_SIZE, MAX_SIZE)
    }
}
