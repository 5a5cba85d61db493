// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small helpers for writing SVG markup.

use crate::models::design::Color;

/// Format a coordinate with at most three decimals and no trailing zeros.
pub fn num(value: f64) -> String {
    let value = if value.abs() < 0.0005 { 0.0 } else { value };
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// `fill="#rrggbb"` plus `fill-opacity` when the color is translucent.
/// `attr` is the paint attribute name (`fill` or `stroke`).
pub fn paint(attr: &str, color: &Color) -> String {
    if color.a == 0 {
        return format!("{attr}=\"none\"");
    }
    let hex = format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b);
    if color.a == 255 {
        format!("{attr}=\"{hex}\"")
    } else {
        format!(
            "{attr}=\"{hex}\" {attr}-opacity=\"{}\"",
            num(color.a as f64 / 255.0)
        )
    }
}

/// Escape text for use in element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
