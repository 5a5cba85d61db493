// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! QR module grid.

use crate::error::{Result, StudioError};
use crate::models::design::ErrorCorrection;
use serde::{Deserialize, Serialize};

/// Side length of a finder pattern in modules.
pub const FINDER_SIZE: usize = 7;

/// Square grid of dark/light modules. Serialized as one string of `1`/`0`
/// per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct ModuleMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Build the symbol for `data` at the given error correction level.
    pub fn encode(data: &str, level: ErrorCorrection) -> Result<Self> {
        let code = qrcode::QrCode::with_error_correction_level(data.as_bytes(), level.to_ec_level())
            .map_err(|e| StudioError::RenderFailure(format!("{e} ({} bytes at level {level:?})", data.len())))?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Self {
            width: code.width(),
            modules,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Out-of-range coordinates read as light.
    pub fn is_dark(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.width {
            return false;
        }
        self.modules[y as usize * self.width + x as usize]
    }

    /// Top-left module of each finder pattern.
    pub fn finder_origins(&self) -> [(usize, usize); 3] {
        let far = self.width - FINDER_SIZE;
        [(0, 0), (far, 0), (0, far)]
    }

    /// Is the module part of one of the three finder pattern areas.
    pub fn in_finder(&self, x: usize, y: usize) -> bool {
        self.finder_origins().iter().any(|&(fx, fy)| {
            x >= fx && x < fx + FINDER_SIZE && y >= fy && y < fy + FINDER_SIZE
        })
    }

    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }
}

impl From<ModuleMatrix> for Vec<String> {
    fn from(matrix: ModuleMatrix) -> Self {
        matrix
            .modules
            .chunks(matrix.width.max(1))
            .map(|row| row.iter().map(|&m| if m { '1' } else { '0' }).collect())
            .collect()
    }
}

impl TryFrom<Vec<String>> for ModuleMatrix {
    type Error = String;

    fn try_from(rows: Vec<String>) -> std::result::Result<Self, Self::Error> {
        let width = rows.len();
        if width < FINDER_SIZE {
            return Err(format!("module matrix too small: {width} rows"));
        }
        let mut modules = Vec::with_capacity(width * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(format!("module matrix row {i} has {} columns, expected {width}", row.len()));
            }
            for c in row.chars() {
                match c {
                    '1' => modules.push(true),
                    '0' => modules.push(false),
                    other => return Err(format!("invalid module value '{other}' in row {i}")),
                }
            }
        }
        Ok(Self { width, modules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_one_width() {
        let matrix = ModuleMatrix::encode("HELLO", ErrorCorrection::L).unwrap();
        assert_eq!(matrix.width(), 21);
        // Finder pattern corners are always dark.
        assert!(matrix.is_dark(0, 0));
        assert!(matrix.is_dark(20, 0));
        assert!(matrix.is_dark(0, 20));
        assert!(!matrix.is_dark(-1, 0));
        assert!(!matrix.is_dark(21, 0));
    }

    #[test]
    fn test_higher_level_needs_more_modules() {
        let text = "https://example.com/a/fairly/long/path?with=query&and=more";
        let low = ModuleMatrix::encode(text, ErrorCorrection::L).unwrap();
        let high = ModuleMatrix::encode(text, ErrorCorrection::H).unwrap();
        assert!(high.width() > low.width());
    }

    #[test]
    fn test_oversized_payload_fails() {
        let text = "x".repeat(4000);
        let err = ModuleMatrix::encode(&text, ErrorCorrection::H).unwrap_err();
        assert!(matches!(err, StudioError::RenderFailure(_)));
    }

    #[test]
    fn test_finder_membership() {
        let matrix = ModuleMatrix::encode("HELLO", ErrorCorrection::L).unwrap();
        assert!(matrix.in_finder(6, 6));
        assert!(matrix.in_finder(14, 0));
        assert!(!matrix.in_finder(7, 7));
        assert!(!matrix.in_finder(14, 14));
    }

    #[test]
    fn test_rows_roundtrip() {
        let matrix = ModuleMatrix::encode("rows", ErrorCorrection::M).unwrap();
        let json = serde_json::to_string(&matrix).unwrap();
        let back: ModuleMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, matrix);
        assert!(serde_json::from_str::<ModuleMatrix>(r#"["10","01"]"#).is_err());
    }
}
