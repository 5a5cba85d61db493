// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image asset loading and encoding.
//!
//! This module decodes uploaded images from files, raw bytes or data URLs
//! and encodes bitmaps back to PNG, including the data URL form used to
//! embed images in scene documents and SVG output.

use crate::error::{Result, StudioError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Load and decode an image file.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| StudioError::AssetLoadFailure(format!("could not read {}: {e}", path.display())))?;
    let image = decode_image(&bytes)
        .map_err(|e| StudioError::AssetLoadFailure(format!("{}: {e}", path.display())))?;
    log::info!("Loaded image: {} ({}x{})", path.display(), image.width(), image.height());
    Ok(image)
}

/// Decode an image from its encoded bytes, guessing the format.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| StudioError::AssetLoadFailure(format!("not a supported image ({e}); try PNG or JPEG")))?;
    let image = image.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(StudioError::AssetLoadFailure("image has no pixels".into()));
    }
    Ok(image)
}

/// Decode a `data:<mime>;base64,<payload>` URL holding an image.
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let bytes = data_url_bytes(url)?;
    decode_image(&bytes)
}

/// Split a base64 data URL into its payload bytes.
pub fn data_url_bytes(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| StudioError::AssetLoadFailure("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StudioError::AssetLoadFailure("data URL has no payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(StudioError::AssetLoadFailure(format!(
            "data URL '{header}' is not base64 encoded"
        )));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| StudioError::AssetLoadFailure(format!("bad base64 in data URL: {e}")))
}

/// Wrap encoded bytes in a base64 data URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| StudioError::ExportFailure(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

pub fn png_data_url(image: &RgbaImage) -> Result<String> {
    Ok(to_data_url("image/png", &encode_png(image)?))
}

/// Display name for an uploaded file: everything before the first dot,
/// or `Logo` when that is empty.
pub fn layer_name_for(path: &Path) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "Logo".to_string(),
    }
}

/// Serde adapter storing a bitmap as a PNG data URL.
pub mod data_url {
    use image::RgbaImage;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(image: &Arc<RgbaImage>, serializer: S) -> Result<S::Ok, S::Error> {
        let url = super::png_data_url(image).map_err(S::Error::custom)?;
        serializer.serialize_str(&url)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<RgbaImage>, D::Error> {
        let url = String::deserialize(deserializer)?;
        super::decode_data_url(&url).map(Arc::new).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 80, y as u8 * 100, 7, 255 - x as u8]))
    }

    #[test]
    fn test_png_data_url_roundtrip() {
        let url = png_data_url(&sample()).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), sample());
    }

    #[test]
    fn test_bad_inputs_are_asset_failures() {
        for bad in ["image/png;base64,AAAA", "data:image/png,AAAA", "data:image/png;base64,@@@", "data:text/plain;base64,aGVsbG8="] {
            let err = decode_data_url(bad).unwrap_err();
            assert!(matches!(err, StudioError::AssetLoadFailure(_)), "{bad}");
        }
        assert!(matches!(decode_image(b"not an image"), Err(StudioError::AssetLoadFailure(_))));
    }

    #[test]
    fn test_load_image_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand.logo.png");
        std::fs::write(&path, encode_png(&sample()).unwrap()).unwrap();
        assert_eq!(load_image(&path).unwrap(), sample());
        assert_eq!(layer_name_for(&path), "brand");
        assert_eq!(layer_name_for(Path::new(".hidden")), "Logo");

        let missing = dir.path().join("missing.png");
        assert!(matches!(load_image(&missing), Err(StudioError::AssetLoadFailure(_))));
    }
}
