// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Engine error taxonomy.
//!
//! Missing content fields are never errors (the encoder substitutes fixed
//! placeholders). Everything listed here is surfaced to the user and leaves
//! the layer model untouched.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Could not render QR code: {0}. Try a lower error correction level, a larger size or shorter content")]
    RenderFailure(String),

    #[error("Could not load image: {0}. Use a PNG, JPEG, GIF, BMP or WebP file")]
    AssetLoadFailure(String),

    #[error("Export failed: {0}")]
    ExportFailure(String),

    #[error("Could not read saved data: {0}")]
    SerializationFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Short category label used in user notices.
    pub fn kind(&self) -> &'static str {
        match self {
            StudioError::RenderFailure(_) => "render",
            StudioError::AssetLoadFailure(_) => "asset",
            StudioError::ExportFailure(_) => "export",
            StudioError::SerializationFailure(_) => "serialization",
            StudioError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_does_not_claim_reset() {
        let err = StudioError::SerializationFailure("expected value at line 1 column 1".into());
        let message = err.to_string();
        assert!(message.contains("expected value"));
        assert!(!message.contains("reset"));
        assert_eq!(err.kind(), "serialization");
    }
}
