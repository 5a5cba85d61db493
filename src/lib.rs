// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! QR Studio - styled QR code design and layered composition.
//!
//! The engine turns QR content and a visual design into a styled symbol,
//! composes it with frames, logos, text and shapes on a layered canvas,
//! and exports the result as PNG, JPEG or SVG. Scenes serialize to a JSON
//! document so a composition can be saved with its project and restored.

pub mod app;
pub mod canvas;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod qr;
pub mod util;

pub use app::{EditorSession, Notice, NoticeLevel};
pub use canvas::Canvas;
pub use config::EditorConfig;
pub use error::{Result, StudioError};
