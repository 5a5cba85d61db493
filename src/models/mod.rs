// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for QR content, designs, scenes and projects.

pub mod content;
pub mod design;
pub mod layer;
pub mod project;
pub mod scene;
