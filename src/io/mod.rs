// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O for image assets, exports, scene snapshots and project files.

pub mod export;
pub mod media;
pub mod serialization;
