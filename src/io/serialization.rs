// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene and project serialization.
//!
//! This module snapshots the canvas into a [`SceneDocument`] and restores it,
//! converts designs and content to and from their JSON text form, reads and
//! writes project files in YAML and JSON, and provides the project stores
//! used by the editor.

use crate::canvas::Canvas;
use crate::error::{Result as StudioResult, StudioError};
use crate::models::project::{Project, ProjectUpdate};
use crate::models::design::{MAX_SIZE, MIN_SIZE};
use crate::models::scene::{SceneDocument, SceneObject, Shape, SCENE_VERSION};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Snapshot every layer of the canvas.
pub fn to_document(canvas: &Canvas) -> SceneDocument {
    SceneDocument {
        version: SCENE_VERSION,
        width: canvas.width(),
        height: canvas.height(),
        background: canvas.background(),
        objects: canvas.objects(),
    }
}

/// Replace the canvas contents with `doc`.
///
/// The document is checked in full before anything is touched; on error the
/// canvas is unchanged. Restored layers are generic: QR, frame and centre
/// logo tracking must be re-established by regenerating those layers.
pub fn from_document(canvas: &mut Canvas, doc: SceneDocument) -> StudioResult<()> {
    validate(&doc)?;
    canvas.restore(doc.width, doc.height, doc.background, doc.objects);
    Ok(())
}

/// Longest canvas side a scene may declare.
pub const MAX_SCENE_SIDE: u32 = 8192;
/// Largest per-object scale factor.
pub const MAX_OBJECT_SCALE: f64 = 1000.0;
pub const MAX_FONT_SIZE: f64 = 1000.0;
/// Objects may reach this many canvas lengths, so partly off-canvas
/// layouts still restore.
const MAX_EXTENT_FACTOR: f64 = 4.0;

fn validate(doc: &SceneDocument) -> StudioResult<()> {
    if doc.version > SCENE_VERSION {
        return Err(StudioError::SerializationFailure(format!(
            "scene version {} is newer than supported version {SCENE_VERSION}",
            doc.version
        )));
    }
    if doc.width == 0 || doc.height == 0 {
        return Err(StudioError::SerializationFailure(format!(
            "scene size {}x{} has no area",
            doc.width, doc.height
        )));
    }
    if doc.width > MAX_SCENE_SIDE || doc.height > MAX_SCENE_SIDE {
        return Err(StudioError::SerializationFailure(format!(
            "scene size {}x{} exceeds {MAX_SCENE_SIDE}px",
            doc.width, doc.height
        )));
    }
    let extent = doc.width.max(doc.height) as f64 * MAX_EXTENT_FACTOR;
    for (i, obj) in doc.objects.iter().enumerate() {
        check_object(obj, extent).map_err(|e| StudioError::SerializationFailure(format!("object {}: {e}", i + 1)))?;
    }
    Ok(())
}

/// `extent` is the largest width or height allowed, in the units of the
/// space the object sits in.
fn check_object(obj: &SceneObject, extent: f64) -> std::result::Result<(), String> {
    let p = &obj.props;
    for (name, value) in [("left", p.left), ("top", p.top)] {
        if !value.is_finite() {
            return Err(format!("{name} is not a finite number"));
        }
        if value.abs() > extent {
            return Err(format!("{name} {value} is further than {extent:.0} from the origin"));
        }
    }
    for (name, value) in [("scaleX", p.scale_x), ("scaleY", p.scale_y)] {
        if !(0.0..=MAX_OBJECT_SCALE).contains(&value) {
            return Err(format!("{name} {value} is outside 0 to {MAX_OBJECT_SCALE}"));
        }
    }
    let sizes: Vec<f64> = match &obj.shape {
        Shape::Text { font_size, .. } => {
            if *font_size > MAX_FONT_SIZE {
                return Err(format!("font size {font_size} exceeds {MAX_FONT_SIZE}"));
            }
            vec![*font_size]
        }
        Shape::Rect {
            width,
            height,
            stroke_width,
            radius,
            ..
        } => vec![*width, *height, *stroke_width, *radius],
        Shape::Circle { radius, .. } => vec![*radius],
        Shape::Qr { graphic } => {
            if !(MIN_SIZE..=MAX_SIZE).contains(&graphic.size) {
                return Err(format!("QR size {}px is outside {MIN_SIZE}-{MAX_SIZE}px", graphic.size));
            }
            if (graphic.size as usize) < graphic.matrix.width() {
                return Err(format!(
                    "a {} module QR does not fit in {}px",
                    graphic.matrix.width(),
                    graphic.size
                ));
            }
            Vec::new()
        }
        Shape::Group { children } => {
            // Children live in the group's scaled space.
            let inner = extent / p.scale_x.min(p.scale_y).max(f64::MIN_POSITIVE);
            children.iter().try_for_each(|child| check_object(child, inner))?;
            Vec::new()
        }
        Shape::Image { .. } => Vec::new(),
    };
    if sizes.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(format!("{} has a negative or non-finite size", obj.shape.type_name()));
    }
    let (mut w, h) = obj.scaled_size();
    if matches!(obj.shape, Shape::Text { .. }) {
        // Width is only an estimate for text; long runs may overhang.
        w = 0.0;
    }
    if w > extent || h > extent {
        return Err(format!("{} of {w:.0}x{h:.0} is larger than {extent:.0}", obj.shape.type_name()));
    }
    Ok(())
}

/// Encode any value as compact JSON text.
pub fn to_json_string<T: Serialize>(value: &T) -> StudioResult<String> {
    serde_json::to_string(value).map_err(|e| StudioError::SerializationFailure(e.to_string()))
}

/// Decode a value from JSON text.
pub fn from_json_str<T: DeserializeOwned>(text: &str) -> StudioResult<T> {
    serde_json::from_str(text).map_err(|e| StudioError::SerializationFailure(e.to_string()))
}

/// Export project data to YAML format.
pub fn export_yaml(project: &Project, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(project)?;
    std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Export project data to JSON format.
pub fn export_json(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Import project data from YAML format.
pub fn import_yaml(path: &Path) -> Result<Project> {
    let yaml = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let project = serde_yaml::from_str(&yaml).with_context(|| format!("parsing {}", path.display()))?;
    Ok(project)
}

/// Import project data from JSON format.
pub fn import_json(path: &Path) -> Result<Project> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let project = serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    Ok(project)
}

/// Write a project, choosing the format from the file extension.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(project, path),
        Some("json") => export_json(project, path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Read a project, choosing the format from the file extension.
pub fn load_project(path: &Path) -> Result<Project> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Where projects are persisted.
pub trait ProjectStore {
    /// Add a new project. Fails if the id is taken.
    fn create(&mut self, project: Project) -> Result<()>;

    /// Apply a partial update and return the stored result.
    fn save(&mut self, id: &str, update: ProjectUpdate) -> Result<Project>;

    fn load(&self, id: &str) -> Result<Project>;
}

/// Projects held in memory, for tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: HashMap<String, Project>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn create(&mut self, project: Project) -> Result<()> {
        if self.projects.contains_key(&project.id) {
            bail!("project {} already exists", project.id);
        }
        self.projects.insert(project.id.clone(), project);
        Ok(())
    }

    fn save(&mut self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let project = self
            .projects
            .get_mut(id)
            .with_context(|| format!("project {id} not found"))?;
        project.apply(update);
        Ok(project.clone())
    }

    fn load(&self, id: &str) -> Result<Project> {
        self.projects
            .get(id)
            .cloned()
            .with_context(|| format!("project {id} not found"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Yaml,
    Json,
}

impl StoreFormat {
    fn extension(&self) -> &'static str {
        match self {
            StoreFormat::Yaml => "yaml",
            StoreFormat::Json => "json",
        }
    }
}

/// One file per project in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    format: StoreFormat,
}

impl DirectoryStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, format: StoreFormat) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).with_context(|| format!("creating {}", root.display()))?;
        Ok(Self { root, format })
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("invalid project id '{id}': use letters, digits, '-' or '_'");
        }
        Ok(self.root.join(format!("{id}.{}", self.format.extension())))
    }
}

impl ProjectStore for DirectoryStore {
    fn create(&mut self, project: Project) -> Result<()> {
        let path = self.path_for(&project.id)?;
        if path.exists() {
            bail!("project {} already exists", project.id);
        }
        save_project(&project, &path)?;
        log::info!("Created project {} at {}", project.id, path.display());
        Ok(())
    }

    fn save(&mut self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let path = self.path_for(id)?;
        let mut project = load_project(&path).with_context(|| format!("project {id} not found"))?;
        project.apply(update);
        save_project(&project, &path)?;
        log::info!("Saved project {id}");
        Ok(project)
    }

    fn load(&self, id: &str) -> Result<Project> {
        let path = self.path_for(id)?;
        load_project(&path).with_context(|| format!("project {id} not found"))
    }
}
