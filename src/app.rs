// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor session state.
//!
//! A session owns one project and the canvas it is being composed on. Only
//! the owning thread mutates the canvas. QR rendering and image decoding run
//! on background threads and report back over a channel; their results are
//! applied when the owner calls [`EditorSession::update`].
//!
//! Content and design edits are debounced. Each regeneration that starts
//! takes a new generation number, and a finished render is applied only if
//! it still carries the latest one, so superseded results are dropped
//! instead of landing out of order.

use crate::canvas::{Canvas, QrArtwork, DEFAULT_QR_SIZE};
use crate::config::EditorConfig;
use crate::error::{Result, StudioError};
use crate::io::export::{self, Artifact, ExportOptions};
use crate::io::media;
use crate::io::serialization::{self, ProjectStore};
use crate::models::content::QrContent;
use crate::models::design::{FrameTemplate, QrDesign};
use crate::models::layer::LayerKind;
use crate::models::project::{Project, ProjectUpdate};
use crate::models::scene::{SceneDocument, Shape};
use crate::qr::{self, QrGraphic};
use image::RgbaImage;
use rusttype::Font;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Where a decoded upload goes.
enum AssetTarget {
    Logo(String),
    CenterLogo,
}

/// Result of a background job.
enum JobResult {
    Render {
        generation: u64,
        result: Result<QrGraphic>,
    },
    Asset {
        target: AssetTarget,
        result: Result<RgbaImage>,
    },
}

/// One project open for editing.
pub struct EditorSession {
    config: EditorConfig,
    project: Project,
    canvas: Canvas,

    /// When the pending regeneration may start.
    deadline: Option<Instant>,

    /// Generation of the most recently started regeneration
    generation: u64,

    /// Background jobs not yet reported back
    in_flight: usize,

    sender: Sender<JobResult>,
    receiver: Receiver<JobResult>,

    /// Template and QR size the current frame was built for.
    framed: Option<(FrameTemplate, f64)>,

    notices: Vec<Notice>,
}

impl EditorSession {
    /// Open `project`, restoring its saved scene when it has one.
    ///
    /// A first regeneration is scheduled immediately so the QR layer always
    /// reflects the project's content and design.
    pub fn open(config: EditorConfig, project: Project, font: Option<Arc<Font<'static>>>) -> Self {
        let canvas = Canvas::new(config.canvas_width, config.canvas_height, config.background).with_font(font);
        let (sender, receiver) = channel();
        let scene = project.scene.clone();
        let mut session = Self {
            config,
            project,
            canvas,
            deadline: Some(Instant::now()),
            generation: 0,
            in_flight: 0,
            sender,
            receiver,
            framed: None,
            notices: Vec::new(),
        };
        if let Some(doc) = scene {
            session.restore(doc);
        }
        log::info!("Opened project {} ({})", session.project.id, session.project.name);
        session
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Direct access for layer edits (text, shapes, ordering, visibility).
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.project.name = name.into();
    }

    pub fn set_content(&mut self, content: QrContent, now: Instant) {
        self.project.content = content;
        self.request_regeneration(now);
    }

    pub fn set_design(&mut self, design: QrDesign, now: Instant) {
        self.project.design = design;
        self.request_regeneration(now);
    }

    /// Schedule a regeneration one debounce interval after `now`, replacing
    /// any pending one.
    pub fn request_regeneration(&mut self, now: Instant) {
        self.deadline = Some(now + self.config.debounce());
    }

    /// A regeneration is waiting for its debounce interval.
    pub fn has_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Background jobs are still running.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Start a due regeneration and apply every finished job.
    pub fn update(&mut self, now: Instant) {
        if self.deadline.is_some_and(|d| d <= now) {
            self.deadline = None;
            self.start_render();
        }
        while let Ok(result) = self.receiver.try_recv() {
            self.handle(result);
        }
    }

    /// Block until all background jobs report, or `timeout` passes.
    /// Returns whether everything finished.
    pub fn finish_jobs(&mut self, timeout: Duration) -> bool {
        let end = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = end.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(result) => self.handle(result),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        true
    }

    /// Regenerate on the calling thread, superseding anything in flight.
    pub fn regenerate_now(&mut self) -> Result<()> {
        self.deadline = None;
        self.generation += 1;
        let result = qr::render(&self.project.payload(), &self.project.design);
        self.apply_render(self.generation, result).map(|_| ())
    }

    /// Decode an image file in the background and add it as a logo.
    pub fn load_logo(&mut self, path: PathBuf) {
        let name = media::layer_name_for(&path);
        self.spawn_asset(path, AssetTarget::Logo(name));
    }

    /// Decode an image file in the background and make it the centre logo.
    pub fn load_center_logo(&mut self, path: PathBuf) {
        self.spawn_asset(path, AssetTarget::CenterLogo);
    }

    /// Export the composition, queueing a notice on failure.
    pub fn export(&mut self, options: &ExportOptions) -> Result<Artifact> {
        match export::export(&mut self.canvas, options) {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Replace the scene with a saved snapshot.
    ///
    /// A snapshot that cannot be restored resets the canvas to empty. Either
    /// way a regeneration is scheduled so the QR layer comes back.
    pub fn restore(&mut self, doc: SceneDocument) {
        match serialization::from_document(&mut self.canvas, doc) {
            Ok(()) => self.adopt_roles(),
            Err(e) => {
                log::error!("{} failure: {e}", e.kind());
                let detail = match &e {
                    StudioError::SerializationFailure(detail) => detail.clone(),
                    other => other.to_string(),
                };
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not restore saved scene: {detail}. The editor was reset to an empty canvas"),
                );
                self.canvas.clear();
                self.framed = None;
            }
        }
        self.deadline = Some(Instant::now());
    }

    /// Persist the project with a fresh scene snapshot and thumbnail.
    ///
    /// A thumbnail that fails to render is reported and the previous one
    /// kept; the rest of the project is still saved.
    pub fn save(&mut self, store: &mut dyn ProjectStore) -> anyhow::Result<()> {
        let thumbnail = match export::thumbnail(&mut self.canvas, self.config.thumbnail_scale) {
            Ok(url) => Some(url),
            Err(e) => {
                self.report(&e);
                None
            }
        };
        let update = ProjectUpdate {
            name: Some(self.project.name.clone()),
            content: Some(self.project.content.clone()),
            design: Some(self.project.design.clone()),
            scene: Some(serialization::to_document(&self.canvas)),
            thumbnail,
        };
        match store.save(&self.project.id, update) {
            Ok(saved) => {
                self.project = saved;
                self.notify(NoticeLevel::Info, format!("Saved {}", self.project.name));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save project {}: {e:#}", self.project.id);
                self.notices.push(Notice {
                    level: NoticeLevel::Error,
                    message: format!("Could not save: {e}"),
                });
                Err(e)
            }
        }
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn start_render(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let payload = self.project.payload();
        let design = self.project.design.clone();
        let sender = self.sender.clone();
        self.in_flight += 1;
        log::debug!("Starting QR regeneration {generation}");

        std::thread::spawn(move || {
            let result = qr::render(&payload, &design);
            let _ = sender.send(JobResult::Render { generation, result });
        });
    }

    fn spawn_asset(&mut self, path: PathBuf, target: AssetTarget) {
        let sender = self.sender.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let result = media::load_image(&path);
            let _ = sender.send(JobResult::Asset { target, result });
        });
    }

    fn handle(&mut self, result: JobResult) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let outcome = match result {
            JobResult::Render { generation, result } => self.apply_render(generation, result).map(|_| ()),
            JobResult::Asset { target, result } => result.and_then(|image| match target {
                AssetTarget::Logo(name) => self.canvas.add_logo(image, Some(&name)).map(|_| ()),
                AssetTarget::CenterLogo => self.canvas.set_center_logo(image).map(|_| ()),
            }),
        };
        if let Err(e) = outcome {
            self.report(&e);
        }
    }

    /// Apply a finished render if it is still the latest. Returns whether
    /// it was applied.
    fn apply_render(&mut self, generation: u64, result: Result<QrGraphic>) -> Result<bool> {
        if generation != self.generation {
            log::debug!("Dropped stale QR render {generation} (latest is {})", self.generation);
            return Ok(false);
        }
        let graphic = result?;
        self.canvas.upsert_qr(QrArtwork::Symbol(graphic))?;
        self.refresh_frame();
        Ok(true)
    }

    /// Rebuild the frame when the template or QR size changed, or when the
    /// frame layer was deleted.
    fn refresh_frame(&mut self) {
        let template = &self.project.design.frame;
        let size = self.canvas.qr_display_size().unwrap_or(DEFAULT_QR_SIZE);
        let missing = self.canvas.frame_layer().is_none() && !template.is_none();
        let current = self
            .framed
            .as_ref()
            .is_some_and(|(t, s)| t == template && (s - size).abs() < 1e-6);
        if current && !missing {
            return;
        }
        self.canvas.apply_frame(template, size);
        self.framed = Some((template.clone(), size));
    }

    /// Give restored QR and frame layers their roles back so regeneration
    /// updates them in place.
    fn adopt_roles(&mut self) {
        let qr = self
            .canvas
            .layers()
            .iter()
            .find(|l| matches!(l.object.shape, Shape::Qr { .. }))
            .map(|l| l.id);
        if let Some(id) = qr {
            self.canvas.adopt(id, LayerKind::Qr);
        }

        let frame = self
            .canvas
            .layers()
            .first()
            .filter(|l| !l.object.props.selectable && matches!(l.object.shape, Shape::Group { .. }))
            .map(|l| l.id);
        self.framed = None;
        if let Some(id) = frame {
            if self.canvas.adopt(id, LayerKind::Frame) {
                let size = self.canvas.qr_display_size().unwrap_or(DEFAULT_QR_SIZE);
                self.framed = Some((self.project.design.frame.clone(), size));
            }
        }
    }

    fn report(&mut self, error: &StudioError) {
        log::error!("{} failure: {error}", error.kind());
        self.notify(NoticeLevel::Error, error.to_string());
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        if level == NoticeLevel::Info {
            log::info!("{message}");
        }
        self.notices.push(Notice { level, message });
    }
}
