// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! QR Studio command line.
//!
//! Renders saved projects to PNG, JPEG or SVG, prints encoded payloads and
//! lists the frame catalog.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use qrstudio::io::export::{ExportFormat, ExportOptions};
use qrstudio::io::serialization::{self, from_json_str};
use qrstudio::models::content::{encode, QrContent, QrType};
use qrstudio::models::design::{find_frame_template, frame_templates};
use qrstudio::{EditorConfig, EditorSession, NoticeLevel};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ASSET_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "qrstudio", version, about = "Design, compose and export styled QR codes")]
struct Cli {
    /// Editor configuration (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new project file
    New {
        /// Output project file (.yaml, .yml or .json)
        path: PathBuf,
        #[arg(long = "type", default_value = "url")]
        qr_type: QrType,
        /// Content as JSON, e.g. '{"url":"https://example.com"}'
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Render a project to an image
    Render {
        /// Project file (.yaml, .yml or .json)
        project: PathBuf,
        /// Output file; the extension picks the format unless --format is given
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Output scale relative to the canvas
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        /// Frame template id, overriding the project's design
        #[arg(long)]
        frame: Option<String>,
        /// Image placed over the centre of the symbol
        #[arg(long)]
        center_logo: Option<PathBuf>,
        /// Extra logo layers
        #[arg(long)]
        logo: Vec<PathBuf>,
        /// Ignore the saved layout and compose from content and design only
        #[arg(long)]
        fresh: bool,
    },
    /// Print the payload a project or content would encode
    Encode {
        #[arg(long = "type", default_value = "url")]
        qr_type: QrType,
        /// Content as JSON
        #[arg(long)]
        content: Option<String>,
        /// Read type and content from a project file instead
        #[arg(long, conflicts_with_all = ["qr_type", "content"])]
        project: Option<PathBuf>,
    },
    /// List the frame templates
    Frames,
    /// Print the scene document a project composes to
    Scene {
        project: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::New {
            path,
            qr_type,
            content,
            name,
        } => {
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("project")
                .to_string();
            let mut project = config.new_project(&id, "local", qr_type, name);
            if let Some(json) = content {
                project.content = parse_content(&json)?;
            }
            serialization::save_project(&project, &path)?;
            println!("Created {} ({})", path.display(), project.name);
        }
        Command::Render {
            project,
            output,
            format,
            scale,
            frame,
            center_logo,
            logo,
            fresh,
        } => {
            let format = match format.or_else(|| ExportFormat::from_path(&output)) {
                Some(format) => format,
                None => bail!("cannot tell the format of {}; pass --format", output.display()),
            };
            let mut session = open_session(&config, &project, frame.as_deref(), fresh)?;
            if let Some(path) = center_logo {
                session.load_center_logo(path);
            }
            for path in logo {
                session.load_logo(path);
            }
            if !session.finish_jobs(ASSET_TIMEOUT) {
                bail!("timed out loading images");
            }

            let options = ExportOptions {
                format,
                multiplier: scale,
                jpeg_quality: config.jpeg_quality,
            };
            let artifact = session.export(&options);
            report_notices(&mut session);
            artifact?.write_to(&output)?;
            println!("Wrote {}", output.display());
        }
        Command::Encode {
            qr_type,
            content,
            project,
        } => {
            let payload = match project {
                Some(path) => serialization::load_project(&path)?.payload(),
                None => {
                    let content = match content {
                        Some(json) => parse_content(&json)?,
                        None => QrContent::default(),
                    };
                    encode(qr_type, &content)
                }
            };
            println!("{payload}");
        }
        Command::Frames => {
            for template in frame_templates() {
                let label = template.label_text.as_deref().unwrap_or("-");
                println!("{:<16} {:<18} {}", template.id, template.name, label);
            }
        }
        Command::Scene { project, pretty } => {
            let session = open_session(&config, &project, None, false)?;
            let doc = serialization::to_document(session.canvas());
            let json = if pretty {
                serde_json::to_string_pretty(&doc)?
            } else {
                serde_json::to_string(&doc)?
            };
            println!("{json}");
        }
    }

    Ok(())
}

fn parse_content(json: &str) -> Result<QrContent> {
    from_json_str(json).context("content must be a JSON object such as '{\"url\":\"https://example.com\"}'")
}

/// Load a project and bring its canvas up to date with its design.
fn open_session(config: &EditorConfig, path: &Path, frame: Option<&str>, fresh: bool) -> Result<EditorSession> {
    let mut project = serialization::load_project(path)?;
    if let Some(id) = frame {
        project.design.frame = match find_frame_template(id) {
            Some(template) => template,
            None => bail!("unknown frame '{id}'; run `qrstudio frames` to list them"),
        };
    }
    if fresh {
        project.scene = None;
    }

    let mut session = EditorSession::open(config.clone(), project, config.load_font());
    session.regenerate_now()?;
    report_notices(&mut session);
    Ok(session)
}

fn report_notices(session: &mut EditorSession) {
    for notice in session.take_notices() {
        match notice.level {
            NoticeLevel::Info => log::info!("{}", notice.message),
            NoticeLevel::Error => eprintln!("warning: {}", notice.message),
        }
    }
}
