// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Decorative frames drawn around the QR symbol.
//!
//! A frame is a single group: a white backing square, a stroked border and,
//! for label and banner templates, a filled tag carrying the label text.
//! Child coordinates are relative to the frame square's top-left corner.

use crate::models::design::{Color, FrameTemplate, FrameType, LabelPosition};
use crate::models::scene::{ObjectProps, SceneObject, Shape};

/// Gap between the QR symbol and the frame edge.
pub const FRAME_PADDING: f64 = 20.0;
pub const BORDER_WIDTH: f64 = 10.0;

const LABEL_WIDTH: f64 = 120.0;
const LABEL_HEIGHT: f64 = 40.0;
const LABEL_FONT_SIZE: f64 = 16.0;
const BANNER_HEIGHT: f64 = 50.0;
const BANNER_FONT_SIZE: f64 = 18.0;
const FRAME_FONT: &str = "Arial";

pub const DEFAULT_LABEL: &str = "SCAN ME";
pub const DEFAULT_BANNER: &str = "SCAN TO VISIT";

/// Build the frame group for `template` around a QR symbol of `qr_size`
/// units, centred on a `canvas_width`×`canvas_height` canvas. Returns `None`
/// for the `none` template.
pub fn build_frame(template: &FrameTemplate, qr_size: f64, canvas_width: f64, canvas_height: f64) -> Option<SceneObject> {
    if template.is_none() {
        return None;
    }

    let frame_size = qr_size + FRAME_PADDING * 2.0;
    let left = (canvas_width - frame_size) / 2.0;
    let top = (canvas_height - frame_size) / 2.0;
    let color = template.color.unwrap_or(Color::BLACK);

    let backing_radius = match template.frame_type {
        FrameType::Simple | FrameType::Rounded => 20.0,
        _ => 0.0,
    };
    let mut children = vec![rect(0.0, 0.0, frame_size, frame_size, Color::WHITE, backing_radius)];

    match template.frame_type {
        FrameType::None => {}
        FrameType::Simple | FrameType::Rounded => {
            let radius = if template.frame_type == FrameType::Rounded { 20.0 } else { 0.0 };
            children.push(border(frame_size, color, radius));
        }
        FrameType::Label => {
            children.push(border(frame_size, color, 20.0));

            // Labels sit on the top edge unless asked for the bottom.
            let label_top = match template.label_position {
                Some(LabelPosition::Bottom) => frame_size - LABEL_HEIGHT / 2.0,
                _ => -LABEL_HEIGHT / 2.0,
            };
            children.push(rect(
                (frame_size - LABEL_WIDTH) / 2.0,
                label_top,
                LABEL_WIDTH,
                LABEL_HEIGHT,
                color,
                20.0,
            ));
            children.push(label(
                template.label_text.as_deref().unwrap_or(DEFAULT_LABEL),
                frame_size / 2.0,
                label_top + LABEL_HEIGHT / 2.0,
                LABEL_FONT_SIZE,
            ));
        }
        FrameType::Banner => {
            children.push(border(frame_size, color, 10.0));

            let banner_top = frame_size - 20.0;
            children.push(rect(-5.0, banner_top, frame_size + 10.0, BANNER_HEIGHT, color, 10.0));
            children.push(label(
                template.label_text.as_deref().unwrap_or(DEFAULT_BANNER),
                frame_size / 2.0,
                banner_top + BANNER_HEIGHT / 2.0,
                BANNER_FONT_SIZE,
            ));
        }
    }

    let mut props = ObjectProps::at(left, top);
    props.selectable = false;
    Some(SceneObject::new(props, Shape::Group { children }))
}

fn rect(left: f64, top: f64, width: f64, height: f64, fill: Color, radius: f64) -> SceneObject {
    SceneObject::new(
        ObjectProps::at(left, top),
        Shape::Rect {
            width,
            height,
            fill,
            stroke: None,
            stroke_width: 0.0,
            radius,
        },
    )
}

fn border(size: f64, color: Color, radius: f64) -> SceneObject {
    SceneObject::new(
        ObjectProps::at(0.0, 0.0),
        Shape::Rect {
            width: size,
            height: size,
            fill: Color::TRANSPARENT,
            stroke: Some(color),
            stroke_width: BORDER_WIDTH,
            radius,
        },
    )
}

fn label(text: &str, cx: f64, cy: f64, font_size: f64) -> SceneObject {
    SceneObject::new(
        ObjectProps::centered_at(cx, cy),
        Shape::Text {
            text: text.to_string(),
            font_size,
            fill: Color::WHITE,
            font_family: FRAME_FONT.to_string(),
            bold: true,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::design::{find_frame_template, frame_templates};

    fn children(obj: &SceneObject) -> &[SceneObject] {
        match &obj.shape {
            Shape::Group { children } => children,
            other => panic!("expected group, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_none_builds_nothing() {
        assert!(build_frame(&FrameTemplate::none(), 200.0, 400.0, 400.0).is_none());
    }

    #[test]
    fn test_frame_centred_with_padding() {
        let simple = find_frame_template("simple").unwrap();
        let frame = build_frame(&simple, 200.0, 400.0, 400.0).unwrap();
        assert_eq!(frame.props.left, 80.0);
        assert_eq!(frame.props.top, 80.0);
        assert!(!frame.props.selectable);

        let parts = children(&frame);
        assert_eq!(parts.len(), 2);
        match &parts[1].shape {
            Shape::Rect {
                width,
                stroke,
                stroke_width,
                radius,
                ..
            } => {
                assert_eq!(*width, 240.0);
                assert_eq!(*stroke, Some(Color::rgb(0x1a, 0x36, 0x5d)));
                assert_eq!(*stroke_width, BORDER_WIDTH);
                assert_eq!(*radius, 0.0);
            }
            other => panic!("expected border rect, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_label_position() {
        let top = build_frame(&find_frame_template("scan-me-top").unwrap(), 200.0, 400.0, 400.0).unwrap();
        let bottom = build_frame(&find_frame_template("scan-me-bottom").unwrap(), 200.0, 400.0, 400.0).unwrap();
        assert_eq!(children(&top)[2].props.top, -20.0);
        assert_eq!(children(&bottom)[2].props.top, 220.0);
        assert_eq!(children(&bottom)[2].props.left, 60.0);
        match &children(&top)[3].shape {
            Shape::Text { text, bold, .. } => {
                assert_eq!(text, "SCAN ME");
                assert!(*bold);
            }
            other => panic!("expected text, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_banner_geometry() {
        let banner = build_frame(&find_frame_template("banner").unwrap(), 200.0, 400.0, 400.0).unwrap();
        let parts = children(&banner);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[2].props.left, -5.0);
        assert_eq!(parts[2].props.top, 220.0);
        assert_eq!(parts[2].scaled_size(), (250.0, BANNER_HEIGHT));
        assert_eq!(parts[3].props.top, 245.0);
    }

    #[test]
    fn test_every_catalog_entry_builds() {
        for template in frame_templates() {
            let built = build_frame(&template, 160.0, 400.0, 400.0);
            assert_eq!(built.is_none(), template.is_none(), "{}", template.id);
        }
    }
}
