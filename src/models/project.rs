// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Persisted project records.
//!
//! A project pairs the canonical content and design with two derived
//! artifacts, the scene snapshot and the thumbnail. The derived artifacts are
//! caches: a project always renders from `content` and `design`.

use super::content::{QrContent, QrType};
use super::design::QrDesign;
use super::scene::SceneDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved QR code project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(alias = "user_id")]
    pub owner: String,
    pub name: String,
    pub qr_type: QrType,
    #[serde(default, deserialize_with = "lenient::required")]
    pub content: QrContent,
    #[serde(default, deserialize_with = "lenient::required")]
    pub design: QrDesign,
    #[serde(
        default,
        alias = "canvas_data",
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub scene: Option<SceneDocument>,
    /// PNG data URL.
    #[serde(default, alias = "thumbnail_url", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create an empty project with the default design.
    pub fn new(id: impl Into<String>, owner: impl Into<String>, qr_type: QrType, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner: owner.into(),
            name: name.unwrap_or_else(|| default_name(qr_type)),
            qr_type,
            content: QrContent::default(),
            design: QrDesign::default(),
            scene: None,
            thumbnail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Payload the QR symbol should encode.
    pub fn payload(&self) -> String {
        super::content::encode(self.qr_type, &self.content)
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, update: ProjectUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(design) = update.design {
            self.design = design;
        }
        if let Some(scene) = update.scene {
            self.scene = Some(scene);
        }
        if let Some(thumbnail) = update.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        self.updated_at = Utc::now();
    }
}

/// Name given to a project created without one.
pub fn default_name(qr_type: QrType) -> String {
    format!("New {} QR", qr_type.as_str().to_uppercase())
}

/// Fields a save may change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<QrContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<QrDesign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Fields that may be stored either as structured values or as JSON text.
mod lenient {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn from_value<T: DeserializeOwned, E: Error>(value: Value) -> Result<T, E> {
        match value {
            Value::String(text) => serde_json::from_str(&text).map_err(E::custom),
            other => serde_json::from_value(other).map_err(E::custom),
        }
    }

    pub fn required<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        from_value(Value::deserialize(deserializer)?)
    }

    pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => from_value(value).map(Some),
        }
    }
}
