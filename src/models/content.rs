// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! QR content types and the payload encoder.
//!
//! `encode` is total: any missing or empty field is replaced by a fixed
//! placeholder so the editor always has something scannable to preview.
//! Field values are inserted verbatim; delimiters such as `;` or newlines
//! are not escaped.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_URL: &str = "https://example.com";
pub const DEFAULT_TEXT: &str = "Hello World";
pub const DEFAULT_WIFI: &str = "WIFI:T:WPA;S:Network;P:password;;";
pub const DEFAULT_VCARD: &str = "BEGIN:VCARD\nVERSION:3.0\nFN:John Doe\nEND:VCARD";

/// Kind of payload a project encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    #[default]
    Url,
    Text,
    Wifi,
    Vcard,
}

impl QrType {
    pub const ALL: [QrType; 4] = [QrType::Url, QrType::Text, QrType::Wifi, QrType::Vcard];

    pub fn as_str(&self) -> &'static str {
        match self {
            QrType::Url => "url",
            QrType::Text => "text",
            QrType::Wifi => "wifi",
            QrType::Vcard => "vcard",
        }
    }
}

impl fmt::Display for QrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QrType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "url" => Ok(QrType::Url),
            "text" => Ok(QrType::Text),
            "wifi" => Ok(QrType::Wifi),
            "vcard" => Ok(QrType::Vcard),
            other => Err(format!("unknown QR type: {other}")),
        }
    }
}

/// WiFi authentication scheme as written into the `T:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiEncryption {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WifiContent {
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub encryption: WifiEncryption,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VCardContent {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Editable content of a project. Only the field matching the project's
/// [`QrType`] is read by the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QrContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi: Option<WifiContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcard: Option<VCardContent>,
}

impl QrContent {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn wifi(wifi: WifiContent) -> Self {
        Self {
            wifi: Some(wifi),
            ..Default::default()
        }
    }

    pub fn vcard(vcard: VCardContent) -> Self {
        Self {
            vcard: Some(vcard),
            ..Default::default()
        }
    }
}

/// Build the exact string a QR symbol must carry for `content` read as `qr_type`.
pub fn encode(qr_type: QrType, content: &QrContent) -> String {
    match qr_type {
        QrType::Url => non_empty(&content.url).unwrap_or(DEFAULT_URL).to_string(),
        QrType::Text => non_empty(&content.text).unwrap_or(DEFAULT_TEXT).to_string(),
        QrType::Wifi => match &content.wifi {
            Some(wifi) => format!(
                "WIFI:T:{};S:{};P:{};H:{};;",
                wifi.encryption.as_str(),
                wifi.ssid,
                wifi.password,
                wifi.hidden
            ),
            None => DEFAULT_WIFI.to_string(),
        },
        QrType::Vcard => match &content.vcard {
            Some(card) => encode_vcard(card),
            None => DEFAULT_VCARD.to_string(),
        },
    }
}

fn encode_vcard(card: &VCardContent) -> String {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{};{};;;", card.last_name, card.first_name),
        format!("FN:{} {}", card.first_name, card.last_name),
    ];

    let optional = [
        ("ORG", &card.company),
        ("TITLE", &card.title),
        ("TEL", &card.phone),
        ("EMAIL", &card.email),
        ("URL", &card.website),
    ];
    for (tag, value) in optional {
        if let Some(value) = non_empty(value) {
            lines.push(format!("{tag}:{value}"));
        }
    }

    lines.push("END:VCARD".to_string());
    lines.join("\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
