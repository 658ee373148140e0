//! Payloads exchanged with an authenticated peer.
//!
//! Messages are UTF-8 JSON without a type tag. A receiver tells them apart
//! by shape: anything that decodes as a [`SettingsSchema`] is a schema
//! message, and anything else is either an [`AppDetails`] message or
//! foreign data.

use data_error::Result;
use data_settings::SettingsSchema;
use serde::{Deserialize, Serialize};

/// Static identity of the host application, shown on the handheld.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDetails {
    pub label: String,
    pub developer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl AppDetails {
    pub fn new(label: impl Into<String>, developer: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            developer: developer.into(),
            website: None,
            contact: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerMessage {
    Schema(SettingsSchema),
    AppDetails(AppDetails),
}

impl PeerMessage {
    /// Classifies a payload, trying the schema shape first. Returns `None`
    /// for anything that fits neither.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if let Some(schema) = decode_schema(bytes) {
            return Some(PeerMessage::Schema(schema));
        }
        serde_json::from_slice(bytes)
            .ok()
            .map(PeerMessage::AppDetails)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            PeerMessage::Schema(schema) => serde_json::to_vec(schema)?,
            PeerMessage::AppDetails(details) => serde_json::to_vec(details)?,
        };
        Ok(bytes)
    }
}

pub fn encode_schema(schema: &SettingsSchema) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(schema)?)
}

pub fn decode_schema(bytes: &[u8]) -> Option<SettingsSchema> {
    serde_json::from_slice(bytes).ok()
}
