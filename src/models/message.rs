use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::serde_ext::{deserialize_id_flexible, deserialize_opt_id_flexible};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Shown optimistically, no server echo yet.
    Pending,
    #[default]
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "deserialize_opt_id_flexible")]
    pub id: Option<String>,
    #[serde(default, rename = "clientId", alias = "client_id")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(rename = "senderId", alias = "sender_id", deserialize_with = "deserialize_id_flexible")]
    pub sender_id: String,
    #[serde(default, rename = "senderName", alias = "sender_name")]
    pub sender_name: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub state: DeliveryState,
}

/// Identity used to match a message against ones already shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Client(String),
    Server(String),
    Composite(String),
}

impl ChatMessage {
    /// Correlation id first, then server id, then `timestamp|sender|text`.
    pub fn key(&self) -> MessageKey {
        if let Some(cid) = self.client_id.as_deref().filter(|s| !s.is_empty()) {
            MessageKey::Client(cid.to_string())
        } else if let Some(id) = self.id.as_deref().filter(|s| !s.is_empty()) {
            MessageKey::Server(id.to_string())
        } else {
            MessageKey::Composite(self.composite_key())
        }
    }

    pub fn composite_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.timestamp.timestamp_millis(),
            self.sender_id,
            self.text
        )
    }
}
