use serde::{Deserialize, Serialize};

use crate::models::message::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineUser {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    #[serde(default, rename = "userName", alias = "user_name")]
    pub user_name: Option<String>,
}

/// Events the widget emits to the realtime server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userName")]
        user_name: String,
    },
    Leave {
        room: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
    SendMessage(ChatMessage),
    Typing {
        room: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
    GetHistory {
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    GetOnlineUsers {
        room: String,
    },
}

/// Events the realtime server broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewMessage(ChatMessage),
    History {
        room: String,
        messages: Vec<ChatMessage>,
    },
    OnlineUsers {
        room: String,
        users: Vec<OnlineUser>,
    },
    Typing {
        room: String,
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(default, rename = "userName")]
        user_name: Option<String>,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_server_broadcast() {
        let event: ServerEvent = serde_json::from_value(json!({
            "event": "new_message",
            "data": {
                "id": 812,
                "clientId": "c-1",
                "room": "faculty",
                "senderId": 44,
                "senderName": "Dean Ramos",
                "text": "Meeting at 3",
                "timestamp": "2026-03-02T07:00:00Z"
            }
        }))
        .unwrap();
        match event {
            ServerEvent::NewMessage(m) => {
                assert_eq!(m.id.as_deref(), Some("812"));
                assert_eq!(m.sender_id, "44");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn client_event_tags() {
        let v = serde_json::to_value(ClientEvent::GetHistory {
            room: "staff".into(),
            limit: None,
        })
        .unwrap();
        assert_eq!(v, json!({"event": "get_history", "data": {"room": "staff"}}));
    }
}
