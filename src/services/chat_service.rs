use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::message::{ChatMessage, DeliveryState, MessageKey};
use crate::models::socket_event::{ClientEvent, OnlineUser, ServerEvent};

pub const MAX_MESSAGE_LEN: usize = 2000;
const TYPING_TTL_SECONDS: i64 = 4;

/// How an incoming message was folded into the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Not seen before; appended.
    New,
    /// Server echo of one of our pending messages; replaced in place.
    EchoOfOwn,
    /// Already shown; ignored.
    Duplicate,
}

/// Client-side state of one chat room.
///
/// Messages keep arrival order. Each one is indexed under every key it can
/// be recognised by, so an echo that only carries a server id still matches
/// after its pending original has adopted that id.
#[derive(Debug, Clone)]
pub struct ChatRoom {
    room: String,
    user_id: String,
    user_name: String,
    messages: Vec<ChatMessage>,
    index: HashMap<MessageKey, usize>,
    online: BTreeMap<String, Option<String>>,
    typing: HashMap<String, (Option<String>, DateTime<Utc>)>,
}

impl ChatRoom {
    pub fn new(room: impl Into<String>, user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            messages: Vec::new(),
            index: HashMap::new(),
            online: BTreeMap::new(),
            typing: HashMap::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.state == DeliveryState::Pending)
    }

    pub fn join_event(&self) -> ClientEvent {
        ClientEvent::Join {
            room: self.room.clone(),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
        }
    }

    pub fn leave_event(&self) -> ClientEvent {
        ClientEvent::Leave {
            room: self.room.clone(),
            user_id: self.user_id.clone(),
        }
    }

    pub fn history_request(&self, limit: Option<u32>) -> ClientEvent {
        ClientEvent::GetHistory {
            room: self.room.clone(),
            limit,
        }
    }

    pub fn online_users_request(&self) -> ClientEvent {
        ClientEvent::GetOnlineUsers {
            room: self.room.clone(),
        }
    }

    pub fn typing_event(&self, is_typing: bool) -> ClientEvent {
        ClientEvent::Typing {
            room: self.room.clone(),
            user_id: self.user_id.clone(),
            is_typing,
        }
    }

    /// Shows `text` optimistically and returns the event to emit.
    pub fn send_local(&mut self, text: &str, now: DateTime<Utc>) -> Result<ClientEvent> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::BadRequest("Message cannot be empty".to_string()));
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(Error::BadRequest(format!(
                "Message is longer than {} characters",
                MAX_MESSAGE_LEN
            )));
        }

        let message = ChatMessage {
            id: None,
            client_id: Some(Uuid::new_v4().to_string()),
            room: Some(self.room.clone()),
            sender_id: self.user_id.clone(),
            sender_name: Some(self.user_name.clone()),
            text: text.to_string(),
            timestamp: now,
            state: DeliveryState::Pending,
        };
        self.append(message.clone());
        Ok(ClientEvent::SendMessage(message))
    }

    /// Folds one server-delivered message into the room.
    pub fn receive(&mut self, mut incoming: ChatMessage) -> Reconciliation {
        incoming.state = DeliveryState::Delivered;

        let Some(pos) = self.find(&incoming) else {
            self.append(incoming);
            return Reconciliation::New;
        };

        let existing = &self.messages[pos];
        if existing.state == DeliveryState::Pending && existing.sender_id == incoming.sender_id {
            tracing::debug!(room = %self.room, client_id = ?existing.client_id, server_id = ?incoming.id, "own message confirmed");
            if incoming.client_id.is_none() {
                incoming.client_id = existing.client_id.clone();
            }
            if incoming.sender_name.is_none() {
                incoming.sender_name = existing.sender_name.clone();
            }
            self.messages[pos] = incoming;
            self.reindex(pos);
            Reconciliation::EchoOfOwn
        } else {
            Reconciliation::Duplicate
        }
    }

    /// Merges a history batch through the same transitions as live messages.
    pub fn load_history(&mut self, batch: Vec<ChatMessage>) -> Vec<Reconciliation> {
        batch.into_iter().map(|m| self.receive(m)).collect()
    }

    pub fn apply(&mut self, event: ServerEvent, now: DateTime<Utc>) -> Vec<Reconciliation> {
        match event {
            ServerEvent::NewMessage(m) => vec![self.receive(m)],
            ServerEvent::History { room, messages } if room == self.room => self.load_history(messages),
            ServerEvent::OnlineUsers { room, users } if room == self.room => {
                self.set_online(users);
                Vec::new()
            }
            ServerEvent::Typing {
                room,
                user_id,
                user_name,
                is_typing,
            } if room == self.room => {
                self.set_typing(user_id, user_name, is_typing, now);
                Vec::new()
            }
            other => {
                tracing::debug!(room = %self.room, event = ?other, "ignoring event for another room");
                Vec::new()
            }
        }
    }

    pub fn set_online(&mut self, users: Vec<OnlineUser>) {
        self.online = users
            .into_iter()
            .map(|u| (u.user_id, u.user_name))
            .collect();
    }

    pub fn online_user_ids(&self) -> impl Iterator<Item = &str> {
        self.online.keys().map(String::as_str)
    }

    pub fn set_typing(&mut self, user_id: String, user_name: Option<String>, is_typing: bool, now: DateTime<Utc>) {
        if user_id == self.user_id {
            return;
        }
        if is_typing {
            self.typing.insert(user_id, (user_name, now));
        } else {
            self.typing.remove(&user_id);
        }
    }

    /// Display names of others who typed within the last few seconds.
    pub fn typing_users(&self, now: DateTime<Utc>) -> Vec<String> {
        let ttl = Duration::seconds(TYPING_TTL_SECONDS);
        let mut names: Vec<String> = self
            .typing
            .iter()
            .filter(|(_, (_, at))| now - *at < ttl)
            .map(|(id, (name, _))| name.clone().unwrap_or_else(|| id.clone()))
            .collect();
        names.sort();
        names
    }

    fn keys_of(message: &ChatMessage) -> Vec<MessageKey> {
        let mut keys = Vec::with_capacity(3);
        if let Some(cid) = message.client_id.as_deref().filter(|s| !s.is_empty()) {
            keys.push(MessageKey::Client(cid.to_string()));
        }
        if let Some(id) = message.id.as_deref().filter(|s| !s.is_empty()) {
            keys.push(MessageKey::Server(id.to_string()));
        }
        keys.push(MessageKey::Composite(message.composite_key()));
        keys
    }

    /// Looks up by correlation id or server id; the composite key is only
    /// consulted when the message carries neither.
    fn find(&self, message: &ChatMessage) -> Option<usize> {
        let key = message.key();
        if let MessageKey::Composite(_) = key {
            return self.index.get(&key).copied();
        }
        Self::keys_of(message)
            .into_iter()
            .filter(|k| !matches!(k, MessageKey::Composite(_)))
            .find_map(|k| self.index.get(&k).copied())
    }

    fn append(&mut self, message: ChatMessage) {
        let pos = self.messages.len();
        self.messages.push(message);
        self.reindex(pos);
    }

    fn reindex(&mut self, pos: usize) {
        for key in Self::keys_of(&self.messages[pos]) {
            self.index.insert(key, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> ChatRoom {
        ChatRoom::new("faculty", "u1", "Prof. Dela Cruz")
    }

    fn server_message(id: &str, sender: &str, text: &str, at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id: Some(id.into()),
            client_id: None,
            room: Some("faculty".into()),
            sender_id: sender.into(),
            sender_name: None,
            text: text.into(),
            timestamp: at,
            state: DeliveryState::Delivered,
        }
    }

    fn echo_of(event: &ClientEvent, server_id: &str, at: DateTime<Utc>) -> ChatMessage {
        match event {
            ClientEvent::SendMessage(m) => ChatMessage {
                id: Some(server_id.into()),
                timestamp: at,
                ..m.clone()
            },
            other => panic!("not a send event: {:?}", other),
        }
    }

    #[test]
    fn echo_replaces_pending_message_in_place() {
        let mut r = room();
        let now = Utc::now();
        let sent = r.send_local("  Hello team ", now).unwrap();
        assert_eq!(r.pending().count(), 1);

        r.receive(server_message("90", "u2", "Hi!", now));
        let outcome = r.receive(echo_of(&sent, "91", now + Duration::milliseconds(40)));

        assert_eq!(outcome, Reconciliation::EchoOfOwn);
        assert_eq!(r.messages().len(), 2);
        assert_eq!(r.messages()[0].id.as_deref(), Some("91"));
        assert_eq!(r.messages()[0].text, "Hello team");
        assert_eq!(r.messages()[0].state, DeliveryState::Delivered);
        assert_eq!(r.pending().count(), 0);
    }

    #[test]
    fn repeated_broadcast_is_duplicate() {
        let mut r = room();
        let now = Utc::now();
        let sent = r.send_local("Agenda?", now).unwrap();
        let echo = echo_of(&sent, "7", now);

        assert_eq!(r.receive(echo.clone()), Reconciliation::EchoOfOwn);
        assert_eq!(r.receive(echo), Reconciliation::Duplicate);

        // Same message seen again without its correlation id.
        let bare = server_message("7", "u1", "Agenda?", now);
        assert_eq!(r.receive(bare), Reconciliation::Duplicate);
        assert_eq!(r.messages().len(), 1);
    }

    #[test]
    fn messages_without_ids_match_on_composite_key() {
        let mut r = room();
        let now = Utc::now();
        let mut m = server_message("", "u3", "Leave forms are due", now);
        m.id = None;

        assert_eq!(r.receive(m.clone()), Reconciliation::New);
        assert_eq!(r.receive(m.clone()), Reconciliation::Duplicate);

        m.text = "Leave forms are due Friday".into();
        assert_eq!(r.receive(m), Reconciliation::New);
        assert_eq!(r.messages().len(), 2);
    }

    #[test]
    fn distinct_server_ids_stay_separate_despite_same_text() {
        let mut r = room();
        let now = Utc::now();
        assert_eq!(r.receive(server_message("100", "u2", "ok", now)), Reconciliation::New);
        assert_eq!(r.receive(server_message("101", "u2", "ok", now)), Reconciliation::New);
        assert_eq!(r.messages().len(), 2);

        // Without ids the composite key still catches the repeat.
        let mut bare = server_message("", "u2", "ok", now);
        bare.id = None;
        assert_eq!(r.receive(bare), Reconciliation::Duplicate);
    }

    #[test]
    fn history_merges_with_live_messages() {
        let mut r = room();
        let now = Utc::now();
        r.receive(server_message("1", "u2", "first", now));
        let outcomes = r.apply(
            ServerEvent::History {
                room: "faculty".into(),
                messages: vec![
                    server_message("1", "u2", "first", now),
                    server_message("2", "u3", "second", now),
                ],
            },
            now,
        );
        assert_eq!(outcomes, vec![Reconciliation::Duplicate, Reconciliation::New]);
        assert_eq!(r.messages().len(), 2);
    }

    #[test]
    fn someone_elses_message_never_confirms_ours() {
        let mut r = room();
        let now = Utc::now();
        let sent = r.send_local("ok", now).unwrap();
        let mut spoof = echo_of(&sent, "5", now);
        spoof.sender_id = "u9".into();

        assert_eq!(r.receive(spoof), Reconciliation::Duplicate);
        assert_eq!(r.pending().count(), 1);
    }

    #[test]
    fn rejects_blank_and_oversized_messages() {
        let mut r = room();
        let now = Utc::now();
        assert!(r.send_local("   ", now).is_err());
        assert!(r.send_local(&"x".repeat(MAX_MESSAGE_LEN + 1), now).is_err());
        assert!(r.messages().is_empty());
    }

    #[test]
    fn typing_and_presence() {
        let mut r = room();
        let now = Utc::now();
        r.apply(
            ServerEvent::Typing {
                room: "faculty".into(),
                user_id: "u2".into(),
                user_name: Some("Ms. Tan".into()),
                is_typing: true,
            },
            now,
        );
        r.set_typing("u1".into(), None, true, now);
        assert_eq!(r.typing_users(now), vec!["Ms. Tan"]);
        assert!(r.typing_users(now + Duration::seconds(10)).is_empty());

        r.apply(
            ServerEvent::OnlineUsers {
                room: "faculty".into(),
                users: vec![
                    OnlineUser { user_id: "u2".into(), user_name: None },
                    OnlineUser { user_id: "u1".into(), user_name: None },
                ],
            },
            now,
        );
        assert_eq!(r.online_user_ids().collect::<Vec<_>>(), vec!["u1", "u2"]);

        let ignored = r.apply(
            ServerEvent::OnlineUsers {
                room: "staff".into(),
                users: Vec::new(),
            },
            now,
        );
        assert!(ignored.is_empty());
        assert_eq!(r.online_user_ids().count(), 2);
    }
}
