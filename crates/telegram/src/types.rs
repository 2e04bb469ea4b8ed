//! Bot API wire types.
//!
//! Only the fields the bot reads are modelled; everything else in the
//! payloads is ignored by serde.

use chrono::DateTime;
use helpdesk_core::transport::InboundEvent;
use serde::Deserialize;

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Unix time in seconds.
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl User {
    /// `@username` when set, otherwise the first name.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl Update {
    /// Map the update to a transport-neutral event.
    ///
    /// Returns `None` for updates the bot does not handle: non-text
    /// messages, messages without a sender, button presses without data and
    /// anything from a group. Replies are addressed to the sender, which is
    /// only the originating chat in a private conversation.
    pub fn into_inbound(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            if let Some(chat) = query.message.as_ref().map(|m| &m.chat) {
                if chat.id != query.from.id {
                    tracing::debug!(chat_id = chat.id, user_id = query.from.id, "Ignoring group button press");
                    return None;
                }
            }
            let action_id = query.data?;
            return Some(InboundEvent::ActionSelected {
                sender_id: query.from.id,
                action_id,
                message_id: query.message.map(|m| m.message_id),
                callback_id: Some(query.id),
            });
        }

        let message = self.message?;
        let from = message.from?;
        if message.chat.id != from.id {
            tracing::debug!(chat_id = message.chat.id, user_id = from.id, "Ignoring group message");
            return None;
        }
        let text = message.text?;
        let timestamp = DateTime::from_timestamp(message.date, 0)?;
        Some(InboundEvent::TextMessage {
            sender_id: from.id,
            text,
            timestamp,
            sender_display_name: from.display_name(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn parse(json: serde_json::Value) -> Update {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn text_message_maps_to_text_event() {
        let update = parse(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 3,
                "date": 1_709_283_600,
                "chat": { "id": 1001, "type": "private" },
                "from": { "id": 1001, "is_bot": false, "first_name": "Anna", "username": "anna_k" },
                "text": "Printer broken"
            }
        }));

        assert_matches!(
            update.into_inbound(),
            Some(InboundEvent::TextMessage { sender_id: 1001, text, timestamp, sender_display_name }) => {
                assert_eq!(text, "Printer broken");
                assert_eq!(timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
                assert_eq!(sender_display_name, "@anna_k");
            }
        );
    }

    #[test]
    fn display_name_falls_back_to_first_name() {
        let update = parse(serde_json::json!({
            "update_id": 11,
            "message": {
                "message_id": 4,
                "date": 1_709_283_600,
                "chat": { "id": 5 },
                "from": { "id": 5, "first_name": "Ivan" },
                "text": "/start"
            }
        }));

        assert_matches!(
            update.into_inbound(),
            Some(InboundEvent::TextMessage { sender_display_name, .. }) if sender_display_name == "Ivan"
        );
    }

    #[test]
    fn callback_query_maps_to_action_event() {
        let update = parse(serde_json::json!({
            "update_id": 12,
            "callback_query": {
                "id": "cb-77",
                "from": { "id": 1, "first_name": "Op" },
                "message": {
                    "message_id": 40,
                    "date": 1_709_283_600,
                    "chat": { "id": 1 }
                },
                "data": "complete_7"
            }
        }));

        assert_eq!(
            update.into_inbound(),
            Some(InboundEvent::ActionSelected {
                sender_id: 1,
                action_id: "complete_7".to_string(),
                message_id: Some(40),
                callback_id: Some("cb-77".to_string()),
            })
        );
    }

    #[test]
    fn non_text_message_is_skipped() {
        let update = parse(serde_json::json!({
            "update_id": 13,
            "message": {
                "message_id": 5,
                "date": 1_709_283_600,
                "chat": { "id": 5 },
                "from": { "id": 5, "first_name": "Ivan" }
            }
        }));
        assert!(update.into_inbound().is_none());
    }

    #[test]
    fn group_updates_are_skipped() {
        let message = parse(serde_json::json!({
            "update_id": 14,
            "message": {
                "message_id": 6,
                "date": 1_709_283_600,
                "chat": { "id": -100_200, "type": "supergroup" },
                "from": { "id": 5, "first_name": "Ivan" },
                "text": "/start"
            }
        }));
        assert!(message.into_inbound().is_none());

        let press = parse(serde_json::json!({
            "update_id": 15,
            "callback_query": {
                "id": "cb-78",
                "from": { "id": 5, "first_name": "Ivan" },
                "message": {
                    "message_id": 41,
                    "date": 1_709_283_600,
                    "chat": { "id": -100_200, "type": "supergroup" }
                },
                "data": "main_menu"
            }
        }));
        assert!(press.into_inbound().is_none());
    }

    #[test]
    fn error_envelope_parses() {
        let response: ApiResponse<serde_json::Value> = serde_json::from_value(serde_json::json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is not modified"
        }))
        .unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(400));
    }
}
