//! Transport-neutral message types and the outbound seam.
//!
//! The dispatcher consumes [`InboundEvent`]s and produces [`Outbound`]
//! messages; a [`ChatTransport`] implementation delivers them over a
//! concrete messaging platform. Reply text may carry bold, italic and code
//! emphasis as HTML tags, which transports treat as rendering hints.

use async_trait::async_trait;

use crate::position::Action;
use crate::types::{Timestamp, UserId};

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A clickable labeled choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub action: Action,
}

impl Choice {
    pub fn new(label: impl Into<String>, action: impl Into<Action>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Rendered screen: display text plus an ordered list of choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub choices: Vec<Choice>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choice(mut self, label: impl Into<String>, action: impl Into<Action>) -> Self {
        self.choices.push(Choice::new(label, action));
        self
    }

    /// Whether any choice carries `action`.
    pub fn offers(&self, action: Action) -> bool {
        self.choices.iter().any(|c| c.action == action)
    }
}

// ---------------------------------------------------------------------------
// Inbound / outbound
// ---------------------------------------------------------------------------

/// An event delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A free-text message or a command such as `/start`.
    TextMessage {
        sender_id: UserId,
        text: String,
        timestamp: Timestamp,
        sender_display_name: String,
    },
    /// A button press.
    ActionSelected {
        sender_id: UserId,
        action_id: String,
        /// Message that carried the button, edited in place when known.
        message_id: Option<i64>,
        /// Platform handle used to acknowledge the press.
        callback_id: Option<String>,
    },
}

impl InboundEvent {
    pub fn sender_id(&self) -> UserId {
        match self {
            Self::TextMessage { sender_id, .. } | Self::ActionSelected { sender_id, .. } => {
                *sender_id
            }
        }
    }
}

/// A message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Send {
        chat_id: UserId,
        reply: Reply,
    },
    Edit {
        chat_id: UserId,
        message_id: i64,
        reply: Reply,
    },
}

impl Outbound {
    pub fn chat_id(&self) -> UserId {
        match self {
            Self::Send { chat_id, .. } | Self::Edit { chat_id, .. } => *chat_id,
        }
    }

    pub fn reply(&self) -> &Reply {
        match self {
            Self::Send { reply, .. } | Self::Edit { reply, .. } => reply,
        }
    }
}

// ---------------------------------------------------------------------------
// ChatTransport
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

/// Outbound side of a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver a single message.
    async fn send(&self, message: &Outbound) -> Result<(), TransportError>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn acknowledge(&self, _callback_id: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
