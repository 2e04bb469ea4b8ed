//! Telegram Bot API adapter.
//!
//! [`api::TelegramApi`] wraps the HTTP endpoints the bot needs (long
//! polling, sending and editing messages, acknowledging button presses).
//! [`types`] holds the wire structures and their mapping to
//! [`helpdesk_core::transport::InboundEvent`]. The client implements
//! [`helpdesk_core::transport::ChatTransport`].

pub mod api;
pub mod keyboard;
pub mod types;

pub use api::{TelegramApi, TelegramError};
