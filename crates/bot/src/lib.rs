//! Help-desk bot: conversation state machine over a chat transport.
//!
//! - [`dispatcher::Dispatcher`] turns inbound events into store writes and
//!   rendered replies, keyed on the sender's stored position.
//! - [`screens`] holds the pure renderers.
//! - [`notifications::NotificationRouter`] mirrors ticket events to the
//!   operators and ticket owners.
//! - [`runtime`] drives Telegram long polling.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notifications;
pub mod runtime;
pub mod screens;
