//! Domain types for the help-desk bot.
//!
//! Everything in this crate is free of I/O: identifiers, the per-user
//! [`position::Position`] state, the company [`profile::Profile`], ticket
//! lifecycle helpers, pagination math, and the transport-neutral message
//! types consumed by the dispatcher.

pub mod error;
pub mod pagination;
pub mod position;
pub mod profile;
pub mod ticket;
pub mod transport;
pub mod types;
