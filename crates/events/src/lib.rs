//! Help-desk event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`HelpdeskEvent`]: ticket lifecycle events consumed by the
//!   notification router.

pub mod bus;

pub use bus::{EventBus, HelpdeskEvent};
