//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the dispatcher, which
//! publishes, and the notification router, which subscribes.

use helpdesk_core::types::{TicketNumber, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// HelpdeskEvent
// ---------------------------------------------------------------------------

/// A ticket lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HelpdeskEvent {
    /// A user filed a new ticket.
    TicketCreated {
        number: TicketNumber,
        owner_id: UserId,
        user_name: String,
        message: String,
        /// Contact phone from the owner's profile at creation time.
        phone: String,
        organization: String,
        address: String,
        created_at: Timestamp,
    },
    /// An operator took a ticket across the resolution edge.
    TicketResolved {
        number: TicketNumber,
        owner_id: UserId,
        resolver_id: UserId,
        elapsed_hours: i64,
        comment: Option<String>,
    },
}

impl HelpdeskEvent {
    /// Dot-separated event name, used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket.created",
            Self::TicketResolved { .. } => "ticket.resolved",
        }
    }

    pub fn ticket_number(&self) -> TicketNumber {
        match self {
            Self::TicketCreated { number, .. } | Self::TicketResolved { number, .. } => *number,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// Every subscriber independently receives every published event.
pub struct EventBus {
    sender: broadcast::Sender<HelpdeskEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no active subscribers the event is dropped.
    pub fn publish(&self, event: HelpdeskEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            ticket_number = event.ticket_number(),
            "Publishing event"
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HelpdeskEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
