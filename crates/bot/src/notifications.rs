//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the [`EventBus`](helpdesk_events::EventBus)
//! and mirrors ticket events to operators and ticket owners over the chat
//! transport. Delivery is best-effort: failures are logged, never retried.

use std::sync::Arc;

use helpdesk_core::transport::{ChatTransport, Outbound, Reply};
use helpdesk_core::types::UserId;
use helpdesk_events::HelpdeskEvent;
use tokio::sync::broadcast;

use crate::screens;

pub struct NotificationRouter {
    transport: Arc<dyn ChatTransport>,
    operators: Vec<UserId>,
}

impl NotificationRouter {
    pub fn new(transport: Arc<dyn ChatTransport>, operators: Vec<UserId>) -> Self {
        Self {
            transport,
            operators,
        }
    }

    /// Run the routing loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<HelpdeskEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event to every target.
    pub async fn route_event(&self, event: &HelpdeskEvent) {
        let reply = render(event);
        for chat_id in self.targets(event) {
            let message = Outbound::Send {
                chat_id,
                reply: reply.clone(),
            };
            match self.transport.send(&message).await {
                Ok(()) => tracing::debug!(
                    chat_id,
                    event_type = event.event_type(),
                    ticket_number = event.ticket_number(),
                    "Notification delivered"
                ),
                Err(e) => tracing::error!(
                    chat_id,
                    error = %e,
                    event_type = event.event_type(),
                    ticket_number = event.ticket_number(),
                    "Failed to deliver notification"
                ),
            }
        }
    }

    /// Recipients of an event, each at most once.
    ///
    /// New tickets go to every operator. Resolutions go to the owner and
    /// every operator except the resolver, who already got a confirmation.
    pub fn targets(&self, event: &HelpdeskEvent) -> Vec<UserId> {
        let mut targets = Vec::new();
        match event {
            HelpdeskEvent::TicketCreated { .. } => {
                targets.extend(self.operators.iter().copied());
            }
            HelpdeskEvent::TicketResolved {
                owner_id,
                resolver_id,
                ..
            } => {
                targets.push(*owner_id);
                targets.extend(self.operators.iter().copied());
                targets.retain(|id| id != resolver_id);
            }
        }
        let mut seen = Vec::with_capacity(targets.len());
        targets.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        targets
    }
}

fn render(event: &HelpdeskEvent) -> Reply {
    match event {
        HelpdeskEvent::TicketCreated {
            number,
            user_name,
            message,
            phone,
            organization,
            address,
            ..
        } => screens::ticket_created_notice(
            *number,
            user_name,
            message,
            phone,
            organization,
            address,
        ),
        HelpdeskEvent::TicketResolved {
            number,
            elapsed_hours,
            comment,
            ..
        } => screens::ticket_resolved_notice(*number, *elapsed_hours, comment.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use helpdesk_core::transport::TransportError;

    use super::*;

    struct NullTransport;

    #[async_trait]
    impl ChatTransport for NullTransport {
        async fn send(&self, _message: &Outbound) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn router(operators: Vec<UserId>) -> NotificationRouter {
        NotificationRouter::new(Arc::new(NullTransport), operators)
    }

    fn resolved(owner_id: UserId, resolver_id: UserId) -> HelpdeskEvent {
        HelpdeskEvent::TicketResolved {
            number: 7,
            owner_id,
            resolver_id,
            elapsed_hours: 3,
            comment: None,
        }
    }

    #[test]
    fn resolution_targets_owner_and_other_operators() {
        let router = router(vec![1, 2]);
        assert_eq!(router.targets(&resolved(1001, 1)), vec![1001, 2]);
    }

    #[test]
    fn owner_who_is_operator_is_notified_once() {
        let router = router(vec![1, 2]);
        assert_eq!(router.targets(&resolved(2, 1)), vec![2]);
    }

    #[test]
    fn creation_targets_operators() {
        let router = router(vec![1, 2]);
        let event = HelpdeskEvent::TicketCreated {
            number: 1,
            owner_id: 1001,
            user_name: "@anna".to_string(),
            message: "Printer broken".to_string(),
            phone: "no data".to_string(),
            organization: "no data".to_string(),
            address: "no data".to_string(),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(router.targets(&event), vec![1, 2]);
    }
}
