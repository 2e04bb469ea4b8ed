#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use helpdesk_bot::dispatcher::Dispatcher;
use helpdesk_core::position::{Action, Position};
use helpdesk_core::ticket::TicketStatus;
use helpdesk_core::transport::{ChatTransport, InboundEvent, Outbound, TransportError};
use helpdesk_core::types::{TicketNumber, UserId};
use helpdesk_db::memory::MemoryStore;
use helpdesk_db::models::ticket::Ticket;
use helpdesk_events::{EventBus, HelpdeskEvent};
use tokio::sync::broadcast;

pub const OPERATOR: UserId = 1;
pub const USER: UserId = 1001;

/// Transport that records every delivered message.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Outbound>>,
    acknowledged: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: UserId) -> Vec<Outbound> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id() == chat_id)
            .collect()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, message: &Outbound) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        self.acknowledged
            .lock()
            .unwrap()
            .push(callback_id.to_string());
        Ok(())
    }
}

/// Dispatcher wired to an in-memory store and a real event bus.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub events: broadcast::Receiver<HelpdeskEvent>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(EventBus::default());
        let events = bus.subscribe();
        let dispatcher = Dispatcher::new(store.clone(), Arc::clone(&bus), vec![OPERATOR]);
        Self {
            store,
            bus,
            events,
            dispatcher,
        }
    }

    pub async fn text(&self, sender_id: UserId, text: &str) -> Outbound {
        self.dispatcher
            .handle(&InboundEvent::TextMessage {
                sender_id,
                text: text.to_string(),
                timestamp: Utc::now(),
                sender_display_name: format!("@user{sender_id}"),
            })
            .await
    }

    pub async fn press(&self, sender_id: UserId, action_id: impl Into<String>) -> Outbound {
        self.dispatcher
            .handle(&InboundEvent::ActionSelected {
                sender_id,
                action_id: action_id.into(),
                message_id: Some(500),
                callback_id: Some("cb".to_string()),
            })
            .await
    }

    pub async fn navigate(&self, sender_id: UserId, position: Position) -> Outbound {
        self.press(sender_id, Action::Navigate(position).to_string())
            .await
    }

    /// Events published since the last drain.
    pub fn drain_events(&mut self) -> Vec<HelpdeskEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Seed an open ticket created `hours_ago` hours before now.
    pub fn seed_open_ticket(&self, number: TicketNumber, owner_id: UserId, hours_ago: i64) {
        self.store.seed_ticket(Ticket {
            number,
            owner_id,
            organization: "Acme".to_string(),
            address: "Main st. 1".to_string(),
            message: "Printer broken".to_string(),
            created_at: Utc::now() - Duration::hours(hours_ago) - Duration::minutes(5),
            status: TicketStatus::InProgress,
            resolver_comment: None,
            resolved_at: None,
        });
    }
}
