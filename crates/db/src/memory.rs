//! In-memory [`HelpdeskStore`] for tests.
//!
//! Mirrors the PostgreSQL semantics that callers rely on: duplicate user
//! ids are rejected, ticket numbers start at 1 and are never reused, and
//! comment/resolve updates only apply to in-progress tickets.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use helpdesk_core::position::Position;
use helpdesk_core::profile::ProfileField;
use helpdesk_core::ticket::TicketStatus;
use helpdesk_core::types::{TicketNumber, Timestamp, UserId};

use crate::error::StoreError;
use crate::models::ticket::{NewTicket, Ticket};
use crate::models::user::{NewUser, User};
use crate::store::HelpdeskStore;

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    tickets: BTreeMap<TicketNumber, Ticket>,
    last_number: TicketNumber,
    unavailable: bool,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock_raw().unavailable = unavailable;
    }

    /// Insert a ticket verbatim, advancing the sequence past its number.
    pub fn seed_ticket(&self, ticket: Ticket) {
        let mut state = self.lock_raw();
        state.last_number = state.last_number.max(ticket.number);
        state.tickets.insert(ticket.number, ticket);
    }

    fn lock_raw(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let state = self.lock_raw();
        if state.unavailable {
            return Err(StoreError::StorageUnavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(state)
    }
}

fn clamp_usize(n: i64) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX)
}

#[async_trait]
impl HelpdeskStore for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut state = self.lock()?;
        if state.users.contains_key(&user.id) {
            return Err(StoreError::DuplicateKey("users_pkey".to_string()));
        }
        let created = User {
            id: user.id,
            position: user.position,
            registered_at: user.registered_at,
            profile: user.profile.clone(),
        };
        state.users.insert(user.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn set_position(&self, id: UserId, position: Position) -> Result<(), StoreError> {
        if let Some(user) = self.lock()?.users.get_mut(&id) {
            user.position = position;
        }
        Ok(())
    }

    async fn profile_field(
        &self,
        id: UserId,
        field: ProfileField,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .lock()?
            .users
            .get(&id)
            .map(|u| u.profile.get(field).to_string()))
    }

    async fn set_profile_field(
        &self,
        id: UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.lock()?.users.get_mut(&id) {
            user.profile.set(field, value);
        }
        Ok(())
    }

    async fn record_latest_ticket(
        &self,
        id: UserId,
        number: TicketNumber,
        created_at: Timestamp,
        user_name: &str,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.lock()?.users.get_mut(&id) {
            user.profile.set(ProfileField::HistoryTicket, number.to_string());
            user.profile.set(ProfileField::DataTicket, created_at.to_rfc3339());
            user.profile.set(ProfileField::UserName, user_name);
        }
        Ok(())
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, StoreError> {
        let mut state = self.lock()?;
        state.last_number += 1;
        let created = Ticket {
            number: state.last_number,
            owner_id: ticket.owner_id,
            organization: ticket.organization.clone(),
            address: ticket.address.clone(),
            message: ticket.message.clone(),
            created_at: ticket.created_at,
            status: TicketStatus::InProgress,
            resolver_comment: None,
            resolved_at: None,
        };
        state.tickets.insert(created.number, created.clone());
        Ok(created)
    }

    async fn last_ticket_number(&self) -> Result<Option<TicketNumber>, StoreError> {
        Ok(self.lock()?.tickets.keys().next_back().copied())
    }

    async fn find_ticket(&self, number: TicketNumber) -> Result<Option<Ticket>, StoreError> {
        Ok(self.lock()?.tickets.get(&number).cloned())
    }

    async fn count_tickets_by_status(&self, status: TicketStatus) -> Result<i64, StoreError> {
        let state = self.lock()?;
        Ok(state.tickets.values().filter(|t| t.status == status).count() as i64)
    }

    async fn count_user_tickets_by_status(
        &self,
        owner_id: UserId,
        status: TicketStatus,
    ) -> Result<i64, StoreError> {
        let state = self.lock()?;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.owner_id == owner_id && t.status == status)
            .count() as i64)
    }

    async fn count_user_tickets(&self, owner_id: UserId) -> Result<i64, StoreError> {
        let state = self.lock()?;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.owner_id == owner_id)
            .count() as i64)
    }

    async fn list_user_tickets_by_status(
        &self,
        owner_id: UserId,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.owner_id == owner_id && t.status == status)
            .cloned()
            .collect())
    }

    async fn list_tickets_by_status(
        &self,
        status: TicketStatus,
        limit: i64,
    ) -> Result<Vec<Ticket>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.status == status)
            .take(clamp_usize(limit))
            .cloned()
            .collect())
    }

    async fn list_user_tickets_page(
        &self,
        owner_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.owner_id == owner_id)
            .skip(clamp_usize(offset))
            .take(clamp_usize(limit))
            .cloned()
            .collect())
    }

    async fn set_ticket_status(
        &self,
        number: TicketNumber,
        status: TicketStatus,
    ) -> Result<bool, StoreError> {
        match self.lock()?.tickets.get_mut(&number) {
            Some(ticket) => {
                ticket.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_ticket_comment(
        &self,
        number: TicketNumber,
        comment: &str,
    ) -> Result<Option<Ticket>, StoreError> {
        let mut state = self.lock()?;
        Ok(state
            .tickets
            .get_mut(&number)
            .filter(|t| t.is_open())
            .map(|t| {
                t.resolver_comment = Some(comment.to_string());
                t.clone()
            }))
    }

    async fn resolve_ticket(
        &self,
        number: TicketNumber,
        resolved_at: Timestamp,
    ) -> Result<Option<Ticket>, StoreError> {
        let mut state = self.lock()?;
        Ok(state
            .tickets
            .get_mut(&number)
            .filter(|t| t.is_open())
            .map(|t| {
                t.status = TicketStatus::Resolved;
                t.resolved_at = Some(resolved_at);
                t.clone()
            }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
