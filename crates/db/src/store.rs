//! The persistence contract the dispatcher depends on.

use async_trait::async_trait;
use helpdesk_core::position::Position;
use helpdesk_core::profile::ProfileField;
use helpdesk_core::ticket::TicketStatus;
use helpdesk_core::types::{TicketNumber, Timestamp, UserId};

use crate::error::StoreError;
use crate::models::ticket::{NewTicket, Ticket, TicketRow};
use crate::models::user::{NewUser, User, UserRow};
use crate::repositories::{TicketRepo, UserRepo};
use crate::DbPool;

/// Repository interface over users and tickets.
///
/// Every call is a durable read or write; implementations keep no cache.
#[async_trait]
pub trait HelpdeskStore: Send + Sync {
    /// Register a user. Fails with [`StoreError::DuplicateKey`] if the id exists.
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Overwrite the user's position. A missing user is a no-op.
    async fn set_position(&self, id: UserId, position: Position) -> Result<(), StoreError>;

    /// Current value of a profile field, or its default when unset.
    /// `None` only when the user does not exist.
    async fn profile_field(
        &self,
        id: UserId,
        field: ProfileField,
    ) -> Result<Option<String>, StoreError>;

    /// Set one profile field. A missing user is a no-op.
    async fn set_profile_field(
        &self,
        id: UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Record the latest ticket summary on the owner's profile.
    async fn record_latest_ticket(
        &self,
        id: UserId,
        number: TicketNumber,
        created_at: Timestamp,
        user_name: &str,
    ) -> Result<(), StoreError>;

    /// Insert a ticket and return it with its assigned number, atomically.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, StoreError>;

    async fn last_ticket_number(&self) -> Result<Option<TicketNumber>, StoreError>;

    async fn find_ticket(&self, number: TicketNumber) -> Result<Option<Ticket>, StoreError>;

    async fn count_tickets_by_status(&self, status: TicketStatus) -> Result<i64, StoreError>;

    async fn count_user_tickets_by_status(
        &self,
        owner_id: UserId,
        status: TicketStatus,
    ) -> Result<i64, StoreError>;

    async fn count_user_tickets(&self, owner_id: UserId) -> Result<i64, StoreError>;

    /// A user's tickets with the given status, in number order.
    async fn list_user_tickets_by_status(
        &self,
        owner_id: UserId,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, StoreError>;

    /// Up to `limit` tickets with the given status, oldest first.
    async fn list_tickets_by_status(
        &self,
        status: TicketStatus,
        limit: i64,
    ) -> Result<Vec<Ticket>, StoreError>;

    /// A page of a user's tickets of any status, in number order.
    async fn list_user_tickets_page(
        &self,
        owner_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, StoreError>;

    /// Unconditional status overwrite. Returns `false` if the ticket is missing.
    async fn set_ticket_status(
        &self,
        number: TicketNumber,
        status: TicketStatus,
    ) -> Result<bool, StoreError>;

    /// Set the resolver comment on an in-progress ticket. `None` if the
    /// ticket is missing or already resolved.
    async fn set_ticket_comment(
        &self,
        number: TicketNumber,
        comment: &str,
    ) -> Result<Option<Ticket>, StoreError>;

    /// Take the `in progress` -> `resolved` edge. `None` if the ticket is
    /// missing or was already resolved.
    async fn resolve_ticket(
        &self,
        number: TicketNumber,
        resolved_at: Timestamp,
    ) -> Result<Option<Ticket>, StoreError>;
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// [`HelpdeskStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn user_from_row(row: UserRow) -> Result<User, StoreError> {
    Ok(User::try_from(row)?)
}

fn ticket_from_row(row: TicketRow) -> Result<Ticket, StoreError> {
    Ok(Ticket::try_from(row)?)
}

fn tickets_from_rows(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, StoreError> {
    rows.into_iter().map(ticket_from_row).collect()
}

#[async_trait]
impl HelpdeskStore for PgStore {
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let row = UserRepo::create(&self.pool, user).await?;
        tracing::info!(user_id = row.tg_id, "User registered");
        user_from_row(row)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        UserRepo::find_by_id(&self.pool, id)
            .await?
            .map(user_from_row)
            .transpose()
    }

    async fn set_position(&self, id: UserId, position: Position) -> Result<(), StoreError> {
        let updated = UserRepo::update_position(&self.pool, id, &position.to_string()).await?;
        if !updated {
            tracing::debug!(user_id = id, %position, "Position update for unknown user");
        }
        Ok(())
    }

    async fn profile_field(
        &self,
        id: UserId,
        field: ProfileField,
    ) -> Result<Option<String>, StoreError> {
        let mut value = UserRepo::get_profile_field(&self.pool, id, field.key()).await?;
        if field == ProfileField::Address && matches!(value, Some(None)) {
            value = UserRepo::get_profile_field(&self.pool, id, "organization_adress").await?;
        }
        Ok(value.map(|v| v.unwrap_or_else(|| field.default_value().to_string())))
    }

    async fn set_profile_field(
        &self,
        id: UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<(), StoreError> {
        UserRepo::set_profile_field(&self.pool, id, field.key(), value).await?;
        Ok(())
    }

    async fn record_latest_ticket(
        &self,
        id: UserId,
        number: TicketNumber,
        created_at: Timestamp,
        user_name: &str,
    ) -> Result<(), StoreError> {
        UserRepo::record_latest_ticket(
            &self.pool,
            id,
            &number.to_string(),
            &created_at.to_rfc3339(),
            user_name,
        )
        .await?;
        Ok(())
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, StoreError> {
        let row = TicketRepo::create(&self.pool, ticket).await?;
        tracing::info!(ticket_number = row.number, owner_id = row.owner_id, "Ticket created");
        ticket_from_row(row)
    }

    async fn last_ticket_number(&self) -> Result<Option<TicketNumber>, StoreError> {
        Ok(TicketRepo::last_number(&self.pool).await?)
    }

    async fn find_ticket(&self, number: TicketNumber) -> Result<Option<Ticket>, StoreError> {
        TicketRepo::find_by_number(&self.pool, number)
            .await?
            .map(ticket_from_row)
            .transpose()
    }

    async fn count_tickets_by_status(&self, status: TicketStatus) -> Result<i64, StoreError> {
        Ok(TicketRepo::count_by_status(&self.pool, status.as_str()).await?)
    }

    async fn count_user_tickets_by_status(
        &self,
        owner_id: UserId,
        status: TicketStatus,
    ) -> Result<i64, StoreError> {
        Ok(TicketRepo::count_by_owner_and_status(&self.pool, owner_id, status.as_str()).await?)
    }

    async fn count_user_tickets(&self, owner_id: UserId) -> Result<i64, StoreError> {
        Ok(TicketRepo::count_by_owner(&self.pool, owner_id).await?)
    }

    async fn list_user_tickets_by_status(
        &self,
        owner_id: UserId,
        status: TicketStatus,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows =
            TicketRepo::list_by_owner_and_status(&self.pool, owner_id, status.as_str()).await?;
        tickets_from_rows(rows)
    }

    async fn list_tickets_by_status(
        &self,
        status: TicketStatus,
        limit: i64,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows = TicketRepo::list_by_status(&self.pool, status.as_str(), limit).await?;
        tickets_from_rows(rows)
    }

    async fn list_user_tickets_page(
        &self,
        owner_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows = TicketRepo::list_by_owner_page(&self.pool, owner_id, limit, offset).await?;
        tickets_from_rows(rows)
    }

    async fn set_ticket_status(
        &self,
        number: TicketNumber,
        status: TicketStatus,
    ) -> Result<bool, StoreError> {
        Ok(TicketRepo::update_status(&self.pool, number, status.as_str()).await?)
    }

    async fn set_ticket_comment(
        &self,
        number: TicketNumber,
        comment: &str,
    ) -> Result<Option<Ticket>, StoreError> {
        TicketRepo::update_comment(&self.pool, number, comment)
            .await?
            .map(ticket_from_row)
            .transpose()
    }

    async fn resolve_ticket(
        &self,
        number: TicketNumber,
        resolved_at: Timestamp,
    ) -> Result<Option<Ticket>, StoreError> {
        let row = TicketRepo::resolve(&self.pool, number, resolved_at).await?;
        if let Some(ref r) = row {
            tracing::info!(ticket_number = r.number, "Ticket resolved");
        }
        row.map(ticket_from_row).transpose()
    }
}
