//! Ticket entity model and DTOs.

use helpdesk_core::error::CoreError;
use helpdesk_core::ticket::TicketStatus;
use helpdesk_core::types::{TicketNumber, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `tickets` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub number: TicketNumber,
    pub owner_id: UserId,
    pub organization: String,
    pub address: String,
    pub message: String,
    pub created_at: Timestamp,
    pub status: String,
    pub resolver_comment: Option<String>,
    pub resolved_at: Option<Timestamp>,
}

/// A ticket with its status decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub number: TicketNumber,
    pub owner_id: UserId,
    /// Owner's organization at creation time; not updated by later edits.
    pub organization: String,
    /// Owner's address at creation time; not updated by later edits.
    pub address: String,
    pub message: String,
    pub created_at: Timestamp,
    pub status: TicketStatus,
    pub resolver_comment: Option<String>,
    pub resolved_at: Option<Timestamp>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::InProgress
    }
}

impl TryFrom<TicketRow> for Ticket {
    type Error = CoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            number: row.number,
            owner_id: row.owner_id,
            organization: row.organization,
            address: row.address,
            message: row.message,
            created_at: row.created_at,
            status: TicketStatus::from_str_db(&row.status)?,
            resolver_comment: row.resolver_comment,
            resolved_at: row.resolved_at,
        })
    }
}

/// DTO for filing a new ticket. Status always starts as in progress.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub owner_id: UserId,
    pub organization: String,
    pub address: String,
    pub message: String,
    pub created_at: Timestamp,
}
