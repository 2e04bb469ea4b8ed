//! Repository for the `tickets` table.

use helpdesk_core::ticket::{STATUS_IN_PROGRESS, STATUS_RESOLVED};
use helpdesk_core::types::{TicketNumber, Timestamp, UserId};
use sqlx::PgPool;

use crate::models::ticket::{NewTicket, TicketRow};

/// Column list for `tickets` queries.
const COLUMNS: &str = "\
    number, owner_id, organization, address, message, \
    created_at, status, resolver_comment, resolved_at";

/// Provides ticket creation, lookups, counters and lifecycle updates.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a new in-progress ticket, returning the row with its
    /// assigned number.
    pub async fn create(pool: &PgPool, input: &NewTicket) -> Result<TicketRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tickets (owner_id, organization, address, message, created_at, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(input.owner_id)
            .bind(&input.organization)
            .bind(&input.address)
            .bind(&input.message)
            .bind(input.created_at)
            .bind(STATUS_IN_PROGRESS)
            .fetch_one(pool)
            .await
    }

    /// Highest ticket number issued so far, `None` for an empty table.
    pub async fn last_number(pool: &PgPool) -> Result<Option<TicketNumber>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<TicketNumber>>("SELECT MAX(number) FROM tickets")
            .fetch_one(pool)
            .await
    }

    /// Find a ticket by number.
    pub async fn find_by_number(
        pool: &PgPool,
        number: TicketNumber,
    ) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE number = $1");
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(number)
            .fetch_optional(pool)
            .await
    }

    /// Count all tickets with the given status.
    pub async fn count_by_status(pool: &PgPool, status: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }

    /// Count one user's tickets with the given status.
    pub async fn count_by_owner_and_status(
        pool: &PgPool,
        owner_id: UserId,
        status: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE owner_id = $1 AND status = $2")
            .bind(owner_id)
            .bind(status)
            .fetch_one(pool)
            .await
    }

    /// Count all of one user's tickets.
    pub async fn count_by_owner(pool: &PgPool, owner_id: UserId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }

    /// List one user's tickets with the given status, in number order.
    pub async fn list_by_owner_and_status(
        pool: &PgPool,
        owner_id: UserId,
        status: &str,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets \
             WHERE owner_id = $1 AND status = $2 \
             ORDER BY number ASC"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(owner_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// List tickets with the given status across all users, oldest first.
    pub async fn list_by_status(
        pool: &PgPool,
        status: &str,
        limit: i64,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets WHERE status = $1 ORDER BY number ASC LIMIT $2"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(status)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// One page of a user's tickets of any status, in number order.
    pub async fn list_by_owner_page(
        pool: &PgPool,
        owner_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tickets WHERE owner_id = $1 \
             ORDER BY number ASC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the status unconditionally. Returns `true` if the row exists.
    pub async fn update_status(
        pool: &PgPool,
        number: TicketNumber,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tickets SET status = $2 WHERE number = $1")
            .bind(number)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the resolver comment while the ticket is still in progress.
    ///
    /// Returns `None` if the ticket does not exist or is already resolved.
    pub async fn update_comment(
        pool: &PgPool,
        number: TicketNumber,
        comment: &str,
    ) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET resolver_comment = $2 \
             WHERE number = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(number)
            .bind(comment)
            .bind(STATUS_IN_PROGRESS)
            .fetch_optional(pool)
            .await
    }

    /// Move an in-progress ticket to resolved.
    ///
    /// Only the caller that wins the `in progress` -> `resolved` edge gets
    /// the row back; a ticket that is missing or already resolved yields
    /// `None`.
    pub async fn resolve(
        pool: &PgPool,
        number: TicketNumber,
        resolved_at: Timestamp,
    ) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET status = $3, resolved_at = $2 \
             WHERE number = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(number)
            .bind(resolved_at)
            .bind(STATUS_RESOLVED)
            .bind(STATUS_IN_PROGRESS)
            .fetch_optional(pool)
            .await
    }
}
