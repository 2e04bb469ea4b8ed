//! Integration tests for ticket persistence against a real database.
//!
//! Exercises atomic number assignment, counters, ordering, pagination and
//! the single-edge resolution update.

use chrono::{Duration, Utc};
use helpdesk_core::ticket::TicketStatus;
use helpdesk_core::types::UserId;
use helpdesk_db::models::ticket::NewTicket;
use helpdesk_db::{HelpdeskStore, PgStore};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_ticket(owner_id: UserId, message: &str) -> NewTicket {
    NewTicket {
        owner_id,
        organization: "Acme".to_string(),
        address: "Main st. 1".to_string(),
        message: message.to_string(),
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Test: Insert returns the assigned number
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_returns_assigned_number(pool: PgPool) {
    let store = PgStore::new(pool);
    assert_eq!(store.last_ticket_number().await.unwrap(), None);

    let ticket = store
        .create_ticket(&new_ticket(1001, "Printer broken"))
        .await
        .unwrap();

    assert_eq!(ticket.owner_id, 1001);
    assert_eq!(ticket.message, "Printer broken");
    assert_eq!(ticket.status, TicketStatus::InProgress);
    assert_eq!(ticket.resolver_comment, None);
    assert_eq!(store.last_ticket_number().await.unwrap(), Some(ticket.number));
}

// ---------------------------------------------------------------------------
// Test: Ticket numbers strictly increase
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ticket_numbers_strictly_increase(pool: PgPool) {
    let store = PgStore::new(pool);

    store.create_ticket(&new_ticket(1, "first")).await.unwrap();
    let n1 = store.last_ticket_number().await.unwrap().unwrap();
    store.create_ticket(&new_ticket(1, "second")).await.unwrap();
    let n2 = store.last_ticket_number().await.unwrap().unwrap();

    assert!(n2 > n1);
}

// ---------------------------------------------------------------------------
// Test: Counters per user and globally
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn counters_split_by_owner_and_status(pool: PgPool) {
    let store = PgStore::new(pool);
    let a = store.create_ticket(&new_ticket(1, "a")).await.unwrap();
    store.create_ticket(&new_ticket(1, "b")).await.unwrap();
    store.create_ticket(&new_ticket(2, "c")).await.unwrap();
    store.resolve_ticket(a.number, Utc::now()).await.unwrap();

    assert_eq!(
        store
            .count_user_tickets_by_status(1, TicketStatus::InProgress)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .count_user_tickets_by_status(1, TicketStatus::Resolved)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .count_user_tickets_by_status(3, TicketStatus::Resolved)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .count_tickets_by_status(TicketStatus::InProgress)
            .await
            .unwrap(),
        2
    );
    assert_eq!(store.count_user_tickets(1).await.unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Test: Listings keep insertion order
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn listings_are_ordered_by_number(pool: PgPool) {
    let store = PgStore::new(pool);
    for i in 0..7 {
        store
            .create_ticket(&new_ticket(if i % 2 == 0 { 1 } else { 2 }, &format!("t{i}")))
            .await
            .unwrap();
    }

    let open = store
        .list_user_tickets_by_status(1, TicketStatus::InProgress)
        .await
        .unwrap();
    let messages: Vec<_> = open.iter().map(|t| t.message.as_str()).collect();
    assert_eq!(messages, ["t0", "t2", "t4", "t6"]);

    let global = store
        .list_tickets_by_status(TicketStatus::InProgress, 3)
        .await
        .unwrap();
    assert_eq!(global.len(), 3);
    assert!(global.windows(2).all(|w| w[0].number < w[1].number));

    let page = store.list_user_tickets_page(1, 2, 2).await.unwrap();
    let messages: Vec<_> = page.iter().map(|t| t.message.as_str()).collect();
    assert_eq!(messages, ["t4", "t6"]);
}

// ---------------------------------------------------------------------------
// Test: Comment only while in progress; resolution edge fires once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resolution_is_a_single_edge(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut input = new_ticket(1, "Printer broken");
    input.created_at = Utc::now() - Duration::hours(3);
    let ticket = store.create_ticket(&input).await.unwrap();

    let commented = store
        .set_ticket_comment(ticket.number, "Replaced cable")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(commented.resolver_comment.as_deref(), Some("Replaced cable"));

    let resolved = store
        .resolve_ticket(ticket.number, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, TicketStatus::Resolved);
    assert!(resolved.resolved_at.is_some());
    assert_eq!(resolved.resolver_comment.as_deref(), Some("Replaced cable"));

    assert!(store
        .resolve_ticket(ticket.number, Utc::now())
        .await
        .unwrap()
        .is_none());
    assert!(store
        .set_ticket_comment(ticket.number, "too late")
        .await
        .unwrap()
        .is_none());

    let stored = store.find_ticket(ticket.number).await.unwrap().unwrap();
    assert_eq!(stored.status, TicketStatus::Resolved);
    assert_eq!(stored.resolver_comment.as_deref(), Some("Replaced cable"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn latest_comment_wins_before_resolution(pool: PgPool) {
    let store = PgStore::new(pool);
    let ticket = store.create_ticket(&new_ticket(1, "Printer broken")).await.unwrap();

    store
        .set_ticket_comment(ticket.number, "Checking cable")
        .await
        .unwrap()
        .unwrap();
    let second = store
        .set_ticket_comment(ticket.number, "Replaced cable")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.resolver_comment.as_deref(), Some("Replaced cable"));
    assert_eq!(second.status, TicketStatus::InProgress);

    let resolved = store
        .resolve_ticket(ticket.number, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.resolver_comment.as_deref(), Some("Replaced cable"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_ticket_lookups(pool: PgPool) {
    let store = PgStore::new(pool);
    assert!(store.find_ticket(99).await.unwrap().is_none());
    assert!(store.resolve_ticket(99, Utc::now()).await.unwrap().is_none());
    assert!(!store
        .set_ticket_status(99, TicketStatus::Resolved)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Test: Organization and address are snapshots
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ticket_keeps_creation_time_company_data(pool: PgPool) {
    let store = PgStore::new(pool);
    let ticket = store.create_ticket(&new_ticket(5, "x")).await.unwrap();
    let stored = store.find_ticket(ticket.number).await.unwrap().unwrap();
    assert_eq!(stored.organization, "Acme");
    assert_eq!(stored.address, "Main st. 1");
}
