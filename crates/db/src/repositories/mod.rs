//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument and return raw rows.

pub mod ticket_repo;
pub mod user_repo;

pub use ticket_repo::TicketRepo;
pub use user_repo::UserRepo;
