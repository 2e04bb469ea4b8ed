/// Chat user identifier, assigned by the messaging platform.
pub type UserId = i64;

/// Ticket number, assigned by the database sequence.
pub type TicketNumber = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
