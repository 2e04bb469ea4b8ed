//! Ticket lifecycle: status values and resolution timing.

use crate::error::CoreError;
use crate::types::Timestamp;

pub const STATUS_IN_PROGRESS: &str = "in progress";
pub const STATUS_RESOLVED: &str = "resolved";

/// Lifecycle state of a ticket. `InProgress` moves to `Resolved` exactly
/// once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    InProgress,
    Resolved,
}

impl TicketStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_IN_PROGRESS => Ok(Self::InProgress),
            STATUS_RESOLVED => Ok(Self::Resolved),
            _ => Err(CoreError::InvalidArgument(format!(
                "Invalid ticket status '{s}'. Must be one of: {STATUS_IN_PROGRESS}, {STATUS_RESOLVED}"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Resolved => STATUS_RESOLVED,
        }
    }

    /// Human-readable label with a glyph.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InProgress => "🛠 in progress",
            Self::Resolved => "✅ resolved",
        }
    }
}

/// Whole hours elapsed between creation and resolution, rounded down.
///
/// Clock skew that would make the result negative yields zero.
pub fn elapsed_whole_hours(created_at: Timestamp, resolved_at: Timestamp) -> i64 {
    (resolved_at - created_at).num_hours().max(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
