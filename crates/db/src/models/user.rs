//! User entity model and DTOs.

use helpdesk_core::error::CoreError;
use helpdesk_core::position::Position;
use helpdesk_core::profile::Profile;
use helpdesk_core::types::{Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub tg_id: UserId,
    pub position: String,
    pub registered_at: Timestamp,
    pub profile: serde_json::Value,
}

/// A user with its position and profile decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub position: Position,
    pub registered_at: Timestamp,
    pub profile: Profile,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    /// A position tag that no longer parses decodes as the main menu, so
    /// `/start` and navigation can overwrite it instead of locking the
    /// user out.
    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let position = row.position.parse().unwrap_or_else(|e: CoreError| {
            tracing::warn!(
                user_id = row.tg_id,
                stored = %row.position,
                error = %e,
                "Unreadable stored position, using main menu"
            );
            Position::MAIN_MENU
        });
        Ok(Self {
            id: row.tg_id,
            position,
            registered_at: row.registered_at,
            profile: Profile::from_json(row.profile)?,
        })
    }
}

/// DTO for registering a user on first contact.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub position: Position,
    pub registered_at: Timestamp,
    pub profile: Profile,
}

impl NewUser {
    /// A user landing on the main menu with an empty profile.
    pub fn first_contact(id: UserId, registered_at: Timestamp) -> Self {
        Self {
            id,
            position: Position::MAIN_MENU,
            registered_at,
            profile: Profile::default(),
        }
    }
}
