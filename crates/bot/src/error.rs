use helpdesk_core::error::CoreError;
use helpdesk_core::transport::Reply;
use helpdesk_db::StoreError;

use crate::screens;

/// Entity name used for a missing sender.
pub const USER_ENTITY: &str = "user";

/// Errors raised while handling one inbound event. Delivery failures are
/// logged by the caller that sends the reply and never reach this type.
///
/// Every variant maps to a user-visible screen via [`BotError::user_screen`];
/// the dispatcher logs the error and replies with that screen instead of
/// propagating it.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// A domain-level error from `helpdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    /// The screen shown to the sender when handling fails.
    pub fn user_screen(&self) -> Reply {
        match self {
            BotError::Core(core) => match core {
                CoreError::NotFound { entity, .. } if *entity == USER_ENTITY => {
                    screens::unknown_user()
                }
                CoreError::NotFound { entity, id } => screens::not_found(entity, *id),
                CoreError::InvalidArgument(msg) => screens::invalid_input(msg),
                CoreError::Forbidden(_) => screens::access_denied(),
            },
            BotError::Store(store) => match store {
                StoreError::NotFound { entity, id } => screens::not_found(entity, *id),
                StoreError::InvalidArgument(msg) => screens::invalid_input(msg),
                StoreError::DuplicateKey(_) | StoreError::StorageUnavailable(_) => {
                    screens::generic_failure()
                }
            },
        }
    }

    /// Whether the error reflects user input rather than a fault on our side.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BotError::Core(
                CoreError::NotFound { .. } | CoreError::InvalidArgument(_) | CoreError::Forbidden(_)
            ) | BotError::Store(StoreError::NotFound { .. })
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_user_prompts_start() {
        let err = BotError::from(CoreError::NotFound {
            entity: USER_ENTITY,
            id: 1001,
        });
        assert!(err.user_screen().text.contains("/start"));
        assert!(err.is_user_error());
    }

    #[test]
    fn missing_ticket_names_number() {
        let err = BotError::from(CoreError::NotFound {
            entity: "ticket",
            id: 7,
        });
        assert!(err.user_screen().text.contains("Ticket #7"));
    }

    #[test]
    fn malformed_suffix_is_formatted() {
        let err = BotError::from(CoreError::InvalidArgument(
            "Malformed id in 'ticket_details_abc'".to_string(),
        ));
        let screen = err.user_screen();
        assert!(screen.text.contains("could not be processed"));
        assert!(screen.text.contains("ticket_details_abc"));
    }

    #[test]
    fn storage_failure_is_an_apology() {
        let err = BotError::from(StoreError::StorageUnavailable("pool timed out".into()));
        let screen = err.user_screen();
        assert!(screen.text.contains("Sorry"));
        assert!(!screen.text.contains("pool timed out"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn forbidden_is_access_denied() {
        let err = BotError::from(CoreError::Forbidden("admin_panel".into()));
        assert!(err.user_screen().text.contains("operators only"));
    }
}
