//! Position-driven event dispatch.
//!
//! Free text is interpreted according to the sender's stored [`Position`];
//! button presses carry their own [`Action`]. Each transition performs its
//! store writes, publishes ticket events on the bus and renders the reply.
//! Errors are caught here and turned into a screen for the sender.

use std::sync::Arc;

use chrono::Utc;
use helpdesk_core::error::CoreError;
use helpdesk_core::pagination::{Page, ADMIN_PANEL_LIMIT, HISTORY_PAGE_SIZE};
use helpdesk_core::position::{Action, InputKind, Position, Screen};
use helpdesk_core::profile::{CompanyField, ProfileField};
use helpdesk_core::ticket::{elapsed_whole_hours, TicketStatus};
use helpdesk_core::transport::{InboundEvent, Outbound, Reply};
use helpdesk_core::types::{TicketNumber, Timestamp, UserId};
use helpdesk_db::models::ticket::{NewTicket, Ticket};
use helpdesk_db::models::user::{NewUser, User};
use helpdesk_db::{HelpdeskStore, StoreError};
use helpdesk_events::{EventBus, HelpdeskEvent};

use crate::error::{BotError, BotResult, USER_ENTITY};
use crate::screens;

const START_COMMAND: &str = "/start";

/// Routes inbound events to transitions.
pub struct Dispatcher {
    store: Arc<dyn HelpdeskStore>,
    bus: Arc<EventBus>,
    operators: Vec<UserId>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn HelpdeskStore>, bus: Arc<EventBus>, operators: Vec<UserId>) -> Self {
        Self {
            store,
            bus,
            operators,
        }
    }

    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.operators.contains(&user_id)
    }

    /// Handle one inbound event and return the reply for its sender.
    ///
    /// Never fails: errors are logged and rendered as a screen.
    pub async fn handle(&self, event: &InboundEvent) -> Outbound {
        let sender_id = event.sender_id();
        let result = match event {
            InboundEvent::TextMessage {
                sender_id,
                text,
                timestamp,
                sender_display_name,
            } => {
                self.on_text(*sender_id, text, *timestamp, sender_display_name)
                    .await
            }
            InboundEvent::ActionSelected {
                sender_id,
                action_id,
                ..
            } => self.on_action(*sender_id, action_id).await,
        };

        let reply = result.unwrap_or_else(|e| {
            if e.is_user_error() {
                tracing::info!(user_id = sender_id, error = %e, "Rejected event");
            } else {
                tracing::error!(user_id = sender_id, error = %e, "Failed to handle event");
            }
            e.user_screen()
        });

        match event {
            InboundEvent::ActionSelected {
                message_id: Some(message_id),
                ..
            } => Outbound::Edit {
                chat_id: sender_id,
                message_id: *message_id,
                reply,
            },
            _ => Outbound::Send {
                chat_id: sender_id,
                reply,
            },
        }
    }

    // ---- free text ----

    async fn on_text(
        &self,
        sender_id: UserId,
        text: &str,
        timestamp: Timestamp,
        display_name: &str,
    ) -> BotResult<Reply> {
        if is_start_command(text) {
            return self.start(sender_id, timestamp).await;
        }

        let user = self.require_user(sender_id).await?;
        tracing::debug!(user_id = sender_id, position = %user.position, "Free text received");

        match user.position {
            Position::AwaitingInput(InputKind::CompanyField(field)) => {
                self.save_company_field(user, field, text).await
            }
            Position::AwaitingInput(InputKind::NewTicket) => {
                self.create_ticket(&user, text, timestamp, display_name)
                    .await
            }
            Position::AwaitingInput(InputKind::ResolverComment(number)) => {
                self.require_operator(sender_id, &user.position)?;
                self.save_comment(number, text).await
            }
            Position::Screen(_) => Ok(screens::free_text_hint(self.is_operator(sender_id))),
        }
    }

    /// Register on first contact, otherwise reset to the main menu.
    async fn start(&self, sender_id: UserId, timestamp: Timestamp) -> BotResult<Reply> {
        if self.store.find_user(sender_id).await?.is_none() {
            let new_user = NewUser::first_contact(sender_id, timestamp);
            match self.store.insert_user(&new_user).await {
                Ok(user) => {
                    let (open, closed) = self.user_counters(sender_id).await?;
                    return Ok(screens::welcome(
                        &user.profile,
                        open,
                        closed,
                        self.is_operator(sender_id),
                    ));
                }
                // A concurrent /start registered the user first.
                Err(StoreError::DuplicateKey(_)) => {
                    tracing::debug!(user_id = sender_id, "User registered concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.store.set_position(sender_id, Position::MAIN_MENU).await?;
        let user = self.require_user(sender_id).await?;
        self.render(&user, Position::MAIN_MENU).await
    }

    async fn save_company_field(
        &self,
        mut user: User,
        field: CompanyField,
        text: &str,
    ) -> BotResult<Reply> {
        let profile_field = field.profile_field();
        self.store
            .set_profile_field(user.id, profile_field, text)
            .await?;
        user.profile.set(profile_field, text);
        tracing::info!(user_id = user.id, field = profile_field.key(), "Profile field updated");
        Ok(screens::company(&user.profile))
    }

    async fn create_ticket(
        &self,
        user: &User,
        text: &str,
        timestamp: Timestamp,
        display_name: &str,
    ) -> BotResult<Reply> {
        let ticket = self
            .store
            .create_ticket(&NewTicket {
                owner_id: user.id,
                organization: user.profile.get(ProfileField::Organization).to_string(),
                address: user.profile.get(ProfileField::Address).to_string(),
                message: text.to_string(),
                created_at: timestamp,
            })
            .await?;

        self.store
            .record_latest_ticket(user.id, ticket.number, ticket.created_at, display_name)
            .await?;
        self.store.set_position(user.id, Position::MAIN_MENU).await?;

        self.bus.publish(HelpdeskEvent::TicketCreated {
            number: ticket.number,
            owner_id: user.id,
            user_name: display_name.to_string(),
            message: ticket.message.clone(),
            phone: user.profile.get(ProfileField::Phone).to_string(),
            organization: ticket.organization.clone(),
            address: ticket.address.clone(),
            created_at: ticket.created_at,
        });

        Ok(screens::ticket_created(ticket.number))
    }

    async fn save_comment(&self, number: TicketNumber, text: &str) -> BotResult<Reply> {
        match self.store.set_ticket_comment(number, text).await? {
            Some(ticket) => {
                tracing::info!(ticket_number = number, "Resolver comment saved");
                Ok(screens::comment_saved(&ticket))
            }
            None => {
                self.require_ticket(number).await?;
                Ok(screens::already_resolved(number))
            }
        }
    }

    // ---- button presses ----

    async fn on_action(&self, sender_id: UserId, action_id: &str) -> BotResult<Reply> {
        let action: Action = action_id.parse()?;
        let user = self.require_user(sender_id).await?;
        tracing::debug!(user_id = sender_id, %action, "Action selected");

        match action {
            Action::Navigate(target) => self.navigate(&user, target).await,
            Action::Complete(number) => self.resolve(&user, number).await,
        }
    }

    /// Move to `target` and render it. Any screen is reachable from any
    /// screen; operator-only targets are the one exception.
    async fn navigate(&self, user: &User, target: Position) -> BotResult<Reply> {
        if target.requires_operator() && !self.is_operator(user.id) {
            tracing::info!(user_id = user.id, position = %target, "Operator screen denied");
            return Ok(screens::access_denied());
        }

        let reply = self.render(user, target).await?;
        self.store.set_position(user.id, target).await?;
        Ok(reply)
    }

    /// Take the resolution edge and publish it. A ticket that is already
    /// resolved gets a note and no event.
    async fn resolve(&self, user: &User, number: TicketNumber) -> BotResult<Reply> {
        self.require_operator(user.id, &Action::Complete(number))?;

        let now = Utc::now();
        let Some(ticket) = self.store.resolve_ticket(number, now).await? else {
            self.require_ticket(number).await?;
            tracing::info!(ticket_number = number, "Ticket already resolved");
            return Ok(screens::already_resolved(number));
        };

        let elapsed_hours = elapsed_whole_hours(ticket.created_at, ticket.resolved_at.unwrap_or(now));
        self.store
            .set_position(user.id, Position::Screen(Screen::AdminPanel))
            .await?;

        self.bus.publish(HelpdeskEvent::TicketResolved {
            number,
            owner_id: ticket.owner_id,
            resolver_id: user.id,
            elapsed_hours,
            comment: ticket.resolver_comment.clone(),
        });

        Ok(screens::ticket_resolved(
            number,
            elapsed_hours,
            ticket.resolver_comment.as_deref(),
        ))
    }

    // ---- rendering ----

    /// Load what `position` needs and render it.
    async fn render(&self, user: &User, position: Position) -> BotResult<Reply> {
        let reply = match position {
            Position::Screen(Screen::MainMenu) => {
                let (open, closed) = self.user_counters(user.id).await?;
                screens::main_menu(&user.profile, open, closed, self.is_operator(user.id))
            }
            Position::Screen(Screen::MyCompany) => screens::company(&user.profile),
            Position::Screen(Screen::MyTickets) => {
                let open = self
                    .store
                    .list_user_tickets_by_status(user.id, TicketStatus::InProgress)
                    .await?;
                screens::my_tickets(&user.profile, &open)
            }
            Position::Screen(Screen::TicketHistory { page }) => {
                let total = self.store.count_user_tickets(user.id).await?;
                let last_index = Page::new(0, HISTORY_PAGE_SIZE, total).page_count() - 1;
                let index = u32::try_from(i64::from(page).min(last_index)).unwrap_or(0);
                let page = Page::new(index, HISTORY_PAGE_SIZE, total);
                let tickets = self
                    .store
                    .list_user_tickets_page(user.id, page.size, page.offset())
                    .await?;
                screens::ticket_history(&tickets, page)
            }
            Position::Screen(Screen::AdminPanel) => {
                let open_total = self
                    .store
                    .count_tickets_by_status(TicketStatus::InProgress)
                    .await?;
                let resolved_total = self
                    .store
                    .count_tickets_by_status(TicketStatus::Resolved)
                    .await?;
                let open = self
                    .store
                    .list_tickets_by_status(TicketStatus::InProgress, ADMIN_PANEL_LIMIT)
                    .await?;
                screens::admin_panel(open_total, resolved_total, &open)
            }
            Position::AwaitingInput(InputKind::CompanyField(field)) => screens::edit_prompt(field),
            Position::AwaitingInput(InputKind::NewTicket) => screens::new_ticket_prompt(),
            Position::AwaitingInput(InputKind::ResolverComment(number)) => {
                let ticket = self.require_ticket(number).await?;
                screens::ticket_details(&ticket)
            }
        };
        Ok(reply)
    }

    // ---- helpers ----

    async fn require_user(&self, id: UserId) -> BotResult<User> {
        self.store.find_user(id).await?.ok_or(BotError::Core(CoreError::NotFound {
            entity: USER_ENTITY,
            id,
        }))
    }

    async fn require_ticket(&self, number: TicketNumber) -> BotResult<Ticket> {
        self.store
            .find_ticket(number)
            .await?
            .ok_or(BotError::Core(CoreError::NotFound {
                entity: "ticket",
                id: number,
            }))
    }

    fn require_operator(&self, user_id: UserId, what: &dyn std::fmt::Display) -> BotResult<()> {
        if self.is_operator(user_id) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("{what} requires the operator role")).into())
        }
    }

    async fn user_counters(&self, user_id: UserId) -> BotResult<(i64, i64)> {
        let open = self
            .store
            .count_user_tickets_by_status(user_id, TicketStatus::InProgress)
            .await?;
        let closed = self
            .store
            .count_user_tickets_by_status(user_id, TicketStatus::Resolved)
            .await?;
        Ok((open, closed))
    }
}

/// `/start`, optionally followed by a deep-link payload.
fn is_start_command(text: &str) -> bool {
    let mut words = text.split_whitespace();
    matches!(words.next(), Some(cmd) if cmd == START_COMMAND || cmd.starts_with("/start@"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
