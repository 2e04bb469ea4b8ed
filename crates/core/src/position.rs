//! Per-user conversation state and the structured actions that move it.
//!
//! A [`Position`] is either a plain navigation [`Screen`] or an
//! [`InputKind`] telling the dispatcher how to interpret the next free-text
//! message. It is stored as text (`main_menu`, `ticket_details_7`, ...) and
//! decoded once at the storage boundary.
//!
//! An [`Action`] is what a pressed button carries. Every position doubles as
//! a navigation action; `complete_<n>` is the only action that is not a
//! position.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::profile::CompanyField;
use crate::types::TicketNumber;

const TICKET_HISTORY_PREFIX: &str = "ticket_history_";
const TICKET_DETAILS_PREFIX: &str = "ticket_details_";
const COMPLETE_PREFIX: &str = "complete_";

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// Navigation states that do not expect a free-text reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    MyCompany,
    MyTickets,
    /// Zero-based page of the user's ticket history.
    TicketHistory { page: u32 },
    AdminPanel,
}

// ---------------------------------------------------------------------------
// InputKind
// ---------------------------------------------------------------------------

/// States in which the next free-text message is consumed as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// One of the four company fields.
    CompanyField(CompanyField),
    /// The problem description of a new ticket.
    NewTicket,
    /// An operator comment on the given ticket.
    ResolverComment(TicketNumber),
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Where a user currently is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Screen(Screen),
    AwaitingInput(InputKind),
}

impl Position {
    pub const MAIN_MENU: Position = Position::Screen(Screen::MainMenu);

    /// Whether only operators may enter this position.
    pub fn requires_operator(&self) -> bool {
        matches!(
            self,
            Position::Screen(Screen::AdminPanel)
                | Position::AwaitingInput(InputKind::ResolverComment(_))
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Screen(Screen::MainMenu) => f.write_str("main_menu"),
            Position::Screen(Screen::MyCompany) => f.write_str("my_company"),
            Position::Screen(Screen::MyTickets) => f.write_str("my_ticket"),
            Position::Screen(Screen::TicketHistory { page }) => {
                write!(f, "{TICKET_HISTORY_PREFIX}{page}")
            }
            Position::Screen(Screen::AdminPanel) => f.write_str("admin_panel"),
            Position::AwaitingInput(InputKind::CompanyField(field)) => {
                f.write_str(edit_tag(*field))
            }
            Position::AwaitingInput(InputKind::NewTicket) => f.write_str("new_ticket"),
            Position::AwaitingInput(InputKind::ResolverComment(number)) => {
                write!(f, "{TICKET_DETAILS_PREFIX}{number}")
            }
        }
    }
}

impl FromStr for Position {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let position = match s {
            "main_menu" => Position::Screen(Screen::MainMenu),
            "my_company" => Position::Screen(Screen::MyCompany),
            "my_ticket" => Position::Screen(Screen::MyTickets),
            "admin_panel" => Position::Screen(Screen::AdminPanel),
            "new_ticket" => Position::AwaitingInput(InputKind::NewTicket),
            "edit_company_name" => company_field(CompanyField::Name),
            "edit_company_adress" => company_field(CompanyField::Address),
            "edit_company_inn" => company_field(CompanyField::Inn),
            "edit_company_phone" => company_field(CompanyField::Phone),
            other => {
                if let Some(page) = other.strip_prefix(TICKET_HISTORY_PREFIX) {
                    Position::Screen(Screen::TicketHistory {
                        page: parse_suffix(other, page)?,
                    })
                } else if let Some(number) = other.strip_prefix(TICKET_DETAILS_PREFIX) {
                    Position::AwaitingInput(InputKind::ResolverComment(parse_suffix(
                        other, number,
                    )?))
                } else {
                    return Err(CoreError::InvalidArgument(format!(
                        "Unknown position '{other}'"
                    )));
                }
            }
        };
        Ok(position)
    }
}

fn company_field(field: CompanyField) -> Position {
    Position::AwaitingInput(InputKind::CompanyField(field))
}

fn edit_tag(field: CompanyField) -> &'static str {
    match field {
        CompanyField::Name => "edit_company_name",
        CompanyField::Address => "edit_company_adress",
        CompanyField::Inn => "edit_company_inn",
        CompanyField::Phone => "edit_company_phone",
    }
}

/// Parse the numeric suffix of a parameterized tag. Signs, spaces and
/// anything else that is not a plain digit run are rejected.
fn parse_suffix<T: FromStr>(tag: &str, suffix: &str) -> Result<T, CoreError> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidArgument(format!(
            "Malformed id in '{tag}': expected digits, got '{suffix}'"
        )));
    }
    suffix.parse().map_err(|_| {
        CoreError::InvalidArgument(format!("Id in '{tag}' is out of range"))
    })
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A structured selection carried by a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move to a position and render it.
    Navigate(Position),
    /// Mark a ticket resolved.
    Complete(TicketNumber),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Navigate(position) => position.fmt(f),
            Action::Complete(number) => write!(f, "{COMPLETE_PREFIX}{number}"),
        }
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(COMPLETE_PREFIX) {
            Some(number) => Ok(Action::Complete(parse_suffix(s, number)?)),
            None => s.parse().map(Action::Navigate),
        }
    }
}

impl From<Position> for Action {
    fn from(position: Position) -> Self {
        Action::Navigate(position)
    }
}

impl From<Screen> for Action {
    fn from(screen: Screen) -> Self {
        Action::Navigate(Position::Screen(screen))
    }
}

impl From<InputKind> for Action {
    fn from(kind: InputKind) -> Self {
        Action::Navigate(Position::AwaitingInput(kind))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
