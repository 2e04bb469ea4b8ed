//! Pure screen renderers.
//!
//! Every function maps already-loaded state to a [`Reply`]; none of them
//! touch the store. User-supplied text is escaped and clipped with
//! [`escape_clipped`] before it is embedded in markup, so a rendered screen
//! stays under Telegram's 4096-character message limit.

use helpdesk_core::pagination::Page;
use helpdesk_core::position::{Action, InputKind, Position, Screen};
use helpdesk_core::profile::{CompanyField, Profile, ProfileField};
use helpdesk_core::transport::Reply;
use helpdesk_core::types::{TicketNumber, Timestamp};
use helpdesk_db::models::ticket::Ticket;

const BACK_TO_MENU: &str = "⬅️ Main menu";
const BACK_TO_COMPANY: &str = "⬅️ Back";
const BACK_TO_PANEL: &str = "⬅️ Operator panel";
const MARK_RESOLVED: &str = "✅ Mark resolved";

/// Escaped characters allowed for a ticket message.
pub const MESSAGE_BUDGET: usize = 2500;
/// Escaped characters allowed for a resolver comment.
pub const COMMENT_BUDGET: usize = 500;
/// Escaped characters allowed for a profile value or user name.
pub const FIELD_BUDGET: usize = 256;
/// Escaped characters allowed for a message preview in a list.
pub const PREVIEW_BUDGET: usize = 200;
/// Characters allowed for user text inside a button label.
const LABEL_BUDGET: usize = 40;
/// Tickets listed individually on the "my tickets" screen.
const MY_TICKETS_LISTED: usize = 10;

fn html_entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        _ => None,
    }
}

fn escaped_width(c: char) -> usize {
    html_entity(c).map_or(1, str::len)
}

/// Escape the characters the Telegram HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match html_entity(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    escaped
}

/// Escape `text` and cut it to at most `budget` output characters. A cut
/// ends with "…" and never splits an entity.
pub fn escape_clipped(text: &str, budget: usize) -> String {
    let total: usize = text.chars().map(escaped_width).sum();
    if total <= budget {
        return escape_html(text);
    }

    let limit = budget.saturating_sub(1);
    let mut escaped = String::new();
    let mut used = 0;
    for c in text.chars() {
        let width = escaped_width(c);
        if used + width > limit {
            break;
        }
        used += width;
        match html_entity(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    escaped.push('…');
    escaped
}

/// Plain-text cut for button labels.
fn clip_label(text: &str) -> String {
    if text.chars().count() <= LABEL_BUDGET {
        return text.to_string();
    }
    let mut label: String = text.chars().take(LABEL_BUDGET - 1).collect();
    label.push('…');
    label
}

fn clip_field(value: &str) -> String {
    escape_clipped(value, FIELD_BUDGET)
}

fn format_time(at: Timestamp) -> String {
    at.format("%d.%m.%Y %H:%M UTC").to_string()
}

/// "1 hour", "3 hours", "0 hours".
pub fn hours_label(hours: i64) -> String {
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{hours} hours")
    }
}

fn comment_text(comment: Option<&str>) -> String {
    match comment {
        Some(c) if !c.trim().is_empty() => escape_clipped(c, COMMENT_BUDGET),
        _ => "<i>no comment</i>".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Main menu
// ---------------------------------------------------------------------------

fn with_main_menu_choices(reply: Reply, is_operator: bool) -> Reply {
    let reply = reply
        .with_choice("🏢 My company", Screen::MyCompany)
        .with_choice("📥 My tickets", Screen::MyTickets)
        .with_choice("📤 New ticket", InputKind::NewTicket);
    if is_operator {
        reply.with_choice("🛡 Operator panel", Screen::AdminPanel)
    } else {
        reply
    }
}

fn main_menu_text(profile: &Profile, open: i64, closed: i64) -> String {
    format!(
        "<b>🧑‍💻 Main menu</b>\n\n\
         <b>📋 Company:</b> {}\n\
         <b>☎️ Contact phone:</b> {}\n\n\
         <b>📬 Open tickets:</b> {open}\n\
         <b>📭 Closed tickets:</b> {closed}\n\n\
         Choose an action ⬇️",
        clip_field(profile.get(ProfileField::Organization)),
        clip_field(profile.get(ProfileField::Phone)),
    )
}

pub fn main_menu(profile: &Profile, open: i64, closed: i64, is_operator: bool) -> Reply {
    with_main_menu_choices(Reply::new(main_menu_text(profile, open, closed)), is_operator)
}

/// First-contact greeting followed by the main menu.
pub fn welcome(profile: &Profile, open: i64, closed: i64, is_operator: bool) -> Reply {
    let text = format!(
        "Welcome to the <b>AnyKey</b> help desk! \
         Please fill in your company details to get started.\n\n{}",
        main_menu_text(profile, open, closed)
    );
    with_main_menu_choices(Reply::new(text), is_operator)
}

/// Reply to free text sent while no input is expected.
pub fn free_text_hint(is_operator: bool) -> Reply {
    with_main_menu_choices(
        Reply::new("🤖 Please use the buttons below to choose an action."),
        is_operator,
    )
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

fn company_label(field: CompanyField) -> &'static str {
    match field {
        CompanyField::Name => "Company name",
        CompanyField::Address => "Street address",
        CompanyField::Inn => "INN",
        CompanyField::Phone => "Contact phone",
    }
}

pub fn company(profile: &Profile) -> Reply {
    let text = format!(
        "<b>Company details:</b>\n\n\
         <b>🏢 Organization:</b> <i>{}</i>\n\
         <b>📍 Address:</b> <i>{}</i>\n\
         <b>📑 INN:</b> <i>{}</i>\n\
         <b>☎️ Contact phone:</b> <i>{}</i>\n\n\
         <b>FILL IN COMPANY DETAILS ⬇️</b>",
        clip_field(profile.get(ProfileField::Organization)),
        clip_field(profile.get(ProfileField::Address)),
        clip_field(profile.get(ProfileField::Inn)),
        clip_field(profile.get(ProfileField::Phone)),
    );

    let mut reply = Reply::new(text);
    for field in CompanyField::ALL {
        let glyph = if profile.is_filled(field.profile_field()) {
            "✅"
        } else {
            "❌"
        };
        reply = reply.with_choice(
            format!("{glyph} {}", company_label(field)),
            InputKind::CompanyField(field),
        );
    }
    reply.with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn edit_prompt(field: CompanyField) -> Reply {
    let text = match field {
        CompanyField::Name => {
            "🏢 Enter the organization name.\nExample: <code>Horns &amp; Hooves LLC</code>"
        }
        CompanyField::Address => {
            "📍 Enter the street address of the organization.\n\
             Example: <code>33 Varentsova St., office 1, Ivanovo</code>"
        }
        CompanyField::Inn => "📑 Enter the organization INN.\nExample: <code>3700010101</code>",
        CompanyField::Phone => {
            "☎️ Enter a contact phone number.\nExample: <code>+79109998188</code>"
        }
    };
    Reply::new(text).with_choice(BACK_TO_COMPANY, Screen::MyCompany)
}

// ---------------------------------------------------------------------------
// Tickets (owner side)
// ---------------------------------------------------------------------------

pub fn new_ticket_prompt() -> Reply {
    Reply::new(
        "<b>📤 New ticket</b>\n\n\
         Describe the problem in a single message.\n\
         Example: <i>The printer on PC 4 does not work, please check the connection</i>",
    )
    .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn ticket_created(number: TicketNumber) -> Reply {
    Reply::new(format!(
        "Success, your ticket has been registered!\nTicket number <code>{number}</code>."
    ))
    .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

/// In-progress tickets of one user.
pub fn my_tickets(profile: &Profile, open: &[Ticket]) -> Reply {
    let text = if open.is_empty() {
        "You have no tickets in progress.".to_string()
    } else {
        let mut text = format!(
            "<b>My tickets 📥</b>\n\n\
             <b>Company:</b> {}\n\
             <b>Address:</b> {}\n\
             <b>Tickets in progress:</b> {}\n\n",
            clip_field(profile.get(ProfileField::Organization)),
            clip_field(profile.get(ProfileField::Address)),
            open.len(),
        );
        for ticket in open.iter().take(MY_TICKETS_LISTED) {
            text.push_str(&format!(
                "<b>Ticket number:</b> {}\n<b>Description:</b> {}\n\n",
                ticket.number,
                escape_clipped(&ticket.message, PREVIEW_BUDGET),
            ));
        }
        if open.len() > MY_TICKETS_LISTED {
            text.push_str(&format!(
                "…and {} more in the ticket history.",
                open.len() - MY_TICKETS_LISTED
            ));
        }
        text.trim_end().to_string()
    };

    Reply::new(text)
        .with_choice("🗂 Ticket history", Screen::TicketHistory { page: 0 })
        .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

/// One page of a user's tickets of any status.
pub fn ticket_history(tickets: &[Ticket], page: Page) -> Reply {
    let mut text = String::from("<b>🗂 Ticket history</b>\n\n");
    if page.total == 0 {
        text.push_str("You have not filed any tickets yet.");
    } else {
        for ticket in tickets {
            text.push_str(&format!(
                "<b>#{}</b> · {} · {}\n{}\n\n",
                ticket.number,
                ticket.status.label(),
                format_time(ticket.created_at),
                escape_clipped(&ticket.message, PREVIEW_BUDGET),
            ));
        }
        text.push_str(&format!(
            "Page {} of {}",
            i64::from(page.index) + 1,
            page.page_count()
        ));
    }

    let mut reply = Reply::new(text);
    if page.has_previous() {
        reply = reply.with_choice(
            "◀️ Previous",
            Screen::TicketHistory {
                page: page.index - 1,
            },
        );
    }
    if page.has_next() {
        reply = reply.with_choice(
            "Next ▶️",
            Screen::TicketHistory {
                page: page.index + 1,
            },
        );
    }
    reply
        .with_choice("📥 My tickets", Screen::MyTickets)
        .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

// ---------------------------------------------------------------------------
// Operator side
// ---------------------------------------------------------------------------

/// Global counters plus one choice per listed open ticket.
pub fn admin_panel(open_total: i64, resolved_total: i64, open: &[Ticket]) -> Reply {
    let mut text = format!(
        "<b>🛡 Operator panel</b>\n\n\
         <b>🛠 In progress:</b> {open_total}\n\
         <b>✅ Resolved:</b> {resolved_total}\n\n"
    );
    if open.is_empty() {
        text.push_str("No open tickets.");
    } else {
        text.push_str("Open tickets ⬇️");
        let listed = open.len() as i64;
        if open_total > listed {
            text.push_str(&format!("\nShowing the oldest {listed} of {open_total}."));
        }
    }

    let mut reply = Reply::new(text);
    for ticket in open {
        reply = reply.with_choice(
            format!("#{} · {}", ticket.number, clip_label(&ticket.organization)),
            InputKind::ResolverComment(ticket.number),
        );
    }
    reply.with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn ticket_details(ticket: &Ticket) -> Reply {
    let mut text = format!(
        "<b>📝 Ticket #{}</b>\n\n\
         <b>Owner:</b> <code>{}</code>\n\
         <b>Organization:</b> {}\n\
         <b>Address:</b> {}\n\
         <b>Created:</b> {}\n\
         <b>Status:</b> {}\n\
         <b>Comment:</b> {}\n\n\
         <b>Message:</b>\n{}",
        ticket.number,
        ticket.owner_id,
        clip_field(&ticket.organization),
        clip_field(&ticket.address),
        format_time(ticket.created_at),
        ticket.status.label(),
        comment_text(ticket.resolver_comment.as_deref()),
        escape_clipped(&ticket.message, MESSAGE_BUDGET),
    );

    let reply = if ticket.is_open() {
        text.push_str("\n\n💬 Send a message to set the resolver comment.");
        Reply::new(text).with_choice(MARK_RESOLVED, Action::Complete(ticket.number))
    } else {
        Reply::new(text)
    };
    reply.with_choice(BACK_TO_PANEL, Screen::AdminPanel)
}

pub fn comment_saved(ticket: &Ticket) -> Reply {
    Reply::new(format!(
        "💬 Comment for ticket #{} saved:\n<i>{}</i>\n\n\
         Send another message to replace it, or mark the ticket resolved.",
        ticket.number,
        comment_text(ticket.resolver_comment.as_deref()),
    ))
    .with_choice(MARK_RESOLVED, Action::Complete(ticket.number))
    .with_choice(BACK_TO_PANEL, Screen::AdminPanel)
}

/// Confirmation for the operator who took the resolution edge.
pub fn ticket_resolved(number: TicketNumber, elapsed_hours: i64, comment: Option<&str>) -> Reply {
    Reply::new(format!(
        "✅ Ticket #{number} marked resolved.\n\n\
         <b>Time to resolve:</b> {}\n\
         <b>Comment:</b> {}",
        hours_label(elapsed_hours),
        comment_text(comment),
    ))
    .with_choice(BACK_TO_PANEL, Screen::AdminPanel)
}

pub fn already_resolved(number: TicketNumber) -> Reply {
    Reply::new(format!("ℹ️ Ticket #{number} is already resolved."))
        .with_choice(BACK_TO_PANEL, Screen::AdminPanel)
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Operator notice for a newly filed ticket.
pub fn ticket_created_notice(
    number: TicketNumber,
    user_name: &str,
    message: &str,
    phone: &str,
    organization: &str,
    address: &str,
) -> Reply {
    Reply::new(format!(
        "❗️ User {} filed a new ticket <code>{number}</code>.\n\n\
         <b>Message:</b>\n - {}\n\n\
         <b>Phone:</b> {}\n\
         <b>Company:</b> {}\n\
         <b>Address:</b> {}",
        clip_field(user_name),
        escape_clipped(message, MESSAGE_BUDGET),
        clip_field(phone),
        clip_field(organization),
        clip_field(address),
    ))
    .with_choice("📝 Open ticket", InputKind::ResolverComment(number))
}

/// Owner and operator notice for a resolved ticket.
pub fn ticket_resolved_notice(
    number: TicketNumber,
    elapsed_hours: i64,
    comment: Option<&str>,
) -> Reply {
    Reply::new(format!(
        "✅ Ticket <code>{number}</code> has been resolved.\n\n\
         <b>Time to resolve:</b> {}\n\
         <b>Resolver comment:</b> {}",
        hours_label(elapsed_hours),
        comment_text(comment),
    ))
    .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

pub fn access_denied() -> Reply {
    Reply::new("⛔️ This section is available to operators only.")
        .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn not_found(entity: &str, id: i64) -> Reply {
    let text = match entity {
        "ticket" => format!("🔍 Ticket #{id} was not found."),
        other => format!("🔍 No {other} with id {id} was found."),
    };
    Reply::new(text).with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn invalid_input(detail: &str) -> Reply {
    Reply::new(format!(
        "⚠️ The request could not be processed:\n<code>{}</code>",
        clip_field(detail)
    ))
    .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn generic_failure() -> Reply {
    Reply::new("😔 Sorry, something went wrong on our side. Please try again later.")
        .with_choice(BACK_TO_MENU, Position::MAIN_MENU)
}

pub fn unknown_user() -> Reply {
    Reply::new("👋 Please send /start to begin.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use helpdesk_core::ticket::TicketStatus;

    use super::*;

    fn ticket(number: TicketNumber, status: TicketStatus) -> Ticket {
        Ticket {
            number,
            owner_id: 1001,
            organization: "Acme".to_string(),
            address: "Main st. 1".to_string(),
            message: "Printer <broken>".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            status,
            resolver_comment: None,
            resolved_at: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main menu
    // -----------------------------------------------------------------------

    #[test]
    fn main_menu_renders_zero_counters() {
        let reply = main_menu(&Profile::default(), 0, 0, false);
        assert!(reply.text.contains("<b>📬 Open tickets:</b> 0"));
        assert!(reply.text.contains("<b>📭 Closed tickets:</b> 0"));
        assert!(reply.text.contains("no data"));
        assert_eq!(reply.choices.len(), 3);
        assert!(!reply.offers(Screen::AdminPanel.into()));
    }

    #[test]
    fn operators_see_panel_choice() {
        let reply = main_menu(&Profile::default(), 2, 1, true);
        assert!(reply.offers(Screen::AdminPanel.into()));
    }

    // -----------------------------------------------------------------------
    // Company
    // -----------------------------------------------------------------------

    #[test]
    fn company_glyphs_follow_sentinels() {
        let mut profile = Profile::default();
        profile.set(ProfileField::Inn, "3700010101");
        let reply = company(&profile);

        assert!(reply.text.contains("3700010101"));
        let labels: Vec<_> = reply.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "❌ Company name",
                "❌ Street address",
                "✅ INN",
                "❌ Contact phone",
                BACK_TO_MENU
            ]
        );
    }

    #[test]
    fn company_escapes_user_text() {
        let mut profile = Profile::default();
        profile.set(ProfileField::Organization, "<b>Horns & Hooves</b>");
        let reply = company(&profile);
        assert!(reply.text.contains("&lt;b&gt;Horns &amp; Hooves&lt;/b&gt;"));
    }

    // -----------------------------------------------------------------------
    // History pagination
    // -----------------------------------------------------------------------

    #[test]
    fn history_first_page_offers_only_next() {
        let tickets: Vec<_> = (1..=5).map(|n| ticket(n, TicketStatus::InProgress)).collect();
        let reply = ticket_history(&tickets, Page::new(0, 5, 7));
        assert!(reply.text.contains("Page 1 of 2"));
        assert!(reply.offers(Screen::TicketHistory { page: 1 }.into()));
        assert!(!reply.choices.iter().any(|c| c.label.contains("Previous")));
    }

    #[test]
    fn history_last_page_offers_only_previous() {
        let tickets = vec![ticket(6, TicketStatus::Resolved), ticket(7, TicketStatus::InProgress)];
        let reply = ticket_history(&tickets, Page::new(1, 5, 7));
        assert!(reply.text.contains("Page 2 of 2"));
        assert!(reply.text.contains("✅ resolved"));
        assert!(reply.offers(Screen::TicketHistory { page: 0 }.into()));
        assert!(!reply.choices.iter().any(|c| c.label.contains("Next")));
    }

    #[test]
    fn empty_history_has_no_paging() {
        let reply = ticket_history(&[], Page::new(0, 5, 0));
        assert!(reply.text.contains("not filed any tickets"));
        assert_eq!(reply.choices.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Operator screens
    // -----------------------------------------------------------------------

    #[test]
    fn admin_panel_lists_open_tickets() {
        let open = vec![ticket(3, TicketStatus::InProgress), ticket(4, TicketStatus::InProgress)];
        let reply = admin_panel(25, 9, &open);
        assert!(reply.text.contains("<b>🛠 In progress:</b> 25"));
        assert!(reply.text.contains("oldest 2 of 25"));
        assert!(reply.offers(InputKind::ResolverComment(3).into()));
        assert!(reply.offers(InputKind::ResolverComment(4).into()));
    }

    #[test]
    fn details_offer_resolution_only_while_open() {
        let open = ticket_details(&ticket(7, TicketStatus::InProgress));
        assert!(open.offers(Action::Complete(7)));
        assert!(open.text.contains("Printer &lt;broken&gt;"));

        let closed = ticket_details(&ticket(7, TicketStatus::Resolved));
        assert!(!closed.offers(Action::Complete(7)));
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    #[test]
    fn resolved_notice_carries_hours_and_comment() {
        let reply = ticket_resolved_notice(7, 3, Some("Replaced cable"));
        assert!(reply.text.contains("3 hours"));
        assert!(reply.text.contains("Replaced cable"));

        let reply = ticket_resolved_notice(7, 1, None);
        assert!(reply.text.contains("1 hour\n"));
        assert!(reply.text.contains("no comment"));
    }

    // -----------------------------------------------------------------------
    // Length limits
    // -----------------------------------------------------------------------

    const TELEGRAM_LIMIT: usize = 4096;

    fn chars(reply: &Reply) -> usize {
        reply.text.chars().count()
    }

    #[test]
    fn longest_ticket_fits_in_notice_and_details() {
        let message = "&".repeat(TELEGRAM_LIMIT);
        let long = "x".repeat(TELEGRAM_LIMIT);

        let notice = ticket_created_notice(9, &long, &message, &long, &long, &long);
        assert!(chars(&notice) <= TELEGRAM_LIMIT);
        assert!(notice.text.contains("&amp;…"));

        let mut t = ticket(9, TicketStatus::InProgress);
        t.message = message;
        t.organization = long.clone();
        t.address = long.clone();
        t.resolver_comment = Some(long);
        assert!(chars(&ticket_details(&t)) <= TELEGRAM_LIMIT);
    }

    #[test]
    fn many_long_open_tickets_fit() {
        let mut profile = Profile::default();
        profile.set(ProfileField::Organization, "o".repeat(TELEGRAM_LIMIT));
        profile.set(ProfileField::Address, "a".repeat(TELEGRAM_LIMIT));
        let open: Vec<_> = (1..=15)
            .map(|n| {
                let mut t = ticket(n, TicketStatus::InProgress);
                t.message = "m".repeat(TELEGRAM_LIMIT);
                t
            })
            .collect();

        let reply = my_tickets(&profile, &open);
        assert!(chars(&reply) <= TELEGRAM_LIMIT);
        assert!(reply.text.contains("and 5 more"));
    }

    #[test]
    fn clipping_never_splits_an_entity() {
        assert_eq!(escape_clipped("short", 10), "short");
        assert_eq!(escape_clipped("ab&cd", 5), "ab…");
        assert_eq!(escape_clipped("abcdef", 4), "abc…");
        assert_eq!(escape_clipped("<<", 9), "&lt;&lt;");
    }

    #[test]
    fn escape_html_handles_markup_characters() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
