//! Notification routing from the event bus to the transport.

mod common;

use std::sync::Arc;

use chrono::Utc;
use helpdesk_bot::notifications::NotificationRouter;
use helpdesk_bot::runtime::process_event;
use helpdesk_core::position::{InputKind, Position};
use helpdesk_core::transport::{InboundEvent, Outbound};
use helpdesk_events::HelpdeskEvent;

use common::{Harness, RecordingTransport, OPERATOR, USER};

// ---------------------------------------------------------------------------
// Test: Owner is told about the resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_receives_resolution_once() {
    let mut h = Harness::new();
    h.text(USER, "/start").await;
    h.text(OPERATOR, "/start").await;
    h.seed_open_ticket(7, USER, 3);
    h.navigate(OPERATOR, Position::AwaitingInput(InputKind::ResolverComment(7)))
        .await;
    h.text(OPERATOR, "Replaced cable").await;
    h.drain_events();

    h.press(OPERATOR, "complete_7").await;
    h.press(OPERATOR, "complete_7").await;

    let transport = Arc::new(RecordingTransport::default());
    let router = NotificationRouter::new(transport.clone(), vec![OPERATOR]);
    for event in h.drain_events() {
        router.route_event(&event).await;
    }

    let to_owner = transport.sent_to(USER);
    assert_eq!(to_owner.len(), 1);
    let text = &to_owner[0].reply().text;
    assert!(text.contains("3 hours"));
    assert!(text.contains("Replaced cable"));

    // The resolver already got the confirmation as the direct reply.
    assert!(transport.sent_to(OPERATOR).is_empty());
}

// ---------------------------------------------------------------------------
// Test: Operators are told about new tickets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn router_loop_delivers_until_bus_closes() {
    let h = Harness::new();
    let transport = Arc::new(RecordingTransport::default());
    let router = NotificationRouter::new(transport.clone(), vec![OPERATOR, 2]);
    let receiver = h.bus.subscribe();

    h.bus.publish(HelpdeskEvent::TicketCreated {
        number: 12,
        owner_id: USER,
        user_name: "@anna".to_string(),
        message: "Printer <broken>".to_string(),
        phone: "+79109998188".to_string(),
        organization: "Acme".to_string(),
        address: "Main st. 1".to_string(),
        created_at: Utc::now(),
    });

    // The dispatcher holds the other bus handle; dropping both closes the loop.
    drop(h);
    router.run(receiver).await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    for message in &sent {
        let text = &message.reply().text;
        assert!(text.contains("<code>12</code>"));
        assert!(text.contains("Printer &lt;broken&gt;"));
        assert!(text.contains("+79109998188"));
        assert!(message
            .reply()
            .offers(InputKind::ResolverComment(12).into()));
    }
    assert_eq!(sent[0].chat_id(), OPERATOR);
    assert_eq!(sent[1].chat_id(), 2);
}

// ---------------------------------------------------------------------------
// Test: Per-update processing acknowledges and replies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_event_acknowledges_and_replies() {
    let h = Harness::new();
    h.text(USER, "/start").await;
    let transport = RecordingTransport::default();

    process_event(
        &h.dispatcher,
        &transport,
        InboundEvent::ActionSelected {
            sender_id: USER,
            action_id: "my_company".to_string(),
            message_id: Some(77),
            callback_id: Some("cb-1".to_string()),
        },
    )
    .await;

    assert_eq!(transport.acknowledged(), vec!["cb-1".to_string()]);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0],
        Outbound::Edit { chat_id, message_id: 77, .. } if *chat_id == USER
    ));
    assert!(sent[0].reply().text.contains("Company details"));
}
