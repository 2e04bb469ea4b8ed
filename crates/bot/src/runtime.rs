//! Telegram long-polling loop.
//!
//! Fetches updates with an advancing offset and handles each one in its own
//! task, so a slow store call for one user never blocks another. On a
//! polling failure the loop waits [`RECONNECT_DELAY`] and retries.

use std::sync::Arc;
use std::time::Duration;

use helpdesk_core::transport::{ChatTransport, InboundEvent};
use helpdesk_telegram::TelegramApi;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::dispatcher::Dispatcher;

/// Delay before polling again after a failed `getUpdates`.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Acknowledge, dispatch and deliver the reply for one event.
pub async fn process_event(dispatcher: &Dispatcher, transport: &dyn ChatTransport, event: InboundEvent) {
    if let InboundEvent::ActionSelected {
        callback_id: Some(callback_id),
        ..
    } = &event
    {
        if let Err(e) = transport.acknowledge(callback_id).await {
            tracing::warn!(error = %e, "Failed to acknowledge button press");
        }
    }

    let outbound = dispatcher.handle(&event).await;
    if let Err(e) = transport.send(&outbound).await {
        tracing::error!(chat_id = outbound.chat_id(), error = %e, "Failed to deliver reply");
    }
}

/// Offset just past the newest pending update, so a restart does not
/// replay messages that arrived while the bot was down.
pub async fn skip_pending_updates(api: &TelegramApi) -> i64 {
    match api.get_updates(-1, 0).await {
        Ok(updates) => match updates.last() {
            Some(update) => {
                tracing::info!(update_id = update.update_id, "Skipping pending updates");
                update.update_id + 1
            }
            None => 0,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not skip pending updates");
            0
        }
    }
}

/// Poll until `cancel` fires, then wait for in-flight handlers.
pub async fn run(
    api: Arc<TelegramApi>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout_secs: u64,
    cancel: CancellationToken,
) {
    let tracker = TaskTracker::new();
    let mut offset = skip_pending_updates(&api).await;
    tracing::info!(offset, poll_timeout_secs, "Polling for updates");

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.get_updates(offset, poll_timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(event) = update.into_inbound() else {
                        continue;
                    };
                    let api = Arc::clone(&api);
                    let dispatcher = Arc::clone(&dispatcher);
                    tracker.spawn(async move {
                        process_event(&dispatcher, api.as_ref(), event).await;
                    });
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Polling for updates failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }

    tracker.close();
    tracing::info!(in_flight = tracker.len(), "Polling stopped, draining handlers");
    tracker.wait().await;
}
