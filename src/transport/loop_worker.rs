use std::sync::Arc;

use chrono::Utc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::tracker::TrackerController;

use super::{InboundMessage, MessageSink, TelegramClient};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const RETRY_DELAY_SECS: u64 = 5;
const STATUS_COMMAND: &str = "status";

/// Receive updates until cancelled, handling each message to completion
/// before the next one.
pub async fn poll_loop(
    client: TelegramClient,
    controller: TrackerController,
    sink: Arc<dyn MessageSink>,
    cancel_token: CancellationToken,
) {
    let mut offset: Option<i64> = None;

    loop {
        let batch = tokio::select! {
            result = client.get_updates(offset) => result,
            _ = cancel_token.cancelled() => {
                log_info!("poll loop shutting down");
                break;
            }
        };

        let updates = match batch {
            Ok(updates) => updates,
            Err(err) => {
                log_warn!("polling for updates failed: {err:#}; retrying in {RETRY_DELAY_SECS}s");
                tokio::select! {
                    _ = sleep(Duration::from_secs(RETRY_DELAY_SECS)) => continue,
                    _ = cancel_token.cancelled() => break,
                }
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Some(message) = update.into_inbound() {
                dispatch(&controller, sink.as_ref(), &message).await;
            }
        }
    }
}

/// Route one message: status queries from the watched chat get a reply,
/// everything else goes to the tracker.
pub async fn dispatch(
    controller: &TrackerController,
    sink: &dyn MessageSink,
    message: &InboundMessage,
) {
    let now = Utc::now();

    if message.is_command(STATUS_COMMAND) {
        if message.chat_id != controller.chat_id() {
            return;
        }
        let report = controller.status_report(now).await;
        if let Err(err) = sink.send_text(&report).await {
            log_error!("Failed to answer status query: {err:#}");
        }
        return;
    }

    controller.handle_message(message, now).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::controller::tests::{controller, from_target, RecordingSink, CHAT};

    #[tokio::test]
    async fn status_command_replies_without_recording() {
        let c = controller();
        let sink = RecordingSink::default();
        let query = InboundMessage {
            chat_id: CHAT,
            sender: Some("operator".into()),
            text: Some("/status".into()),
        };

        dispatch(&c, &sink, &query).await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("Current Hour Status:"));
        assert_eq!(c.bucket_count().await, 0);
    }

    #[tokio::test]
    async fn status_command_from_other_chat_is_ignored() {
        let c = controller();
        let sink = RecordingSink::default();
        let query = InboundMessage {
            chat_id: 99,
            sender: Some("operator".into()),
            text: Some("/status".into()),
        };

        dispatch(&c, &sink, &query).await;
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_status_reply_is_swallowed() {
        let c = controller();
        let query = InboundMessage {
            chat_id: CHAT,
            sender: None,
            text: Some("/status@pointwatch_bot".into()),
        };
        dispatch(&c, &RecordingSink::failing(), &query).await;
        assert_eq!(c.bucket_count().await, 0);
    }

    #[tokio::test]
    async fn ordinary_message_reaches_tracker() {
        let c = controller();
        let sink = RecordingSink::default();

        dispatch(&c, &sink, &from_target("P4 level ok")).await;

        assert_eq!(c.bucket_count().await, 1);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn cancelled_loop_returns() {
        let client = TelegramClient::with_base_url("http://127.0.0.1:9", "t", 1).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let sink: Arc<dyn MessageSink> = Arc::new(RecordingSink::default());
        tokio::time::timeout(
            Duration::from_secs(5),
            poll_loop(client, controller(), sink, token),
        )
        .await
        .unwrap();
    }
}
