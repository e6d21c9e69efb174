use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::tracker::{BucketKey, TrackerController};
use crate::transport::MessageSink;

use super::{plan_next_fire, SummaryOffset};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Run one summary tick at `offset` past every UTC hour until cancelled.
///
/// Each wait is computed from the wall clock, so a tick that was missed
/// (process suspended, clock jump) is dropped rather than replayed, and the
/// loop awaits each tick before scheduling the next one. A tick reports the
/// bucket of its slot even when it runs after the hour has turned.
pub async fn summary_loop(
    controller: TrackerController,
    sink: Arc<dyn MessageSink>,
    offset: SummaryOffset,
    cancel_token: CancellationToken,
) {
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let fire_at = plan_next_fire(now, last_fired, offset);
        let wait = (fire_at - now).to_std().unwrap_or_default();

        log_info!("next summary at {}", fire_at.format("%Y-%m-%d %H:%M:%S UTC"));

        tokio::select! {
            _ = sleep(wait) => {
                let key = BucketKey::from_timestamp(fire_at);
                controller.summary_tick(sink.as_ref(), key, Utc::now()).await;
                last_fired = Some(fire_at);
            }
            _ = cancel_token.cancelled() => {
                log_info!("summary loop shutting down");
                break;
            }
        }
    }
}
