use std::{collections::BTreeSet, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::{
    classifier::{Category, Classifier},
    config::AppConfig,
    transport::{InboundMessage, MessageSink},
};

use super::{BucketKey, BucketSummary, BucketTracker, ReportFormat};

/// Which chat and which sender count toward the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderFilter {
    pub chat_id: i64,
    pub sender: String,
}

impl SenderFilter {
    pub fn accepts(&self, message: &InboundMessage) -> bool {
        message.chat_id == self.chat_id && message.sender.as_deref() == Some(self.sender.as_str())
    }
}

/// Shared handle over the single tracker instance.
///
/// Message handling and the summary tick both go through the same mutex, so
/// ingest, snapshot and prune never interleave.
#[derive(Clone)]
pub struct TrackerController {
    state: Arc<Mutex<BucketTracker>>,
    classifier: Arc<Classifier>,
    filter: SenderFilter,
    format: Arc<ReportFormat>,
}

impl TrackerController {
    pub fn new(classifier: Classifier, filter: SenderFilter, format: ReportFormat) -> Self {
        let tracker = BucketTracker::new(classifier.categories().cloned());
        Self {
            state: Arc::new(Mutex::new(tracker)),
            classifier: Arc::new(classifier),
            filter,
            format: Arc::new(format),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let filter = SenderFilter {
            chat_id: config.chat_id()?,
            sender: config.target_sender.clone(),
        };
        let format = ReportFormat {
            sender: config.target_sender.clone(),
            display_offset: config.display_offset()?,
        };
        Ok(Self::new(Classifier::new(&config.categories), filter, format))
    }

    pub fn chat_id(&self) -> i64 {
        self.filter.chat_id
    }

    /// Filter, classify and record one inbound message at time `now`.
    /// Returns the category that was recorded, if any.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Option<Category> {
        if !self.filter.accepts(message) {
            debug!(
                "ignoring message from {:?} in chat {}",
                message.sender, message.chat_id
            );
            return None;
        }

        let Some(category) = self.classifier.classify(message.text.as_deref()) else {
            debug!("message from @{} matched no category", self.filter.sender);
            return None;
        };

        let key = BucketTracker::current_bucket_key(now);
        self.state.lock().await.ingest(key, category.clone());
        info!(
            "{} from @{} logged for hour {}",
            category, self.filter.sender, key
        );
        Some(category)
    }

    pub async fn snapshot(&self, key: &BucketKey) -> BTreeSet<Category> {
        self.state.lock().await.snapshot(key)
    }

    pub async fn bucket_count(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Send the report for `key`, then prune past the retention window at `now`.
    ///
    /// `key` is the bucket of the scheduled slot, not of `now`: a tick that
    /// runs late still reports the hour it was scheduled for. A failed send
    /// is logged only; pruning happens either way and the summary is not
    /// retried.
    pub async fn summary_tick(
        &self,
        sink: &dyn MessageSink,
        key: BucketKey,
        now: DateTime<Utc>,
    ) -> BucketSummary {
        let (summary, text) = {
            let guard = self.state.lock().await;
            let summary = guard.summarize(&key);
            let text = guard.render_summary(&key, now, &self.format);
            (summary, text)
        };

        match sink.send_text(&text).await {
            Ok(()) => info!(
                "Sent summary for hour {}: {}/{} points ({})",
                key,
                summary.received.len(),
                summary.expected_len(),
                summary.received_labels()
            ),
            Err(err) => error!("Failed to send summary for hour {key}: {err:#}"),
        }

        let cutoff = BucketTracker::retention_cutoff(now);
        let removed = self.state.lock().await.prune(&cutoff);
        if removed > 0 {
            debug!("pruned {removed} buckets older than {cutoff}");
        }

        summary
    }

    /// Read-only progress report for the bucket in progress.
    pub async fn status_report(&self, now: DateTime<Utc>) -> String {
        let key = BucketTracker::current_bucket_key(now);
        let summary = self.state.lock().await.summarize(&key);
        self.format.render_status(&summary, now)
    }
}
