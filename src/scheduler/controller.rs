use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::tracker::TrackerController;
use crate::transport::MessageSink;

use super::{loop_worker::summary_loop, SummaryOffset};

/// Owns the background summary task.
pub struct SchedulerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SchedulerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        controller: TrackerController,
        sink: Arc<dyn MessageSink>,
        offset: SummaryOffset,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("summary scheduler already running");
        }
        offset.validate()?;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(summary_loop(controller, sink, offset, cancel_token.clone()));
        info!("Scheduler started - summaries at {offset} past each hour (UTC)");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("summary loop task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Default for SchedulerController {
    fn default() -> Self {
        Self::new()
    }
}
