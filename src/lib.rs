mod classifier;
mod config;
mod scheduler;
mod tracker;
mod transport;
mod utils;

pub use classifier::{Category, CategoryRule, Classifier};
pub use config::AppConfig;
pub use scheduler::{next_fire_after, plan_next_fire, SchedulerController, SummaryOffset};
pub use tracker::{
    BucketKey, BucketSummary, BucketTracker, ReportFormat, SenderFilter, SummaryStatus,
    TrackerController,
};
pub use transport::{ChatDestination, InboundMessage, MessageSink, TelegramClient};

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

/// Load configuration, then watch the chat until Ctrl-C.
pub fn run() -> Result<()> {
    utils::logging::init();

    // Configuration problems are fatal before any event is accepted
    let config = AppConfig::load().context("invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(serve(config))
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let controller = TrackerController::from_config(&config)?;
    let client = TelegramClient::new(&config.bot_token, config.poll_timeout_secs)?;
    let sink: Arc<dyn MessageSink> =
        Arc::new(ChatDestination::new(client.clone(), controller.chat_id()));

    let mut scheduler = SchedulerController::new();
    scheduler.start(controller.clone(), sink.clone(), config.summary_at)?;

    info!(
        "Bot starting... Monitoring @{} in chat {} for hourly summaries at {}",
        config.target_sender,
        controller.chat_id(),
        config.summary_at
    );

    let cancel_token = CancellationToken::new();
    let poller = tokio::spawn(transport::poll_loop(
        client,
        controller,
        sink,
        cancel_token.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    cancel_token.cancel();
    poller.await.context("poll loop task failed to join")?;
    scheduler.stop().await?;

    info!("Stopped");
    Ok(())
}
