//! Main sweep logic: list channels -> permission preflight -> full history ->
//! retention filter -> two-path deletion -> pause.
//!
//! - Channels run sequentially to respect per-guild rate limits
//! - A failed preflight skips the channel; the sweep goes on
//! - Any other error aborts the sweep; later channels stay untouched

use crate::domain::{Channel, DomainError, SweepConfig, check_channel_permissions};
use crate::ports::{ChatGateway, SweepPort};
use crate::usecases::deletion::{DeletionPlan, DeletionStats, DeletionStrategist};
use crate::usecases::history::HistoryPaginator;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fixed pause after each channel's deletions and between channels.
pub const CHANNEL_PAUSE: Duration = Duration::from_millis(1000);

/// Sweep orchestrator. Owns the paginator and strategist for one session.
pub struct SweepService {
    gateway: Arc<dyn ChatGateway>,
    paginator: HistoryPaginator,
    strategist: DeletionStrategist,
    pause: Duration,
}

impl SweepService {
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            paginator: HistoryPaginator::new(Arc::clone(&gateway)),
            strategist: DeletionStrategist::new(Arc::clone(&gateway)),
            gateway,
            pause: CHANNEL_PAUSE,
        }
    }

    /// Override the inter-channel pause (tests use zero).
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Run one sweep over the configured channels.
    pub async fn run(&self, config: &SweepConfig) -> Result<SweepReport, DomainError> {
        let all_channels = self.gateway.list_channels().await?;
        let channels = resolve_channels(&all_channels, config);

        info!(
            ttl_ms = config.retention.ttl_millis() as u64,
            "Deleting messages of channels: {} that are older than {} milliseconds ({} days)",
            config.channel_names.join(","),
            config.retention.ttl_millis(),
            config.retention.ttl_days()
        );
        if config.preview {
            info!("This is a preview run. Messages will not really be deleted");
        } else {
            warn!("WARNING: THIS IS NOT A PREVIEW RUN. MESSAGES WILL BE DELETED!");
        }

        let mut report = SweepReport::default();
        for channel in &channels {
            self.sweep_channel(channel, config, &mut report).await?;
            self.sleep().await;
        }

        info!(
            processed = report.channels_processed,
            skipped = report.channels_skipped,
            scanned = report.messages_scanned,
            old = report.old_messages,
            deleted = report.deleted(),
            "sweep finished"
        );
        Ok(report)
    }

    /// Sweep a single channel. Unsupported kinds and failed preflights are
    /// logged and skipped; everything else propagates.
    pub async fn sweep_channel(
        &self,
        channel: &Channel,
        config: &SweepConfig,
        report: &mut SweepReport,
    ) -> Result<(), DomainError> {
        if channel.kind.is_dm_based() {
            error!("Cannot delete old messages of DM channel {}", channel.id);
            report.channels_skipped += 1;
            return Ok(());
        }
        if !channel.kind.is_text_based() {
            error!(
                "Cannot delete old messages of non-text-based channel {}",
                channel.id
            );
            report.channels_skipped += 1;
            return Ok(());
        }

        let effective = self.gateway.own_permissions(channel).await?;
        let check = check_channel_permissions(channel, effective);
        if !check.granted {
            for line in &check.missing {
                error!(channel = %channel.name, "{}", line);
            }
            report.channels_skipped += 1;
            return Ok(());
        }

        info!(channel = %channel.name, "Deleting old messages in channel {}", channel.name);

        let messages = self.paginator.fetch_all(channel).await?;
        info!(
            channel = %channel.name,
            count = messages.len(),
            "Found {} messages in channel {}",
            messages.len(),
            channel.name
        );
        report.messages_scanned += messages.len();

        let now = Utc::now();
        let mut old_messages: Vec<_> = messages
            .into_iter()
            .filter(|m| config.retention.is_expired(m, now))
            .collect();
        info!(
            channel = %channel.name,
            count = old_messages.len(),
            "Found {} messages older than {} millis in channel {}",
            old_messages.len(),
            config.retention.ttl_millis(),
            channel.name
        );
        report.old_messages += old_messages.len();

        // Platform order is newest first; delete oldest first.
        old_messages.reverse();
        let plan = DeletionPlan::partition(old_messages, now);
        let stats = self
            .strategist
            .execute(channel, &plan, config.preview)
            .await?;
        report.record(stats);
        report.channels_processed += 1;

        self.sleep().await;
        Ok(())
    }

    async fn sleep(&self) {
        info!("sleeping {} milliseconds", self.pause.as_millis());
        tokio::time::sleep(self.pause).await;
    }
}

#[async_trait::async_trait]
impl SweepPort for SweepService {
    async fn sweep(&self, config: &SweepConfig) -> Result<SweepReport, DomainError> {
        self.run(config).await
    }
}

/// Configured channels that exist, in listing order. Only guild text channels
/// qualify; a name listed twice yields the channel twice.
pub fn resolve_channels(all: &[Channel], config: &SweepConfig) -> Vec<Channel> {
    all.iter()
        .filter(|c| !c.kind.is_dm_based() && c.kind.is_text_based())
        .flat_map(|c| std::iter::repeat_n(c.clone(), config.occurrences(&c.name)))
        .collect()
}

/// Counters accumulated over one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub channels_processed: usize,
    pub channels_skipped: usize,
    pub messages_scanned: usize,
    pub old_messages: usize,
    pub deleted_single: usize,
    pub deleted_bulk: usize,
    pub not_deletable: usize,
}

impl SweepReport {
    fn record(&mut self, stats: DeletionStats) {
        self.deleted_single += stats.deleted_single;
        self.deleted_bulk += stats.deleted_bulk;
        self.not_deletable += stats.not_deletable;
    }

    /// Messages deleted (or, in preview, that would have been).
    pub fn deleted(&self) -> usize {
        self.deleted_single + self.deleted_bulk
    }
}
