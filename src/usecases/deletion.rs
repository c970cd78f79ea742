//! Two-path deletion: one-by-one for messages past the bulk-delete ceiling,
//! batched for the rest.
//!
//! Single deletes run first, oldest first, strictly sequentially. Preview
//! mode logs and counts the same way but never calls the platform.

use crate::domain::{Channel, DomainError, Message, is_bulk_deletable};
use crate::ports::{ChatGateway, MAX_PAGE_SIZE};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::info;

/// Old messages split by which delete path they need. Both sets stay oldest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Within the bulk-delete ceiling.
    pub bulk: Vec<Message>,
    /// Past the ceiling; must be deleted one at a time.
    pub single: Vec<Message>,
}

impl DeletionPlan {
    /// Partition oldest-first `messages` by bulk eligibility at `now`.
    pub fn partition(messages: Vec<Message>, now: DateTime<Utc>) -> Self {
        let (bulk, single) = messages
            .into_iter()
            .partition(|m| is_bulk_deletable(m, now));
        Self { bulk, single }
    }

    pub fn is_empty(&self) -> bool {
        self.bulk.is_empty() && self.single.is_empty()
    }
}

/// Counters of one channel's deletion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeletionStats {
    pub deleted_single: usize,
    pub deleted_bulk: usize,
    pub not_deletable: usize,
}

/// Executes a [`DeletionPlan`] against the platform.
pub struct DeletionStrategist {
    gateway: Arc<dyn ChatGateway>,
}

impl DeletionStrategist {
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self { gateway }
    }

    /// Delete the single set, then the bulk set. Any platform error is fatal.
    pub async fn execute(
        &self,
        channel: &Channel,
        plan: &DeletionPlan,
        preview: bool,
    ) -> Result<DeletionStats, DomainError> {
        let mut stats = DeletionStats::default();
        if !plan.single.is_empty() {
            self.delete_one_by_one(channel, &plan.single, preview, &mut stats)
                .await?;
        }
        if !plan.bulk.is_empty() {
            self.delete_in_bulk(channel, &plan.bulk, preview, &mut stats)
                .await?;
        }
        Ok(stats)
    }

    async fn delete_one_by_one(
        &self,
        channel: &Channel,
        messages: &[Message],
        preview: bool,
        stats: &mut DeletionStats,
    ) -> Result<(), DomainError> {
        let total = messages.len();
        for message in messages {
            if !message.deletable {
                info!(
                    channel = %channel.name,
                    "Not deletable: message {} from channel {}",
                    message,
                    channel.name
                );
                stats.not_deletable += 1;
                continue;
            }

            info!(
                "{} - Deleting message ({} / {}) {} from channel {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                stats.deleted_single + 1,
                total,
                message,
                channel.name
            );
            if !preview {
                self.gateway.delete_message(channel, message).await?;
            }
            stats.deleted_single += 1;
        }
        Ok(())
    }

    async fn delete_in_bulk(
        &self,
        channel: &Channel,
        messages: &[Message],
        preview: bool,
        stats: &mut DeletionStats,
    ) -> Result<(), DomainError> {
        let listing: Vec<String> = messages.iter().map(|m| m.to_string()).collect();
        info!(
            channel = %channel.name,
            count = messages.len(),
            "Bulk deleting {} messages from channel {}: \n    {}",
            messages.len(),
            channel.name,
            listing.join("\n    ")
        );

        for chunk in messages.chunks(usize::from(MAX_PAGE_SIZE)) {
            if !preview {
                // The bulk endpoint wants at least two ids.
                if let [only] = chunk {
                    self.gateway.delete_message(channel, only).await?;
                } else {
                    self.gateway.bulk_delete_messages(channel, chunk).await?;
                }
            }
            stats.deleted_bulk += chunk.len();
        }
        Ok(())
    }
}
