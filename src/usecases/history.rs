//! Full-history retrieval for one channel.
//!
//! - Probes the newest message to get a starting cursor
//! - Walks backwards in pages of up to 100 using `before` cursors
//! - Refuses to request the same cursor twice (fatal, never loops)

use crate::domain::{Channel, DomainError, Message};
use crate::ports::{ChatGateway, MAX_PAGE_SIZE, MessageQuery};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Reads the complete message history of a channel, page by page.
pub struct HistoryPaginator {
    gateway: Arc<dyn ChatGateway>,
    batch_size: u8,
}

impl HistoryPaginator {
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            gateway,
            batch_size: MAX_PAGE_SIZE,
        }
    }

    /// Use a smaller page size (clamped to 1..=100).
    pub fn with_batch_size(mut self, batch_size: u8) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// All messages of `channel`, newest first, exactly as the platform orders them.
    pub async fn fetch_all(&self, channel: &Channel) -> Result<Vec<Message>, DomainError> {
        info!(channel = %channel.name, "Fetching all messages in channel {}", channel.name);

        let probe = self
            .gateway
            .fetch_messages(channel, MessageQuery::latest(1))
            .await?;
        let Some(newest) = probe.into_iter().next() else {
            return Ok(Vec::new());
        };

        let mut cursor = newest.id;
        let mut messages = vec![newest];
        let mut seen_cursors: HashSet<u64> = HashSet::new();

        loop {
            if !seen_cursors.insert(cursor) {
                return Err(DomainError::PaginationLoop {
                    channel: channel.name.clone(),
                    before: cursor,
                });
            }

            info!(
                channel = %channel.name,
                before = cursor,
                limit = self.batch_size,
                "Fetching messages of channel {} before {}, limit = {}",
                channel.name,
                cursor,
                self.batch_size
            );
            let page = self
                .gateway
                .fetch_messages(channel, MessageQuery::before(cursor, self.batch_size))
                .await?;

            let page_len = page.len();
            // Oldest message of the page becomes the next cursor.
            let Some(oldest) = page.last().map(|m| m.id) else {
                break;
            };
            messages.extend(page);

            if page_len < usize::from(self.batch_size) {
                break;
            }
            cursor = oldest;
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryGateway;
    use crate::domain::{ChannelKind, Permissions};
    use chrono::Utc;
    use std::sync::Mutex;

    fn msg(id: u64) -> Message {
        Message {
            id,
            channel_id: 1,
            author: "dave".to_string(),
            created_at: Utc::now(),
            deletable: true,
        }
    }

    fn general() -> Channel {
        Channel::new(1, "general", ChannelKind::Text)
    }

    fn seeded(count: u64) -> Arc<InMemoryGateway> {
        let gw = Arc::new(InMemoryGateway::new());
        gw.add_channel(general(), Some(Permissions::ALL));
        for id in 1..=count {
            gw.add_message(msg(id));
        }
        gw
    }

    #[tokio::test]
    async fn test_empty_channel_only_probes() {
        let gw = seeded(0);
        let paginator = HistoryPaginator::new(gw.clone());
        let all = paginator.fetch_all(&general()).await.unwrap();
        assert!(all.is_empty());
        assert_eq!(gw.fetch_calls(1), 1);
    }

    #[tokio::test]
    async fn test_fetch_count_and_no_duplicates() {
        for (n, expected_pages) in [(1u64, 1usize), (100, 1), (101, 2), (200, 2), (201, 3), (250, 3)] {
            let gw = seeded(n);
            let paginator = HistoryPaginator::new(gw.clone());
            let all = paginator.fetch_all(&general()).await.unwrap();

            assert_eq!(all.len() as u64, n, "N = {}", n);
            let unique: HashSet<u64> = all.iter().map(|m| m.id).collect();
            assert_eq!(unique.len() as u64, n);
            // Newest first.
            assert!(all.windows(2).all(|w| w[0].id > w[1].id));
            // Probe plus ceil(N / 100) page requests.
            assert_eq!(gw.fetch_calls(1), 1 + expected_pages, "N = {}", n);
        }
    }

    #[tokio::test]
    async fn test_small_batch_size() {
        let gw = seeded(7);
        let paginator = HistoryPaginator::new(gw.clone()).with_batch_size(3);
        let all = paginator.fetch_all(&general()).await.unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), vec![7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(gw.fetch_calls(1), 1 + 3);
    }

    /// Serves scripted pages regardless of the cursor.
    struct ScriptedGateway {
        pages: Mutex<Vec<Vec<Message>>>,
        cursors: Mutex<Vec<Option<u64>>>,
    }

    #[async_trait::async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
            Ok(vec![general()])
        }

        async fn own_permissions(
            &self,
            _channel: &Channel,
        ) -> Result<Option<Permissions>, DomainError> {
            Ok(Some(Permissions::ALL))
        }

        async fn fetch_messages(
            &self,
            _channel: &Channel,
            query: MessageQuery,
        ) -> Result<Vec<Message>, DomainError> {
            self.cursors.lock().unwrap().push(query.before);
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(Vec::new());
            }
            Ok(pages.remove(0))
        }

        async fn delete_message(
            &self,
            _channel: &Channel,
            _message: &Message,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn bulk_delete_messages(
            &self,
            _channel: &Channel,
            _messages: &[Message],
        ) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_repeated_cursor_is_fatal() {
        // The second full page ends on the same message as the first one.
        let page: Vec<Message> = (1..=3).rev().map(msg).collect();
        let gw = Arc::new(ScriptedGateway {
            pages: Mutex::new(vec![vec![msg(10)], page.clone(), page.clone(), page]),
            cursors: Mutex::new(Vec::new()),
        });
        let paginator = HistoryPaginator::new(gw.clone()).with_batch_size(3);

        let err = paginator.fetch_all(&general()).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::PaginationLoop { ref channel, before: 1 } if channel == "general"
        ));
        // Probe, before 10, before 1; the second "before 1" is never sent.
        assert_eq!(
            *gw.cursors.lock().unwrap(),
            vec![None, Some(10), Some(1)]
        );
    }

    #[tokio::test]
    async fn test_page_ending_on_cursor_is_fatal() {
        // Platform echoes the cursor message back as the oldest entry.
        let gw = Arc::new(ScriptedGateway {
            pages: Mutex::new(vec![
                vec![msg(10)],
                vec![msg(12), msg(11), msg(10)],
            ]),
            cursors: Mutex::new(Vec::new()),
        });
        let paginator = HistoryPaginator::new(gw).with_batch_size(3);
        let err = paginator.fetch_all(&general()).await.unwrap_err();
        assert!(matches!(err, DomainError::PaginationLoop { before: 10, .. }));
    }
}
