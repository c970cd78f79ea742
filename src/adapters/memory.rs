//! In-memory chat platform for use-case tests.
//!
//! Behaves like the real API for the calls the sweep makes: newest-first
//! pages, `before` cursors, bulk-delete bounds. Every call is recorded.

use crate::domain::{Channel, DomainError, Message, Permissions, is_bulk_deletable};
use crate::ports::{ChatGateway, MAX_PAGE_SIZE, MessageQuery};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// A call made against the in-memory platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListChannels,
    OwnPermissions { channel_id: u64 },
    FetchMessages { channel_id: u64, query: MessageQuery },
    DeleteMessage { channel_id: u64, message_id: u64 },
    BulkDelete { channel_id: u64, message_ids: Vec<u64> },
}

#[derive(Default)]
struct State {
    channels: Vec<Channel>,
    permissions: HashMap<u64, Permissions>,
    messages: HashMap<u64, Vec<Message>>,
    failing_deletes: HashSet<u64>,
    calls: Vec<GatewayCall>,
}

/// In-memory implementation of [`ChatGateway`].
#[derive(Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a channel. `permissions = None` means the bot is not a member.
    pub fn add_channel(&self, channel: Channel, permissions: Option<Permissions>) {
        let mut state = self.state();
        if let Some(p) = permissions {
            state.permissions.insert(channel.id, p);
        }
        state.messages.entry(channel.id).or_default();
        state.channels.push(channel);
    }

    pub fn add_message(&self, message: Message) {
        self.state()
            .messages
            .entry(message.channel_id)
            .or_default()
            .push(message);
    }

    /// Make deleting this message fail like an "Unknown Message" API error.
    pub fn fail_delete_of(&self, message_id: u64) {
        self.state().failing_deletes.insert(message_id);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Ids of messages still present in the channel, newest first.
    pub fn remaining_ids(&self, channel_id: u64) -> Vec<u64> {
        let state = self.state();
        let mut ids: Vec<u64> = state
            .messages
            .get(&channel_id)
            .map(|m| m.iter().map(|m| m.id).collect())
            .unwrap_or_default();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids
    }

    pub fn fetch_calls(&self, channel_id: u64) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::FetchMessages { channel_id: id, .. } if *id == channel_id))
            .count()
    }

    /// Number of destructive calls (single and bulk) issued so far.
    pub fn delete_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    GatewayCall::DeleteMessage { .. } | GatewayCall::BulkDelete { .. }
                )
            })
            .count()
    }

    fn remove(state: &mut State, channel_id: u64, message_id: u64) -> Result<(), DomainError> {
        let messages = state.messages.entry(channel_id).or_default();
        let before = messages.len();
        messages.retain(|m| m.id != message_id);
        if messages.len() == before {
            return Err(DomainError::Gateway(format!(
                "404 Unknown Message {} in channel {}",
                message_id, channel_id
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChatGateway for InMemoryGateway {
    async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::ListChannels);
        Ok(state.channels.clone())
    }

    async fn own_permissions(&self, channel: &Channel) -> Result<Option<Permissions>, DomainError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::OwnPermissions {
            channel_id: channel.id,
        });
        Ok(state.permissions.get(&channel.id).copied())
    }

    async fn fetch_messages(
        &self,
        channel: &Channel,
        query: MessageQuery,
    ) -> Result<Vec<Message>, DomainError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::FetchMessages {
            channel_id: channel.id,
            query,
        });
        if query.limit == 0 || query.limit > MAX_PAGE_SIZE {
            return Err(DomainError::Gateway(format!(
                "400 invalid limit {}",
                query.limit
            )));
        }
        let mut page: Vec<Message> = state
            .messages
            .get(&channel.id)
            .map(|all| {
                all.iter()
                    .filter(|m| query.before.is_none_or(|b| m.id < b))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        page.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        page.truncate(usize::from(query.limit));
        debug!(channel = %channel.name, returned = page.len(), "in-memory page");
        Ok(page)
    }

    async fn delete_message(
        &self,
        channel: &Channel,
        message: &Message,
    ) -> Result<(), DomainError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::DeleteMessage {
            channel_id: channel.id,
            message_id: message.id,
        });
        if state.failing_deletes.contains(&message.id) {
            return Err(DomainError::Gateway(format!(
                "404 Unknown Message {}",
                message.id
            )));
        }
        Self::remove(&mut state, channel.id, message.id)
    }

    async fn bulk_delete_messages(
        &self,
        channel: &Channel,
        messages: &[Message],
    ) -> Result<(), DomainError> {
        let mut state = self.state();
        state.calls.push(GatewayCall::BulkDelete {
            channel_id: channel.id,
            message_ids: messages.iter().map(|m| m.id).collect(),
        });
        if messages.len() < 2 || messages.len() > usize::from(MAX_PAGE_SIZE) {
            return Err(DomainError::Gateway(format!(
                "400 bulk delete needs 2..=100 messages, got {}",
                messages.len()
            )));
        }
        let now = Utc::now();
        if let Some(stale) = messages.iter().find(|m| !is_bulk_deletable(m, now)) {
            return Err(DomainError::Gateway(format!(
                "400 message {} is older than 2 weeks",
                stale.id
            )));
        }
        for m in messages {
            Self::remove(&mut state, channel.id, m.id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChannelKind;
    use chrono::TimeDelta;

    fn msg(id: u64, channel_id: u64, age_days: i64) -> Message {
        Message {
            id,
            channel_id,
            author: "carol".to_string(),
            created_at: Utc::now() - TimeDelta::days(age_days),
            deletable: true,
        }
    }

    #[tokio::test]
    async fn test_pages_are_newest_first_and_respect_cursor() {
        let gw = InMemoryGateway::new();
        let channel = Channel::new(1, "general", ChannelKind::Text);
        gw.add_channel(channel.clone(), Some(Permissions::ALL));
        for id in [5, 1, 3, 2, 4] {
            gw.add_message(msg(id, 1, 1));
        }

        let latest = gw
            .fetch_messages(&channel, MessageQuery::latest(2))
            .await
            .unwrap();
        assert_eq!(latest.iter().map(|m| m.id).collect::<Vec<_>>(), vec![5, 4]);

        let older = gw
            .fetch_messages(&channel, MessageQuery::before(4, 100))
            .await
            .unwrap();
        assert_eq!(older.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_bulk_delete_enforces_platform_bounds() {
        let gw = InMemoryGateway::new();
        let channel = Channel::new(1, "general", ChannelKind::Text);
        gw.add_channel(channel.clone(), Some(Permissions::ALL));
        let young = msg(1, 1, 1);
        let old = msg(2, 1, 20);
        gw.add_message(young.clone());
        gw.add_message(old.clone());

        assert!(gw
            .bulk_delete_messages(&channel, std::slice::from_ref(&young))
            .await
            .is_err());
        assert!(gw
            .bulk_delete_messages(&channel, &[young.clone(), old.clone()])
            .await
            .is_err());
        assert_eq!(gw.remaining_ids(1), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_delete_unknown_message_fails() {
        let gw = InMemoryGateway::new();
        let channel = Channel::new(1, "general", ChannelKind::Text);
        gw.add_channel(channel.clone(), None);
        let ghost = msg(9, 1, 30);
        assert!(gw.delete_message(&channel, &ghost).await.is_err());
        assert_eq!(gw.own_permissions(&channel).await.unwrap(), None);
    }
}
