//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Channel, DomainError, Message, Permissions};

/// Largest page the history endpoint serves.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Page request for a channel's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    /// At most [`MAX_PAGE_SIZE`].
    pub limit: u8,
    /// Only messages with an id strictly lower than this one.
    pub before: Option<u64>,
}

impl MessageQuery {
    pub fn latest(limit: u8) -> Self {
        Self {
            limit,
            before: None,
        }
    }

    pub fn before(before: u64, limit: u8) -> Self {
        Self {
            limit,
            before: Some(before),
        }
    }
}

/// Chat platform client. Enumerate channels, read history, delete messages.
///
/// One gateway is bound to one logged-in session and one guild.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    /// All channels visible to the bot, in platform listing order.
    async fn list_channels(&self) -> Result<Vec<Channel>, DomainError>;

    /// The bot's effective permissions in `channel`. `None` when the bot has
    /// no resolvable membership in the channel's guild.
    async fn own_permissions(&self, channel: &Channel) -> Result<Option<Permissions>, DomainError>;

    /// Fetch one page of messages, newest first.
    async fn fetch_messages(
        &self,
        channel: &Channel,
        query: MessageQuery,
    ) -> Result<Vec<Message>, DomainError>;

    /// Delete a single message.
    async fn delete_message(&self, channel: &Channel, message: &Message)
    -> Result<(), DomainError>;

    /// Delete 2..=100 messages younger than the bulk-delete ceiling in one call.
    async fn bulk_delete_messages(
        &self,
        channel: &Channel,
        messages: &[Message],
    ) -> Result<(), DomainError>;
}
