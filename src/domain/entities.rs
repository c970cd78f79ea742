//! Domain entities. Pure data structures for the core business.
//!
//! No Discord/IO types here — these are mapped from adapters.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// A channel visible to the bot. Owned by the platform; the sweep only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: u64,
    pub name: String,
    pub kind: ChannelKind,
}

impl Channel {
    pub fn new(id: u64, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

/// Channel kind as a tagged variant. Capability checks are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Announcement,
    Voice,
    Stage,
    Thread,
    Forum,
    Category,
    Dm,
    GroupDm,
    /// A channel type this build does not know about (raw platform code).
    Unknown(u8),
}

impl ChannelKind {
    /// Whether messages can be read from / posted in this channel.
    pub fn is_text_based(self) -> bool {
        matches!(
            self,
            ChannelKind::Text
                | ChannelKind::Announcement
                | ChannelKind::Voice
                | ChannelKind::Stage
                | ChannelKind::Thread
                | ChannelKind::Dm
                | ChannelKind::GroupDm
        )
    }

    /// Voice-like channels (text-in-voice). These also need Connect.
    pub fn is_voice_based(self) -> bool {
        matches!(self, ChannelKind::Voice | ChannelKind::Stage)
    }

    pub fn is_dm_based(self) -> bool {
        matches!(self, ChannelKind::Dm | ChannelKind::GroupDm)
    }
}

/// Snapshot of a message at fetch time. Never mutated; only its deletion is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub channel_id: u64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Whether the bot could delete this message when it was fetched.
    pub deletable: bool,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} at {}",
            self.id,
            self.author,
            self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// The bot account the session is logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: u64,
    pub username: String,
}
