//! Channel permission preflight.
//!
//! The bot needs to see the channel, read its history and manage messages
//! (plus Connect for text-in-voice) before a sweep may touch it.

use crate::domain::Channel;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Discord permission bit set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const ADMINISTRATOR = 1 << 3;
        const VIEW_CHANNEL = 1 << 10;
        const MANAGE_MESSAGES = 1 << 13;
        const READ_MESSAGE_HISTORY = 1 << 16;
        const CONNECT = 1 << 20;
        /// Owner and administrator grant; keeps every bit the API may send.
        const ALL = u64::MAX;
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::empty()
    }
}

impl Permissions {
    /// Parse the decimal string form used on the wire. Unknown bits are kept.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u64>().ok().map(Self::from_bits_retain)
    }
}

/// A capability the sweep needs in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredPermission {
    ViewChannel,
    ReadMessageHistory,
    ManageMessages,
    Connect,
}

impl RequiredPermission {
    pub fn flag(self) -> Permissions {
        match self {
            RequiredPermission::ViewChannel => Permissions::VIEW_CHANNEL,
            RequiredPermission::ReadMessageHistory => Permissions::READ_MESSAGE_HISTORY,
            RequiredPermission::ManageMessages => Permissions::MANAGE_MESSAGES,
            RequiredPermission::Connect => Permissions::CONNECT,
        }
    }

    /// Required capabilities for a channel, in reporting order.
    pub fn required_for(channel: &Channel) -> Vec<RequiredPermission> {
        let mut required = vec![
            RequiredPermission::ViewChannel,
            RequiredPermission::ReadMessageHistory,
            RequiredPermission::ManageMessages,
        ];
        // Text-in-voice needs Connect as well.
        if channel.kind.is_voice_based() {
            required.push(RequiredPermission::Connect);
        }
        required
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequiredPermission::ViewChannel => "ViewChannel",
            RequiredPermission::ReadMessageHistory => "ReadMessageHistory",
            RequiredPermission::ManageMessages => "ManageMessages",
            RequiredPermission::Connect => "Connect",
        };
        f.write_str(name)
    }
}

/// Outcome of the preflight for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionResult {
    pub granted: bool,
    /// One human-readable line per missing capability, in check order.
    pub missing: Vec<String>,
}

/// Check the bot's effective permissions in `channel`.
///
/// `effective` is `None` when the bot has no resolvable membership in the
/// guild; that fails closed and reports every required capability as missing.
pub fn check_channel_permissions(
    channel: &Channel,
    effective: Option<Permissions>,
) -> PermissionResult {
    let perms = effective.unwrap_or_default();
    let missing: Vec<String> = RequiredPermission::required_for(channel)
        .into_iter()
        .filter(|p| !perms.contains(p.flag()))
        .map(|p| {
            let scope = if p == RequiredPermission::Connect {
                "voice channel"
            } else {
                "channel"
            };
            format!("Missing permission {} for {} {}", p, scope, channel.name)
        })
        .collect();

    PermissionResult {
        granted: missing.is_empty(),
        missing,
    }
}
