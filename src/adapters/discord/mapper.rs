//! Map Discord wire types to domain entities.
//!
//! Also computes effective channel permissions and the per-message
//! "deletable" flag the way the official SDKs do.

use crate::adapters::discord::models::{
    ApiChannel, ApiGuild, ApiMember, ApiMessage, ApiOverwrite, ApiUser,
};
use crate::domain::{BotIdentity, Channel, ChannelKind, DomainError, Message, Permissions};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// First second of 2015, the Discord snowflake epoch.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Message types that can never be deleted (recipient add/remove, call,
/// channel name/icon change, thread starter).
const UNDELETABLE_MESSAGE_TYPES: &[u8] = &[1, 2, 3, 4, 5, 21];

/// Auto moderation notices carry the offender as author.
const AUTO_MODERATION_ACTION: u8 = 24;

const OVERWRITE_ROLE: u8 = 0;
const OVERWRITE_MEMBER: u8 = 1;

pub fn parse_snowflake(raw: &str) -> Result<u64, DomainError> {
    raw.parse::<u64>()
        .map_err(|_| DomainError::Gateway(format!("invalid snowflake: {:?}", raw)))
}

fn parse_permissions(raw: &str) -> Result<Permissions, DomainError> {
    Permissions::parse(raw)
        .ok_or_else(|| DomainError::Gateway(format!("invalid permission bits: {:?}", raw)))
}

/// Creation time encoded in a snowflake.
pub fn snowflake_timestamp(id: u64) -> DateTime<Utc> {
    let millis = (id >> 22) + DISCORD_EPOCH_MS;
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

/// Map the numeric channel type to the domain variant.
pub fn channel_kind(code: u8) -> ChannelKind {
    match code {
        0 => ChannelKind::Text,
        1 => ChannelKind::Dm,
        2 => ChannelKind::Voice,
        3 => ChannelKind::GroupDm,
        4 => ChannelKind::Category,
        5 => ChannelKind::Announcement,
        10..=12 => ChannelKind::Thread,
        13 => ChannelKind::Stage,
        15 | 16 => ChannelKind::Forum,
        other => ChannelKind::Unknown(other),
    }
}

pub fn channel_to_domain(api: &ApiChannel) -> Result<Channel, DomainError> {
    let id = parse_snowflake(&api.id)?;
    Ok(Channel {
        id,
        name: api.name.clone().unwrap_or_else(|| id.to_string()),
        kind: channel_kind(api.kind),
    })
}

pub fn user_to_identity(api: &ApiUser) -> Result<BotIdentity, DomainError> {
    Ok(BotIdentity {
        id: parse_snowflake(&api.id)?,
        username: api.username.clone(),
    })
}

/// The bot's standing in the guild: roles, ownership, timeout.
#[derive(Debug, Clone)]
pub struct GuildContext {
    pub guild_id: u64,
    pub owner_id: u64,
    pub me_id: u64,
    pub role_permissions: HashMap<u64, Permissions>,
    pub member_roles: Vec<u64>,
    pub timed_out_until: Option<DateTime<Utc>>,
}

impl GuildContext {
    pub fn from_api(guild: &ApiGuild, member: &ApiMember, me_id: u64) -> Result<Self, DomainError> {
        let mut role_permissions = HashMap::with_capacity(guild.roles.len());
        for role in &guild.roles {
            role_permissions.insert(
                parse_snowflake(&role.id)?,
                parse_permissions(&role.permissions)?,
            );
        }
        let member_roles = member
            .roles
            .iter()
            .map(|r| parse_snowflake(r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            guild_id: parse_snowflake(&guild.id)?,
            owner_id: parse_snowflake(&guild.owner_id)?,
            me_id,
            role_permissions,
            member_roles,
            timed_out_until: member.communication_disabled_until,
        })
    }

    /// Guild-level permissions: @everyone plus every member role.
    pub fn base_permissions(&self) -> Permissions {
        if self.owner_id == self.me_id {
            return Permissions::ALL;
        }
        // The @everyone role shares the guild id.
        let mut perms = self
            .role_permissions
            .get(&self.guild_id)
            .copied()
            .unwrap_or_default();
        for role in &self.member_roles {
            if let Some(p) = self.role_permissions.get(role) {
                perms |= *p;
            }
        }
        if perms.contains(Permissions::ADMINISTRATOR) {
            return Permissions::ALL;
        }
        perms
    }

    /// Apply channel overwrites: @everyone, then roles combined, then the member.
    pub fn channel_permissions(
        &self,
        overwrites: &[ApiOverwrite],
    ) -> Result<Permissions, DomainError> {
        let base = self.base_permissions();
        if base.contains(Permissions::ADMINISTRATOR) {
            return Ok(Permissions::ALL);
        }

        let mut everyone: Option<(Permissions, Permissions)> = None;
        let mut role_allow = Permissions::empty();
        let mut role_deny = Permissions::empty();
        let mut member: Option<(Permissions, Permissions)> = None;

        for ow in overwrites {
            let target = parse_snowflake(&ow.id)?;
            let allow = parse_permissions(&ow.allow)?;
            let deny = parse_permissions(&ow.deny)?;
            match ow.kind {
                OVERWRITE_ROLE if target == self.guild_id => everyone = Some((allow, deny)),
                OVERWRITE_ROLE if self.member_roles.contains(&target) => {
                    role_allow |= allow;
                    role_deny |= deny;
                }
                OVERWRITE_MEMBER if target == self.me_id => member = Some((allow, deny)),
                _ => {}
            }
        }

        let mut perms = base;
        if let Some((allow, deny)) = everyone {
            perms = (perms & !deny) | allow;
        }
        perms = (perms & !role_deny) | role_allow;
        if let Some((allow, deny)) = member {
            perms = (perms & !deny) | allow;
        }
        Ok(perms)
    }

    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        self.timed_out_until.is_some_and(|until| until > now)
    }
}

/// Whether the bot may delete a message of `kind` written by `author_id`,
/// given its permissions in the channel.
pub fn is_message_deletable(
    kind: u8,
    author_id: u64,
    ctx: &GuildContext,
    channel_perms: Permissions,
    now: DateTime<Utc>,
) -> bool {
    if UNDELETABLE_MESSAGE_TYPES.contains(&kind) {
        return false;
    }
    if !channel_perms.contains(Permissions::VIEW_CHANNEL) {
        return false;
    }
    if channel_perms.contains(Permissions::ADMINISTRATOR) {
        return true;
    }
    let own = kind != AUTO_MODERATION_ACTION && author_id == ctx.me_id;
    own || (channel_perms.contains(Permissions::MANAGE_MESSAGES) && !ctx.is_timed_out(now))
}

pub fn message_to_domain(
    api: &ApiMessage,
    channel_id: u64,
    ctx: &GuildContext,
    channel_perms: Permissions,
    now: DateTime<Utc>,
) -> Result<Message, DomainError> {
    let id = parse_snowflake(&api.id)?;
    let author_id = parse_snowflake(&api.author.id)?;
    Ok(Message {
        id,
        channel_id,
        author: api.author.username.clone(),
        created_at: snowflake_timestamp(id),
        deletable: is_message_deletable(api.kind, author_id, ctx, channel_perms, now),
    })
}
