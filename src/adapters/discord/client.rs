//! Implements ChatGateway on top of the Discord REST API.
//!
//! Guild roles, the bot's membership and channel overwrites are fetched once
//! and cached for the lifetime of the gateway (one sweep).

use crate::adapters::discord::mapper::{self, GuildContext};
use crate::adapters::discord::models::{
    ApiBulkDelete, ApiChannel, ApiGuild, ApiMember, ApiMessage, ApiOverwrite,
};
use crate::adapters::discord::session::DiscordSession;
use crate::domain::{Channel, DomainError, Message, Permissions};
use crate::ports::{ChatGateway, MAX_PAGE_SIZE, MessageQuery};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Discord gateway adapter. Wraps a logged-in session (shared via Arc).
pub struct DiscordRestGateway {
    session: Arc<DiscordSession>,
    /// `None` inside the cell when the bot has no membership in the guild.
    guild: OnceCell<Option<Arc<GuildContext>>>,
    /// Overwrites by channel id, filled by `list_channels`.
    overwrites: Mutex<HashMap<u64, Vec<ApiOverwrite>>>,
}

impl DiscordRestGateway {
    pub fn new(session: Arc<DiscordSession>) -> Self {
        Self {
            session,
            guild: OnceCell::new(),
            overwrites: Mutex::new(HashMap::new()),
        }
    }

    async fn guild_context(&self) -> Result<Option<Arc<GuildContext>>, DomainError> {
        self.guild
            .get_or_try_init(|| self.load_guild_context())
            .await
            .cloned()
    }

    /// Guild roles plus the bot's own member record.
    async fn load_guild_context(&self) -> Result<Option<Arc<GuildContext>>, DomainError> {
        let guild_id = self.session.guild_id();
        let me_id = self.session.identity().id;
        let guild: ApiGuild = self.session.get(&format!("/guilds/{}", guild_id)).await?;
        let member: Option<ApiMember> = self
            .session
            .get_optional(&format!("/guilds/{}/members/{}", guild_id, me_id))
            .await?;
        match member {
            Some(member) => Ok(Some(Arc::new(GuildContext::from_api(
                &guild, &member, me_id,
            )?))),
            None => Ok(None),
        }
    }

    async fn channel_overwrites(&self, channel_id: u64) -> Result<Vec<ApiOverwrite>, DomainError> {
        if let Some(cached) = self.overwrites.lock().await.get(&channel_id) {
            return Ok(cached.clone());
        }
        let api: ApiChannel = self.session.get(&format!("/channels/{}", channel_id)).await?;
        self.overwrites
            .lock()
            .await
            .insert(channel_id, api.permission_overwrites.clone());
        Ok(api.permission_overwrites)
    }

    async fn permissions_in(
        &self,
        ctx: &GuildContext,
        channel_id: u64,
    ) -> Result<Permissions, DomainError> {
        let overwrites = self.channel_overwrites(channel_id).await?;
        ctx.channel_permissions(&overwrites)
    }
}

#[async_trait]
impl ChatGateway for DiscordRestGateway {
    async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
        let api: Vec<ApiChannel> = self
            .session
            .get(&format!("/guilds/{}/channels", self.session.guild_id()))
            .await?;

        let mut channels = Vec::with_capacity(api.len());
        let mut cache = self.overwrites.lock().await;
        for raw in &api {
            let channel = mapper::channel_to_domain(raw)?;
            cache.insert(channel.id, raw.permission_overwrites.clone());
            channels.push(channel);
        }
        Ok(channels)
    }

    async fn own_permissions(&self, channel: &Channel) -> Result<Option<Permissions>, DomainError> {
        let Some(ctx) = self.guild_context().await? else {
            return Ok(None);
        };
        self.permissions_in(&ctx, channel.id).await.map(Some)
    }

    async fn fetch_messages(
        &self,
        channel: &Channel,
        query: MessageQuery,
    ) -> Result<Vec<Message>, DomainError> {
        let ctx = self.guild_context().await?.ok_or_else(|| {
            DomainError::Gateway(format!("not a member of guild {}", self.session.guild_id()))
        })?;
        let perms = self.permissions_in(&ctx, channel.id).await?;

        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let mut params = vec![("limit", limit.to_string())];
        if let Some(before) = query.before {
            params.push(("before", before.to_string()));
        }

        let url = self.session.url(&format!("/channels/{}/messages", channel.id));
        let res = self
            .session
            .execute(|| self.session.http().get(&url).query(&params))
            .await?;
        let page: Vec<ApiMessage> = res
            .json()
            .await
            .map_err(|e| DomainError::Gateway(format!("Failed to parse messages: {}", e)))?;

        let now = Utc::now();
        let messages = page
            .iter()
            .map(|m| mapper::message_to_domain(m, channel.id, &ctx, perms, now))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            channel = %channel.name,
            before = ?query.before,
            returned = messages.len(),
            "fetched message page"
        );
        Ok(messages)
    }

    async fn delete_message(
        &self,
        channel: &Channel,
        message: &Message,
    ) -> Result<(), DomainError> {
        let url = self
            .session
            .url(&format!("/channels/{}/messages/{}", channel.id, message.id));
        self.session
            .execute(|| self.session.http().delete(&url))
            .await?;
        debug!(channel = %channel.name, msg_id = message.id, "message deleted");
        Ok(())
    }

    async fn bulk_delete_messages(
        &self,
        channel: &Channel,
        messages: &[Message],
    ) -> Result<(), DomainError> {
        let url = self
            .session
            .url(&format!("/channels/{}/messages/bulk-delete", channel.id));
        let body = ApiBulkDelete {
            messages: messages.iter().map(|m| m.id.to_string()).collect(),
        };
        self.session
            .execute(|| self.session.http().post(&url).json(&body))
            .await?;
        debug!(channel = %channel.name, count = messages.len(), "messages bulk deleted");
        Ok(())
    }
}
