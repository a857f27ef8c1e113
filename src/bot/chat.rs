//! Chat API seam.
//!
//! Everything the bot does to Discord goes through [`ChatGateway`], so dispatch,
//! policies and the mine engine can run against an in-memory recorder in tests.
//! [`SerenityChat`] is the production implementation over serenity's HTTP client
//! and cache.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::Datelike;
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, GuildId, MessageId, RoleId, UserId};
use std::sync::Arc;

/// Outbound chat operations used by the bot.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Posts `text` in a channel.
    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<()>;

    /// Sends `text` to a user by direct message.
    async fn send_direct_message(&self, user: UserId, text: &str) -> Result<()>;

    /// Reacts to a message with a unicode emoji or a `<:name:id>` custom emoji.
    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    /// Grants a role. Granting a role the member already has is a no-op.
    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    /// Removes a role. Removing a role the member does not have is a no-op.
    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    /// Whether the user may ban members in the given channel.
    async fn can_ban_members(&self, guild: GuildId, channel: ChannelId, user: UserId)
    -> Result<bool>;

    /// Whether the member currently holds `role`.
    async fn has_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<bool>;

    /// Display name of a role.
    async fn role_name(&self, guild: GuildId, role: RoleId) -> Result<Option<String>>;

    /// Year the member joined the guild.
    async fn member_join_year(&self, guild: GuildId, user: UserId) -> Result<Option<i32>>;

    /// IDs of the guild's human (non-bot) members.
    async fn guild_member_ids(&self, guild: GuildId) -> Result<Vec<UserId>>;

    /// False once the message has been deleted.
    async fn message_exists(&self, channel: ChannelId, message: MessageId) -> Result<bool>;
}

/// The parts of a gateway message the bot looks at.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Message ID
    pub id: MessageId,
    /// Channel the message was posted in
    pub channel_id: ChannelId,
    /// Guild, None for direct messages
    pub guild_id: Option<GuildId>,
    /// Author
    pub author_id: UserId,
    /// Author is a bot account
    pub author_is_bot: bool,
    /// Author is this bot
    pub from_self: bool,
    /// Raw message text
    pub content: String,
}

impl IncomingMessage {
    /// Extracts the relevant fields of a serenity message.
    #[must_use]
    pub fn from_serenity(message: &serenity::Message, bot_id: UserId) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            guild_id: message.guild_id,
            author_id: message.author.id,
            author_is_bot: message.author.bot,
            from_self: message.author.id == bot_id,
            content: message.content.clone(),
        }
    }
}

/// [`ChatGateway`] backed by serenity.
#[derive(Clone)]
pub struct SerenityChat {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityChat {
    /// Borrows the HTTP client and cache of a gateway context.
    #[must_use]
    pub fn new(ctx: &serenity::Context) -> Self {
        Self {
            http: Arc::clone(&ctx.http),
            cache: Arc::clone(&ctx.cache),
        }
    }

    fn cache_http(&self) -> (&Arc<serenity::Cache>, &serenity::Http) {
        (&self.cache, self.http.as_ref())
    }

    async fn member(&self, guild: GuildId, user: UserId) -> Result<serenity::Member> {
        guild
            .member(self.cache_http(), user)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl ChatGateway for SerenityChat {
    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<()> {
        channel.say(&self.http, text).await?;
        Ok(())
    }

    async fn send_direct_message(&self, user: UserId, text: &str) -> Result<()> {
        user.direct_message(self.cache_http(), serenity::CreateMessage::new().content(text))
            .await?;
        Ok(())
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        let reaction = serenity::ReactionType::try_from(emoji)
            .map_err(|_| Error::invalid(format!("{emoji} is not an emoji")))?;
        channel.create_reaction(&self.http, message, reaction).await?;
        Ok(())
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(guild, user, role, Some("minefield-bot"))
            .await
            .map_err(Into::into)
    }

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .remove_member_role(guild, user, role, Some("minefield-bot"))
            .await
            .map_err(Into::into)
    }

    async fn can_ban_members(
        &self,
        guild: GuildId,
        channel: ChannelId,
        user: UserId,
    ) -> Result<bool> {
        let member = self.member(guild, user).await?;
        let Some(guild_ref) = self.cache.guild(guild) else {
            return Ok(false);
        };
        let Some(channel_ref) = guild_ref.channels.get(&channel) else {
            return Ok(false);
        };
        Ok(guild_ref
            .user_permissions_in(channel_ref, &member)
            .ban_members())
    }

    async fn has_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<bool> {
        let member = self.member(guild, user).await?;
        Ok(member.roles.contains(&role))
    }

    async fn role_name(&self, guild: GuildId, role: RoleId) -> Result<Option<String>> {
        let cached = self
            .cache
            .guild(guild)
            .and_then(|g| g.roles.get(&role).map(|r| r.name.clone()));
        if cached.is_some() {
            return Ok(cached);
        }
        let roles = guild.roles(&self.http).await?;
        Ok(roles.get(&role).map(|r| r.name.clone()))
    }

    async fn member_join_year(&self, guild: GuildId, user: UserId) -> Result<Option<i32>> {
        let member = self.member(guild, user).await?;
        Ok(member
            .joined_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts.unix_timestamp(), 0))
            .map(|joined| joined.year()))
    }

    async fn guild_member_ids(&self, guild: GuildId) -> Result<Vec<UserId>> {
        let members = guild.members(&self.http, Some(1000), None).await?;
        Ok(members
            .into_iter()
            .filter(|m| !m.user.bot)
            .map(|m| m.user.id)
            .collect())
    }

    async fn message_exists(&self, channel: ChannelId, message: MessageId) -> Result<bool> {
        match channel.message(self.cache_http(), message).await {
            Ok(_) => Ok(true),
            Err(serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response)))
                if response.status_code.as_u16() == 404 =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
