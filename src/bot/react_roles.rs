//! Reaction-driven role grants.
//!
//! Rules are created by `react4role`; here they are applied when members react and
//! pruned once their message is gone.

use crate::{
    bot::{BotData, chat::ChatGateway, notify},
    core::react_role,
    entities::react_role_rule,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, GuildId, MessageId, RoleId, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The parts of a reaction event the rules look at.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    /// Guild, None in direct messages
    pub guild_id: Option<GuildId>,
    /// Channel of the reacted message
    pub channel_id: ChannelId,
    /// Reacted message
    pub message_id: MessageId,
    /// Reacting user
    pub user_id: Option<UserId>,
    /// Reacting user is a bot
    pub user_is_bot: bool,
    /// Emoji identity as stored in rules
    pub emoji_key: String,
}

impl ReactionEvent {
    /// Extracts the relevant fields of a serenity reaction.
    #[must_use]
    pub fn from_serenity(reaction: &serenity::Reaction, bot_id: UserId) -> Self {
        let emoji_key = match &reaction.emoji {
            serenity::ReactionType::Custom { id, .. } => id.to_string(),
            serenity::ReactionType::Unicode(text) => text.clone(),
            other => react_role::emoji_identity(&other.to_string()),
        };
        let user_is_bot = reaction.user_id == Some(bot_id)
            || reaction.member.as_ref().is_some_and(|m| m.user.bot);
        Self {
            guild_id: reaction.guild_id,
            channel_id: reaction.channel_id,
            message_id: reaction.message_id,
            user_id: reaction.user_id,
            user_is_bot,
            emoji_key,
        }
    }
}

fn parse_role(raw: &str) -> Option<RoleId> {
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Some(RoleId::new(id)),
        _ => {
            warn!("Ignoring react-for-role rule with role {:?}", raw);
            None
        }
    }
}

async fn matching_rule(
    data: &BotData,
    event: &ReactionEvent,
) -> Result<Option<(GuildId, UserId, react_role_rule::Model)>> {
    if event.user_is_bot {
        return Ok(None);
    }
    let (Some(guild), Some(user)) = (event.guild_id, event.user_id) else {
        return Ok(None);
    };
    let rule = react_role::find_rule(
        &data.database,
        &event.channel_id.to_string(),
        &event.message_id.to_string(),
        &event.emoji_key,
    )
    .await?;
    Ok(rule.map(|rule| (guild, user, rule)))
}

/// Grants the rule's role when the reacting member holds the required role.
/// Returns whether a role was granted.
pub async fn on_reaction_add(
    data: &BotData,
    chat: &dyn ChatGateway,
    event: &ReactionEvent,
) -> Result<bool> {
    let Some((guild, user, rule)) = matching_rule(data, event).await? else {
        return Ok(false);
    };
    let Some(role) = parse_role(&rule.role_id) else {
        return Ok(false);
    };

    if let Some(required) = rule.required_role_id.as_deref() {
        let Some(required) = parse_role(required) else {
            return Ok(false);
        };
        if !chat.has_role(guild, user, required).await? {
            debug!("{} lacks required role {} for {}", user, required, role);
            return Ok(false);
        }
    }

    chat.add_role(guild, user, role).await?;
    info!("Granted role {} to {} by reaction", role, user);
    Ok(true)
}

/// Removes the rule's role again. Returns whether a rule matched.
pub async fn on_reaction_remove(
    data: &BotData,
    chat: &dyn ChatGateway,
    event: &ReactionEvent,
) -> Result<bool> {
    let Some((guild, user, rule)) = matching_rule(data, event).await? else {
        return Ok(false);
    };
    let Some(role) = parse_role(&rule.role_id) else {
        return Ok(false);
    };
    chat.remove_role(guild, user, role).await?;
    info!("Removed role {} from {} by reaction", role, user);
    Ok(true)
}

/// Deletes the rules of every message that no longer exists.
/// Returns how many rules were removed.
pub async fn sweep_deleted_messages(data: &BotData, chat: &dyn ChatGateway) -> Result<u64> {
    let mut removed = 0;
    for (channel, message) in react_role::get_rule_messages(&data.database).await? {
        let (Ok(channel_id), Ok(message_id)) = (channel.parse::<u64>(), message.parse::<u64>())
        else {
            removed += react_role::delete_rules_for_message(&data.database, &channel, &message)
                .await?;
            continue;
        };
        if channel_id == 0 || message_id == 0 {
            continue;
        }
        match chat
            .message_exists(ChannelId::new(channel_id), MessageId::new(message_id))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                removed +=
                    react_role::delete_rules_for_message(&data.database, &channel, &message)
                        .await?;
            }
            Err(e) => warn!("Could not check message {} in {}: {}", message, channel, e),
        }
    }
    if removed > 0 {
        info!("Swept {} react-for-role rules of deleted messages", removed);
    }
    Ok(removed)
}

/// Runs [`sweep_deleted_messages`] every `react_role_sweep_seconds`.
pub fn spawn_sweeper(data: BotData, chat: Arc<dyn ChatGateway>) -> JoinHandle<()> {
    let period = Duration::from_secs(data.config.react_role_sweep_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_deleted_messages(&data, chat.as_ref()).await {
                notify::notify_admin(
                    chat.as_ref(),
                    data.config.admin_id,
                    "React-for-role sweep failed",
                    &e.to_string(),
                )
                .await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::react_role::{ParsedRule, add_rules, get_rule_messages};
    use crate::test_utils::*;

    const GRANT: u64 = 800;
    const REQUIRED: u64 = 900;

    fn event(emoji: &str, user: u64) -> ReactionEvent {
        ReactionEvent {
            guild_id: Some(GuildId::new(GUILD)),
            channel_id: ChannelId::new(CHANNEL),
            message_id: MessageId::new(MESSAGE),
            user_id: Some(UserId::new(user)),
            user_is_bot: false,
            emoji_key: emoji.to_string(),
        }
    }

    async fn store_rule(data: &BotData, emoji: &str, required: Option<u64>) -> Result<()> {
        add_rules(
            &data.database,
            &CHANNEL.to_string(),
            &MESSAGE.to_string(),
            &[ParsedRule {
                emoji: emoji.to_string(),
                emoji_key: emoji.to_string(),
                role_id: GRANT.to_string(),
                required_role_id: required.map(|r| r.to_string()),
            }],
        )
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_reaction_grants_and_removes_role() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        store_rule(&data, "🍎", None).await?;

        assert!(on_reaction_add(&data, chat.as_ref(), &event("🍎", USER)).await?);
        assert!(on_reaction_remove(&data, chat.as_ref(), &event("🍎", USER)).await?);
        assert_eq!(
            chat.actions(),
            vec![
                ChatAction::RoleAdded {
                    guild: GUILD,
                    user: USER,
                    role: GRANT
                },
                ChatAction::RoleRemoved {
                    guild: GUILD,
                    user: USER,
                    role: GRANT
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_emoji_and_bots_are_ignored() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        store_rule(&data, "🍎", None).await?;

        assert!(!on_reaction_add(&data, chat.as_ref(), &event("🍌", USER)).await?);
        let mut bot = event("🍎", USER);
        bot.user_is_bot = true;
        assert!(!on_reaction_add(&data, chat.as_ref(), &bot).await?);
        assert!(chat.actions().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_required_role_is_enforced() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        store_rule(&data, "🍎", Some(REQUIRED)).await?;

        assert!(!on_reaction_add(&data, chat.as_ref(), &event("🍎", USER)).await?);
        assert!(chat.actions().is_empty());

        chat.give_role(USER, REQUIRED);
        assert!(on_reaction_add(&data, chat.as_ref(), &event("🍎", USER)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_sweep_drops_rules_of_deleted_messages() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        store_rule(&data, "🍎", None).await?;

        assert_eq!(sweep_deleted_messages(&data, chat.as_ref()).await?, 0);
        assert_eq!(get_rule_messages(&data.database).await?.len(), 1);

        chat.delete_message(CHANNEL, MESSAGE);
        assert_eq!(sweep_deleted_messages(&data, chat.as_ref()).await?, 1);
        assert!(get_rule_messages(&data.database).await?.is_empty());
        Ok(())
    }
}
