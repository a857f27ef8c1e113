//! `react4role`: turns the invoking message into a role menu.

use crate::{
    bot::dispatch::{CommandContext, HandlerFuture},
    core::react_role,
    errors::{Error, Result},
};
use tracing::warn;

const USAGE: &str = "usage: `react4role` followed by one `<emoji> <@&role> [<@&required role>]` per line";

/// `react4role` + rule lines
pub fn react_for_role(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        if ctx.message.guild_id.is_none() {
            return Err(Error::invalid("this command only works in a server"));
        }
        let body = ctx.args();
        if body.is_empty() {
            return Err(Error::invalid(USAGE));
        }
        let rules = react_role::parse_rule_lines(body)?;

        let channel = ctx.message.channel_id.to_string();
        let message = ctx.message.id.to_string();
        react_role::add_rules(ctx.db(), &channel, &message, &rules).await?;

        for rule in &rules {
            if let Err(e) = ctx
                .chat
                .react(ctx.message.channel_id, ctx.message.id, &rule.emoji)
                .await
            {
                warn!("Reacting with {} failed: {}", rule.emoji, e);
                react_role::delete_rules_for_message(ctx.db(), &channel, &message).await?;
                return Err(Error::invalid(format!(
                    "I could not react with {}; no rules were saved",
                    rule.emoji
                )));
            }
        }
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::dispatch::DispatchOutcome;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_rules_are_stored_and_reacted() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        chat.add_moderator(MODERATOR);
        let ctx = test_context(
            &data,
            &chat,
            test_message("!react4role\n🍎 <@&11>\n<:party:22> <@&33> <@&44>", MODERATOR),
        );

        assert!(matches!(
            data.registry.dispatch(&ctx).await,
            DispatchOutcome::Succeeded { .. }
        ));
        let emojis: Vec<String> = chat
            .actions()
            .into_iter()
            .filter_map(|a| match a {
                ChatAction::Reaction { emoji, .. } => Some(emoji),
                _ => None,
            })
            .collect();
        assert_eq!(emojis, vec!["🍎".to_string(), "<:party:22>".to_string()]);

        let rule = react_role::find_rule(
            &data.database,
            &CHANNEL.to_string(),
            &MESSAGE.to_string(),
            "22",
        )
        .await?;
        assert_eq!(rule.and_then(|r| r.required_role_id), Some("44".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_rules_are_rejected() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        let ctx = test_context(&data, &chat, test_message("!react4role\n🍎 apples", ADMIN));
        assert!(matches!(
            react_for_role(&ctx).await,
            Err(Error::InvalidArgument { .. })
        ));
        assert!(react_role::get_rule_messages(&data.database).await?.is_empty());
        Ok(())
    }
}
