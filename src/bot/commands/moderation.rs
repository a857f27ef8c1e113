//! Moderation commands: warnings and server properties.

use crate::{
    bot::{
        commands::args::{parse_user_mention, split_first},
        dispatch::{CommandContext, HandlerFuture},
    },
    core::{server_property, warning},
    errors::{Error, Result},
};
use tracing::info;

fn guild(ctx: &CommandContext) -> Result<String> {
    ctx.guild_key()
        .ok_or_else(|| Error::invalid("this command only works in a server"))
}

/// `warn <@user> <reason>`
pub fn warn(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let (target, reason) = split_first(ctx.args(), "warn <@user> <reason>")?;
        let user = parse_user_mention(target)
            .ok_or_else(|| Error::invalid("the first argument must mention a user"))?;

        warning::add_warning(
            ctx.db(),
            &user.to_string(),
            &ctx.message.author_id.to_string(),
            &guild,
            reason,
        )
        .await?;
        let count = warning::get_warnings(ctx.db(), &user.to_string(), &guild)
            .await?
            .len();
        info!("{} warned {} ({} warnings)", ctx.message.author_id, user, count);

        ctx.reply(&format!("⚠️ <@{user}> has been warned. Warnings: {count}"))
            .await?;
        if let Err(e) = ctx
            .chat
            .send_direct_message(user, &format!("⚠️ You received a warning: {reason}"))
            .await
        {
            tracing::warn!("Could not tell {} about their warning: {}", user, e);
        }
        Ok(true)
    })
}

/// `warnings <@user>`
pub fn warnings(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let user = parse_user_mention(ctx.args())
            .ok_or_else(|| Error::invalid("usage: `warnings <@user>`"))?;
        let list = warning::get_warnings(ctx.db(), &user.to_string(), &guild).await?;
        if list.is_empty() {
            ctx.reply(&format!("<@{user}> has no warnings.")).await?;
            return Ok(true);
        }

        let mut text = format!("**Warnings for <@{user}>** ({})\n", list.len());
        for (number, entry) in list.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} - by <@{}> on {}\n",
                number + 1,
                entry.reason,
                entry.issuer_id,
                entry.created_at.format("%Y-%m-%d")
            ));
        }
        ctx.reply(&text).await?;
        Ok(true)
    })
}

/// `setproperty <name> <value>`
pub fn set_property(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let (name, value) = split_first(ctx.args(), "setproperty <name> <value>")?;
        let name = name.to_lowercase();
        let value = if name == server_property::TIMEOUT_ROLE {
            value
                .trim_start_matches("<@&")
                .trim_end_matches('>')
                .parse::<u64>()
                .map_err(|_| Error::invalid("timeout_role must be a role mention or ID"))?
                .to_string()
        } else {
            value.to_string()
        };
        server_property::set_server_property(ctx.db(), &guild, &name, &value).await?;
        ctx.reply(&format!("✅ `{name}` is now `{value}`.")).await?;
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::dispatch::DispatchOutcome;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_warn_and_list() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        chat.add_moderator(MODERATOR);

        let ctx = test_context(
            &data,
            &chat,
            test_message(&format!("!warn <@{USER}> being rude"), MODERATOR),
        );
        assert!(warn(&ctx).await?);
        assert_eq!(chat.direct_messages_to(USER).len(), 1);

        let ctx = test_context(
            &data,
            &chat,
            test_message(&format!("!warnings <@{USER}>"), MODERATOR),
        );
        assert!(warnings(&ctx).await?);
        let listing = chat.channel_messages().pop().unwrap_or_default();
        assert!(listing.contains("being rude"));
        assert!(listing.contains(&format!("<@{MODERATOR}>")));
        Ok(())
    }

    #[tokio::test]
    async fn test_warn_requires_mention_and_reason() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        for content in ["!warn", "!warn <@200>", "!warn bob for reasons"] {
            let ctx = test_context(&data, &chat, test_message(content, ADMIN));
            assert!(matches!(warn(&ctx).await, Err(Error::InvalidArgument { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_warn_is_mod_only() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        let ctx = test_context(
            &data,
            &chat,
            test_message(&format!("!warn <@{MODERATOR}> no"), USER),
        );
        assert!(matches!(
            data.registry.dispatch(&ctx).await,
            DispatchOutcome::Failed { .. }
        ));
        assert!(
            warning::get_warnings(&data.database, &MODERATOR.to_string(), &GUILD.to_string())
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_set_timeout_role_property() -> Result<()> {
        let (data, chat) = setup_bot().await?;
        let ctx = test_context(&data, &chat, test_message("!setproperty timeout_role <@&700>", ADMIN));
        assert!(set_property(&ctx).await?);
        assert_eq!(
            server_property::get_server_property(
                &data.database,
                &GUILD.to_string(),
                server_property::TIMEOUT_ROLE
            )
            .await?,
            Some("700".to_string())
        );

        let bad = test_context(&data, &chat, test_message("!setproperty timeout_role muted", ADMIN));
        assert!(matches!(set_property(&bad).await, Err(Error::InvalidArgument { .. })));
        Ok(())
    }
}
