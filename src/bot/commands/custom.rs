//! Stored simple commands and the spammable channel flag.

use crate::{
    bot::{
        commands::args::split_first,
        dispatch::{CommandContext, HandlerFuture},
    },
    core::{simple_command, spam},
    errors::{Error, Result},
};
use tracing::info;

/// Normalises a user-supplied key to `marker + lower-cased word`.
fn command_key(ctx: &CommandContext, raw: &str) -> Result<String> {
    let marker = ctx.data.registry.marker();
    let name = raw.strip_prefix(marker).unwrap_or(raw);
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::invalid(format!(
            "`{raw}` is not a valid command name; use letters, digits and `_`"
        )));
    }
    let key = format!("{marker}{}", name.to_lowercase());
    if ctx.data.registry.is_builtin(&key) {
        return Err(Error::invalid(format!("`{key}` is a built-in command")));
    }
    Ok(key)
}

fn guild_scope(ctx: &CommandContext) -> Result<String> {
    ctx.guild_key()
        .ok_or_else(|| Error::invalid("this command only works in a server"))
}

async fn add(ctx: &CommandContext, scope: &str, usage: &str) -> Result<bool> {
    let (raw, response) = split_first(ctx.args(), usage)?;
    let key = command_key(ctx, raw)?;
    simple_command::add_simple_command(
        ctx.db(),
        &key,
        response,
        scope,
        &ctx.message.author_id.to_string(),
    )
    .await?;
    info!("Added command {} in scope {:?}", key, scope);
    ctx.reply(&format!("✅ Added `{key}`.")).await?;
    Ok(true)
}

async fn remove(ctx: &CommandContext, scope: &str, usage: &str) -> Result<bool> {
    let raw = ctx.args();
    if raw.is_empty() {
        return Err(Error::invalid(format!("usage: `{usage}`")));
    }
    let key = command_key(ctx, raw)?;
    match simple_command::remove_simple_command(ctx.db(), &key, scope).await {
        Ok(()) => {
            ctx.reply(&format!("✅ Removed `{key}`.")).await?;
            Ok(true)
        }
        Err(Error::NoRowsAffected { .. }) => {
            ctx.reply(&format!("❌ There is no command `{key}` here."))
                .await?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// `addcommand <key> <response>`
pub fn add_command(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let scope = guild_scope(ctx)?;
        add(ctx, &scope, "addcommand <key> <response>").await
    })
}

/// `addglobalcommand <key> <response>`
pub fn add_global_command(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(add(
        ctx,
        simple_command::GLOBAL_SCOPE,
        "addglobalcommand <key> <response>",
    ))
}

/// `removecommand <key>`
pub fn remove_command(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let scope = guild_scope(ctx)?;
        remove(ctx, &scope, "removecommand <key>").await
    })
}

/// `removeglobalcommand <key>`
pub fn remove_global_command(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(remove(
        ctx,
        simple_command::GLOBAL_SCOPE,
        "removeglobalcommand <key>",
    ))
}

/// `commands`: stored commands usable here.
pub fn list_commands(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let scope = ctx.guild_key().unwrap_or_default();
        let commands = simple_command::list_simple_commands(ctx.db(), &scope).await?;
        if commands.is_empty() {
            ctx.reply("No custom commands yet.").await?;
            return Ok(true);
        }
        let mut keys: Vec<&str> = commands.iter().map(|c| c.key.as_str()).collect();
        keys.dedup();
        let list = keys
            .iter()
            .map(|key| format!("`{key}`"))
            .collect::<Vec<_>>()
            .join(", ");
        ctx.reply(&format!("Custom commands: {list}")).await?;
        Ok(true)
    })
}

/// `spammable`: toggles the cooldown exemption of the current channel.
pub fn toggle_spammable(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let channel = ctx.message.channel_id.to_string();
        let exempt = spam::toggle_channel_exempt(ctx.db(), &channel).await?;
        let text = if exempt {
            "✅ This channel is now spammable: commands here never start a cooldown."
        } else {
            "✅ This channel is no longer spammable."
        };
        ctx.reply(text).await?;
        Ok(true)
    })
}
