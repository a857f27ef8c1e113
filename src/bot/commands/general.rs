//! General commands - ping and help, as slash commands and as text commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say(super::PONG).await?;
        Ok(())
    }

    /// Lists the available text commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let text = super::help_text(&ctx.data().registry.keys());
        ctx.say(text).await?;
        Ok(())
    }
}

pub use inner::*;

use crate::bot::dispatch::{CommandContext, HandlerFuture};

const PONG: &str = "Pong!";

/// Help listing for the given command keys.
#[must_use]
pub fn help_text(keys: &[&str]) -> String {
    let list = keys
        .iter()
        .map(|key| format!("`{key}`"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "**Minefield Bot Help**\n\
        Text commands: {list}\n\
        Moderators can also add their own with `addcommand`."
    )
}

/// `ping`
pub fn ping_text(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        ctx.reply(PONG).await?;
        Ok(true)
    })
}

/// `help`
pub fn help_text_command(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        ctx.reply(&help_text(&ctx.data.registry.keys())).await?;
        Ok(true)
    })
}
