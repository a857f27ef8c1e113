//! Policy wrappers around command handlers.
//!
//! A wrapper checks its precondition and either delegates to the inner handler or
//! answers the user itself and reports failure. Wrappers nest: the outermost one
//! is checked first, so `handler.not_spammable().mod_only()` rejects non-moderators
//! before looking at their cooldown.

use crate::{
    bot::dispatch::{CommandContext, CommandHandler},
    core::spam,
};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

/// Reply sent to non-admins invoking an admin-only command.
pub const ADMIN_ONLY_MESSAGE: &str = "⛔ Only the bot admin can use this command.";

/// Reply sent to non-moderators invoking a moderator-only command.
pub const MOD_ONLY_MESSAGE: &str = "⛔ Only moderators can use this command.";

/// Reaction put on a message rejected for spamming.
pub const COOLDOWN_REACTION: &str = "🚫";

/// Runs the inner handler only for the configured admin.
pub struct AdminOnly<H> {
    inner: H,
}

/// Runs the inner handler for the admin and for members allowed to ban in the channel.
pub struct ModOnly<H> {
    inner: H,
}

/// Rejects users still inside their cooldown window, unless the channel is spammable.
///
/// The window is claimed before the inner handler runs, so two commands arriving
/// together cannot both get through. A failing handler hands the window back.
pub struct NotSpammable<H> {
    inner: H,
}

/// Builder methods for wrapping any handler in a policy.
pub trait Policies: CommandHandler + Sized {
    /// Wraps in [`AdminOnly`].
    fn admin_only(self) -> AdminOnly<Self> {
        AdminOnly { inner: self }
    }

    /// Wraps in [`ModOnly`].
    fn mod_only(self) -> ModOnly<Self> {
        ModOnly { inner: self }
    }

    /// Wraps in [`NotSpammable`].
    fn not_spammable(self) -> NotSpammable<Self> {
        NotSpammable { inner: self }
    }
}

impl<H: CommandHandler + Sized> Policies for H {}

async fn reply_or_log(ctx: &CommandContext, text: &str) {
    if let Err(e) = ctx.reply(text).await {
        warn!("Failed to send policy rejection: {}", e);
    }
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for AdminOnly<H> {
    async fn handle(&self, ctx: &CommandContext) -> bool {
        if !ctx.is_admin() {
            debug!("{} is not the admin", ctx.message.author_id);
            reply_or_log(ctx, ADMIN_ONLY_MESSAGE).await;
            return false;
        }
        self.inner.handle(ctx).await
    }
}

/// Whether the author of `ctx` counts as a moderator.
pub async fn is_moderator(ctx: &CommandContext) -> bool {
    if ctx.is_admin() {
        return true;
    }
    let Some(guild) = ctx.message.guild_id else {
        return false;
    };
    ctx.chat
        .can_ban_members(guild, ctx.message.channel_id, ctx.message.author_id)
        .await
        .unwrap_or_else(|e| {
            warn!(
                "Permission lookup for {} failed: {}",
                ctx.message.author_id, e
            );
            false
        })
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for ModOnly<H> {
    async fn handle(&self, ctx: &CommandContext) -> bool {
        if !is_moderator(ctx).await {
            reply_or_log(ctx, MOD_ONLY_MESSAGE).await;
            return false;
        }
        self.inner.handle(ctx).await
    }
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for NotSpammable<H> {
    async fn handle(&self, ctx: &CommandContext) -> bool {
        if ctx.is_admin() {
            return self.inner.handle(ctx).await;
        }

        let channel = ctx.message.channel_id.to_string();
        let exempt = spam::is_channel_exempt_from_cooldown(ctx.db(), &channel)
            .await
            .unwrap_or_else(|e| {
                warn!("Spam exemption lookup failed for {}: {}", channel, e);
                false
            });

        let author = ctx.message.author_id;
        let reservation = if exempt {
            None
        } else if let Some(reservation) =
            ctx.data.cooldowns.try_reserve(author.get(), Utc::now())
        {
            Some(reservation)
        } else {
            debug!("{} is on cooldown", author);
            let until = ctx
                .data
                .cooldowns
                .expires_at(author.get())
                .map_or_else(String::new, |t| format!(" You can use commands again <t:{}:R>.", t.timestamp()));
            let notice = format!("Please stop spamming commands.{until}");
            if let Err(e) = ctx.chat.send_direct_message(author, &notice).await {
                warn!("Failed to send cooldown notice to {}: {}", author, e);
            }
            if let Err(e) = ctx
                .chat
                .react(ctx.message.channel_id, ctx.message.id, COOLDOWN_REACTION)
                .await
            {
                warn!("Failed to react to spam message: {}", e);
            }
            return false;
        };

        let succeeded = self.inner.handle(ctx).await;
        if let (false, Some(reservation)) = (succeeded, reservation) {
            ctx.data.cooldowns.release(reservation);
        }
        succeeded
    }
}
