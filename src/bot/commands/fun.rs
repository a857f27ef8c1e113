//! Light-hearted commands: the magic 8-ball and reminders.

use crate::{
    bot::{
        commands::args,
        dispatch::{CommandContext, HandlerFuture},
        scheduler,
    },
    core::weighted::WeightedTable,
    errors::Error,
};
use rand::Rng;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::info;

static EIGHT_BALL: LazyLock<WeightedTable<&'static str>> = LazyLock::new(|| {
    WeightedTable::new(vec![
        ("It is certain.", 4),
        ("Without a doubt.", 4),
        ("You may rely on it.", 3),
        ("Most likely.", 3),
        ("Signs point to yes.", 3),
        ("Reply hazy, try again.", 2),
        ("Ask again later.", 2),
        ("Better not tell you now.", 2),
        ("Don't count on it.", 3),
        ("My sources say no.", 3),
        ("Very doubtful.", 3),
        ("Watch your step. There may be mines about.", 1),
    ])
});

/// Picks an 8-ball answer.
pub fn eight_ball_answer<R: Rng>(rng: &mut R) -> &'static str {
    EIGHT_BALL
        .pick(rng)
        .copied()
        .unwrap_or("Reply hazy, try again.")
}

/// `8ball <question>`
pub fn eight_ball(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        if ctx.args().is_empty() {
            return Err(Error::invalid("usage: `8ball <question>`"));
        }
        let answer = eight_ball_answer(&mut rand::rng());
        ctx.reply(&format!("🎱 {answer}")).await?;
        Ok(true)
    })
}

/// Validates a reminder request against the configured maximum.
pub fn reminder_delay(args: &str, max_seconds: u64) -> crate::errors::Result<(Duration, String)> {
    let (delay, text) = args::parse_delay(args)?;
    if delay > Duration::from_secs(max_seconds) {
        return Err(Error::invalid(format!(
            "reminders can be at most {} hours away",
            max_seconds / 3600
        )));
    }
    Ok((delay, text))
}

/// `remindme <N>h <N>m <N>s <text>`
pub fn remind_me(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let (delay, text) = reminder_delay(ctx.args(), ctx.data.config.max_reminder_seconds)?;
        let author = ctx.message.author_id;
        info!("Scheduling a reminder for {} in {:?}", author, delay);
        scheduler::schedule_direct_message(
            Arc::clone(&ctx.chat),
            author,
            format!("⏰ Reminder: {text}"),
            delay,
        );
        ctx.reply(&format!(
            "Okay <@{author}>, I will remind you in {}.",
            format_delay(delay)
        ))
        .await?;
        Ok(true)
    })
}

fn format_delay(delay: Duration) -> String {
    let total = delay.as_secs();
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}
