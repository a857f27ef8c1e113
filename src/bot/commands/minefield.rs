//! Mine placement commands.
//!
//! Confirmations and listings go to the moderator by direct message so the
//! channel does not learn where the mines are.

use crate::{
    bot::{
        commands::args::split_args,
        dispatch::{CommandContext, HandlerFuture},
    },
    core::mine::{self, NewMineSet},
    entities::mine_set,
    errors::{Error, Result},
};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::warn;

/// Reaction confirming a mine command.
pub const CONFIRM_REACTION: &str = "✅";

/// Flags of `mine`.
#[derive(Debug, Parser)]
#[command(
    name = "mine",
    no_binary_name = true,
    allow_negative_numbers = true,
    about = "Places a set of mines in this channel"
)]
pub struct MineArgs {
    /// How many times the set can go off
    #[arg(short, long, default_value_t = 1)]
    pub amount: i64,
    /// Chance per message, e.g. 0.05
    #[arg(short, long)]
    pub chance: Option<f64>,
    /// Go off when a message contains this text instead of by chance
    #[arg(short, long)]
    pub text: Option<String>,
    /// Seconds the timeout role is held
    #[arg(short, long, default_value_t = 60)]
    pub duration: i64,
    /// Custom message; supports {user}, {joinyear}, {year} and {role}
    #[arg(short, long)]
    pub message: Option<String>,
    /// Cover every channel of the server
    #[arg(short, long)]
    pub global: bool,
}

/// Outcome of parsing `mine` arguments.
#[derive(Debug)]
pub enum MineRequest {
    /// Place a set
    Place(MineArgs),
    /// `--help` was asked for; carries the rendered help
    Help(String),
}

/// Parses `mine` arguments. Malformed flags become [`Error::InvalidArgument`].
pub fn parse_mine_args(args: &str) -> Result<MineRequest> {
    match MineArgs::try_parse_from(split_args(args)) {
        Ok(parsed) => Ok(MineRequest::Place(parsed)),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            Ok(MineRequest::Help(e.render().to_string()))
        }
        Err(e) => Err(Error::invalid(format!("```\n{}\n```", e.render()))),
    }
}

fn guild(ctx: &CommandContext) -> Result<String> {
    ctx.guild_key()
        .ok_or_else(|| Error::invalid("this command only works in a server"))
}

async fn confirm(ctx: &CommandContext, text: &str) -> Result<()> {
    ctx.chat
        .send_direct_message(ctx.message.author_id, text)
        .await?;
    if let Err(e) = ctx
        .chat
        .react(ctx.message.channel_id, ctx.message.id, CONFIRM_REACTION)
        .await
    {
        warn!("Failed to confirm mine command: {}", e);
    }
    Ok(())
}

/// One line describing a set.
#[must_use]
pub fn describe(set: &mine_set::Model) -> String {
    let scope = set
        .channel_id
        .as_deref()
        .map_or_else(|| "whole server".to_string(), |c| format!("<#{c}>"));
    let trigger = set.trigger_text.as_deref().map_or_else(
        || format!("{:.2}% per message", set.chance * 100.0),
        |text| format!("text \"{text}\""),
    );
    format!(
        "#{} - {} left, {}, {}s timeout, {}",
        set.id, set.amount, trigger, set.duration_secs, scope
    )
}

/// `mine [-a N] [-c P] [-t TEXT] [-d SECS] [-m MESSAGE] [-g]`
pub fn place_mine(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let args = match parse_mine_args(ctx.args())? {
            MineRequest::Place(args) => args,
            MineRequest::Help(help) => {
                ctx.reply(&format!("```\n{help}\n```")).await?;
                return Ok(false);
            }
        };

        let set = mine::add_mine_set(
            ctx.db(),
            &ctx.data.config.mines,
            NewMineSet {
                guild_id: guild,
                channel_id: (!args.global).then(|| ctx.message.channel_id.to_string()),
                amount: args.amount,
                chance: args.chance,
                trigger_text: args.text,
                duration_secs: args.duration,
                message: args.message,
                created_by: ctx.message.author_id.to_string(),
            },
        )
        .await?;

        confirm(ctx, &format!("💣 Mines placed: {}", describe(&set))).await?;
        Ok(true)
    })
}

/// `mines`
pub fn list_mines(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let sets = mine::get_mine_sets_for_guild(ctx.db(), &guild).await?;
        let text = if sets.is_empty() {
            "There are no mines in this server.".to_string()
        } else {
            let lines: Vec<String> = sets.iter().map(describe).collect();
            format!("**Mine sets**\n{}", lines.join("\n"))
        };
        confirm(ctx, &text).await?;
        Ok(true)
    })
}

/// `removemine <id>`
pub fn remove_mine(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let id: i32 = ctx
            .args()
            .trim_start_matches('#')
            .parse()
            .map_err(|_| Error::invalid("usage: `removemine <id>`"))?;
        match mine::remove_mine_set(ctx.db(), id, &guild).await {
            Ok(()) => {
                confirm(ctx, &format!("🧹 Removed mine set #{id}.")).await?;
                Ok(true)
            }
            Err(Error::NoRowsAffected { .. }) => {
                ctx.reply(&format!("❌ There is no mine set #{id} in this server."))
                    .await?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    })
}

/// `clearmines`
pub fn clear_mines(ctx: &CommandContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let guild = guild(ctx)?;
        let removed = mine::remove_all_mine_sets(ctx.db(), &guild).await?;
        confirm(ctx, &format!("🧹 Removed {removed} mine sets.")).await?;
        Ok(true)
    })
}
