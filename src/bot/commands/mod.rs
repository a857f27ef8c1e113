//! Built-in command handlers, grouped by topic.
//!
//! [`builtin_registry`] is the single place that decides which policy guards each
//! text command.

/// Argument parsing helpers
pub mod args;
/// Stored simple commands and the spammable flag
pub mod custom;
/// 8-ball and reminders
pub mod fun;
/// Ping and help
pub mod general;
/// Mine placement
pub mod minefield;
/// Warnings and server properties
pub mod moderation;
/// React-for-role menus
pub mod react_role;

use crate::{
    bot::{
        BotData,
        dispatch::{CommandRegistry, FnHandler},
        policy::Policies,
    },
    errors::{Error, Result},
};

/// Registry of every built-in text command with its policies applied.
pub fn builtin_registry(marker: char) -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new(marker)?;
    registry
        .register(
            "ping",
            FnHandler::new("ping", general::ping_text).not_spammable(),
        )
        .register(
            "help",
            FnHandler::new("help", general::help_text_command).not_spammable(),
        )
        .register(
            "8ball",
            FnHandler::new("8ball", fun::eight_ball).not_spammable(),
        )
        .register(
            "remindme",
            FnHandler::new("remindme", fun::remind_me).not_spammable(),
        )
        .register(
            "commands",
            FnHandler::new("commands", custom::list_commands).not_spammable(),
        )
        .register(
            "addcommand",
            FnHandler::new("addcommand", custom::add_command).mod_only(),
        )
        .register(
            "removecommand",
            FnHandler::new("removecommand", custom::remove_command).mod_only(),
        )
        .register(
            "addglobalcommand",
            FnHandler::new("addglobalcommand", custom::add_global_command).admin_only(),
        )
        .register(
            "removeglobalcommand",
            FnHandler::new("removeglobalcommand", custom::remove_global_command).admin_only(),
        )
        .register(
            "spammable",
            FnHandler::new("spammable", custom::toggle_spammable).mod_only(),
        )
        .register(
            "warn",
            FnHandler::new("warn", moderation::warn).mod_only(),
        )
        .register(
            "warnings",
            FnHandler::new("warnings", moderation::warnings)
                .not_spammable()
                .mod_only(),
        )
        .register(
            "setproperty",
            FnHandler::new("setproperty", moderation::set_property).admin_only(),
        )
        .register(
            "mine",
            FnHandler::new("mine", minefield::place_mine).mod_only(),
        )
        .register(
            "mines",
            FnHandler::new("mines", minefield::list_mines).mod_only(),
        )
        .register(
            "removemine",
            FnHandler::new("removemine", minefield::remove_mine).mod_only(),
        )
        .register(
            "clearmines",
            FnHandler::new("clearmines", minefield::clear_mines).mod_only(),
        )
        .register(
            "react4role",
            FnHandler::new("react4role", react_role::react_for_role).mod_only(),
        );
    Ok(registry)
}

/// Slash commands registered with Discord.
#[must_use]
pub fn slash_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![general::ping(), general::help()]
}
