//! Command registry - resolves a message to at most one handler and runs it.
//!
//! Resolution order:
//! 1. messages from the bot itself, or without the marker, are ignored;
//! 2. the key is the leading `marker + word characters` token, lower-cased;
//! 3. built-in handlers win;
//! 4. otherwise a stored simple command (guild scope before global) is replied,
//!    behind the not-spammable policy;
//! 5. unknown keys do nothing.
//!
//! After a handler reports success the invocation is logged and, for non-admins
//! outside spammable channels, the author's cooldown restarts.

use crate::{
    bot::{BotData, chat::ChatGateway, chat::IncomingMessage, notify, policy::Policies},
    core::{simple_command, spam},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a handler gets to see about one invocation.
#[derive(Clone)]
pub struct CommandContext {
    /// Shared bot state
    pub data: BotData,
    /// Chat API
    pub chat: Arc<dyn ChatGateway>,
    /// The invoking message
    pub message: IncomingMessage,
}

impl CommandContext {
    /// Database connection shortcut.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.data.database
    }

    /// Whether the author is the configured admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        let admin = self.data.config.admin_id;
        admin != 0 && self.message.author_id.get() == admin
    }

    /// Everything after the command key, trimmed.
    #[must_use]
    pub fn args(&self) -> &str {
        self.message
            .content
            .trim_start()
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim())
    }

    /// Guild ID as stored in the database, None in direct messages.
    #[must_use]
    pub fn guild_key(&self) -> Option<String> {
        self.message.guild_id.map(|g| g.to_string())
    }

    /// Posts `text` in the invoking channel.
    pub async fn reply(&self, text: &str) -> Result<()> {
        self.chat.send_message(self.message.channel_id, text).await
    }

    /// Reports an internal failure to the admin.
    pub async fn notify_admin(&self, context: &str, detail: &str) {
        notify::notify_admin(self.chat.as_ref(), self.data.config.admin_id, context, detail).await;
    }
}

/// A command handler. Returns whether the command succeeded.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the command.
    async fn handle(&self, ctx: &CommandContext) -> bool;
}

/// Boxed future returned by function handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// Signature of a function handler.
pub type HandlerFn = for<'a> fn(&'a CommandContext) -> HandlerFuture<'a>;

/// Adapts a fallible handler function into a [`CommandHandler`].
///
/// Invalid arguments and quota errors are replied to the user; every other error is
/// logged and forwarded to the admin. Either way the command counts as failed.
pub struct FnHandler {
    name: &'static str,
    func: HandlerFn,
}

impl FnHandler {
    /// Wraps `func`; `name` is only used in logs.
    #[must_use]
    pub const fn new(name: &'static str, func: HandlerFn) -> Self {
        Self { name, func }
    }
}

#[async_trait]
impl CommandHandler for FnHandler {
    async fn handle(&self, ctx: &CommandContext) -> bool {
        match (self.func)(ctx).await {
            Ok(succeeded) => succeeded,
            Err(Error::InvalidArgument { message }) => {
                debug!("Command {} rejected input: {}", self.name, message);
                if let Err(e) = ctx.reply(&format!("❌ {message}")).await {
                    warn!("Failed to send usage error: {}", e);
                }
                false
            }
            Err(e @ Error::MineQuotaExceeded { .. }) => {
                if let Err(e) = ctx.reply(&format!("❌ {e}")).await {
                    warn!("Failed to send quota error: {}", e);
                }
                false
            }
            Err(e) => {
                ctx.notify_admin(&format!("Command `{}` failed", self.name), &e.to_string())
                    .await;
                false
            }
        }
    }
}

/// Replies with a fixed text; used for stored simple commands.
pub struct SimpleReply {
    response: String,
}

impl SimpleReply {
    /// Creates a reply handler.
    #[must_use]
    pub const fn new(response: String) -> Self {
        Self { response }
    }
}

#[async_trait]
impl CommandHandler for SimpleReply {
    async fn handle(&self, ctx: &CommandContext) -> bool {
        match ctx.reply(&self.response).await {
            Ok(()) => true,
            Err(e) => {
                ctx.notify_admin("Simple command reply failed", &e.to_string())
                    .await;
                false
            }
        }
    }
}

/// What happened to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command (own message, no marker)
    Ignored,
    /// No built-in or stored command with this key
    Unknown {
        /// Resolved key
        key: String,
    },
    /// The handler ran, or a policy stopped it, and reported failure
    Failed {
        /// Resolved key
        key: String,
    },
    /// The handler reported success
    Succeeded {
        /// Resolved key
        key: String,
    },
}

/// Lookup table of built-in commands keyed by lower-cased `marker + name`.
pub struct CommandRegistry {
    marker: char,
    key_pattern: Regex,
    builtins: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Creates an empty registry for commands starting with `marker`.
    pub fn new(marker: char) -> Result<Self> {
        let pattern = format!(r"^{}\w+", regex::escape(&marker.to_string()));
        let key_pattern = Regex::new(&pattern).map_err(|e| Error::Config {
            message: format!("invalid command marker {marker:?}: {e}"),
        })?;
        Ok(Self {
            marker,
            key_pattern,
            builtins: HashMap::new(),
        })
    }

    /// The command marker.
    #[must_use]
    pub const fn marker(&self) -> char {
        self.marker
    }

    /// Registers a built-in under `marker + name`, replacing any previous one.
    pub fn register(&mut self, name: &str, handler: impl CommandHandler + 'static) -> &mut Self {
        let key = format!("{}{}", self.marker, name.to_lowercase());
        self.builtins.insert(key, Box::new(handler));
        self
    }

    /// Extracts the lower-cased command key from a message, if it has one.
    #[must_use]
    pub fn command_key(&self, content: &str) -> Option<String> {
        self.key_pattern
            .find(content)
            .map(|m| m.as_str().to_lowercase())
    }

    /// Whether `key` names a built-in.
    #[must_use]
    pub fn is_builtin(&self, key: &str) -> bool {
        self.builtins.contains_key(&key.to_lowercase())
    }

    /// Built-in keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Resolves and runs the command in `ctx.message`.
    pub async fn dispatch(&self, ctx: &CommandContext) -> DispatchOutcome {
        if ctx.message.from_self {
            return DispatchOutcome::Ignored;
        }
        let Some(key) = self.command_key(&ctx.message.content) else {
            return DispatchOutcome::Ignored;
        };

        let succeeded = if let Some(handler) = self.builtins.get(&key) {
            handler.handle(ctx).await
        } else {
            let guild = ctx.guild_key();
            match simple_command::get_simple_command_response(ctx.db(), &key, guild.as_deref())
                .await
            {
                Ok(Some(response)) => SimpleReply::new(response).not_spammable().handle(ctx).await,
                Ok(None) => {
                    debug!("No command matches {}", key);
                    return DispatchOutcome::Unknown { key };
                }
                Err(e) => {
                    ctx.notify_admin("Simple command lookup failed", &e.to_string())
                        .await;
                    return DispatchOutcome::Failed { key };
                }
            }
        };

        if !succeeded {
            return DispatchOutcome::Failed { key };
        }

        info!(
            "Command {} used by {} in guild {:?}",
            key, ctx.message.author_id, ctx.message.guild_id
        );
        self.record_cooldown(ctx).await;
        DispatchOutcome::Succeeded { key }
    }

    async fn record_cooldown(&self, ctx: &CommandContext) {
        if ctx.is_admin() {
            return;
        }
        let channel = ctx.message.channel_id.to_string();
        let exempt = spam::is_channel_exempt_from_cooldown(ctx.db(), &channel)
            .await
            .unwrap_or_else(|e| {
                warn!("Spam exemption lookup failed for {}: {}", channel, e);
                false
            });
        if !exempt {
            ctx.data
                .cooldowns
                .touch(ctx.message.author_id.get(), Utc::now());
        }
    }
}
