//! Bot layer - Discord-specific interface, command dispatch and the mine engine
//!
//! Text commands go through [`dispatch::CommandRegistry`] rather than poise's prefix
//! parser, so stored simple commands and policy wrappers share one resolution path.
//! Poise only hosts the slash commands and the gateway event hook.

/// Chat API seam and its serenity implementation
pub mod chat;
/// Built-in command handlers
pub mod commands;
/// Command resolution and handler plumbing
pub mod dispatch;
/// Gateway event routing
pub mod events;
/// Mine trigger engine
pub mod mines;
/// Admin diagnostics
pub mod notify;
/// Admin-only, moderator-only and cooldown wrappers
pub mod policy;
/// Reaction-driven role grants and the stale rule sweep
pub mod react_roles;
/// Delayed role removals and reminders
pub mod scheduler;

use crate::{
    config::BotConfig,
    core::cooldown::CooldownService,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared state available to every handler.
#[derive(Clone)]
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<BotConfig>,
    /// Per-user command cooldowns
    pub cooldowns: Arc<CooldownService>,
    /// Built-in text commands
    pub registry: Arc<dispatch::CommandRegistry>,
}

impl BotData {
    /// Builds the shared state and registers the built-in commands.
    pub fn new(database: DatabaseConnection, config: BotConfig) -> Result<Self> {
        let registry = commands::builtin_registry(config.command_marker)?;
        Ok(Self {
            database,
            cooldowns: Arc::new(CooldownService::new(config.cooldown_seconds)),
            config: Arc::new(config),
            registry: Arc::new(registry),
        })
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling {}: {:?}", event.snake_case_name(), error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and runs until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, config: BotConfig, database: DatabaseConnection) -> Result<()> {
    let data = BotData::new(database, config)?;
    info!(
        "Registered {} text commands with marker '{}'",
        data.registry.keys().len(),
        data.registry.marker()
    );

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::slash_commands(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering slash commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let chat = Arc::new(chat::SerenityChat::new(ctx));
                react_roles::spawn_sweeper(data.clone(), chat);
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
