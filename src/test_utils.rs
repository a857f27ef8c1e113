//! Shared test utilities.
//!
//! Provides an in-memory database, a fully wired [`BotData`], and
//! [`RecordingChat`], a [`ChatGateway`] that records every outbound call instead
//! of talking to Discord.

use crate::{
    bot::{
        BotData,
        chat::{ChatGateway, IncomingMessage},
        dispatch::CommandContext,
    },
    config::{BotConfig, MineLimits},
    core::mine::NewMineSet,
    errors::{Error, Result},
};
use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, GuildId, MessageId, RoleId, UserId};
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::EnvFilter;

/// The configured admin
pub const ADMIN: u64 = 100;
/// A regular member
pub const USER: u64 = 200;
/// A member allowed to ban
pub const MODERATOR: u64 = 300;
/// Channel of test messages
pub const CHANNEL: u64 = 400;
/// Guild of test messages
pub const GUILD: u64 = 500;
/// ID of test messages
pub const MESSAGE: u64 = 600;
/// Role configured as timeout role in mine tests
pub const TEST_TIMEOUT_ROLE: u64 = 700;

/// Installs a test-writer subscriber; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Mine set parameters with sensible defaults.
///
/// # Defaults
/// * amount: 3
/// * chance: configured default
/// * duration: 60 seconds
pub fn test_new_mine(guild: &str, channel: Option<&str>) -> NewMineSet {
    NewMineSet {
        guild_id: guild.to_string(),
        channel_id: channel.map(str::to_string),
        amount: 3,
        duration_secs: 60,
        created_by: MODERATOR.to_string(),
        ..NewMineSet::default()
    }
}

/// Configuration used by [`setup_bot`]: [`ADMIN`] is admin, a 60 second cooldown
/// and nukes disabled.
pub fn test_config() -> BotConfig {
    BotConfig {
        admin_id: ADMIN,
        cooldown_seconds: 60,
        mines: MineLimits {
            nuke_chance: 0.0,
            ..MineLimits::default()
        },
        ..BotConfig::default()
    }
}

/// Bot state over a fresh database, plus the recorder it should talk to.
pub async fn setup_bot() -> Result<(BotData, Arc<RecordingChat>)> {
    setup_bot_with(test_config()).await
}

/// Like [`setup_bot`] with a custom configuration.
pub async fn setup_bot_with(config: BotConfig) -> Result<(BotData, Arc<RecordingChat>)> {
    let db = setup_test_db().await?;
    let data = BotData::new(db, config)?;
    Ok((data, Arc::new(RecordingChat::default())))
}

/// A guild message in [`CHANNEL`] of [`GUILD`].
pub fn test_message(content: &str, author: u64) -> IncomingMessage {
    IncomingMessage {
        id: MessageId::new(MESSAGE),
        channel_id: ChannelId::new(CHANNEL),
        guild_id: Some(GuildId::new(GUILD)),
        author_id: UserId::new(author),
        author_is_bot: false,
        from_self: false,
        content: content.to_string(),
    }
}

/// Command context for `message`.
pub fn test_context(
    data: &BotData,
    chat: &Arc<RecordingChat>,
    message: IncomingMessage,
) -> CommandContext {
    let chat: Arc<dyn ChatGateway> = Arc::clone(chat) as Arc<dyn ChatGateway>;
    CommandContext {
        data: data.clone(),
        chat,
        message,
    }
}

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Channel message
    Message { channel: u64, text: String },
    /// Direct message
    DirectMessage { user: u64, text: String },
    /// Reaction on a message
    Reaction {
        channel: u64,
        message: u64,
        emoji: String,
    },
    /// Role granted
    RoleAdded { guild: u64, user: u64, role: u64 },
    /// Role removed
    RoleRemoved { guild: u64, user: u64, role: u64 },
}

#[derive(Default)]
struct ChatState {
    actions: Vec<ChatAction>,
    moderators: HashSet<u64>,
    members: Vec<u64>,
    role_names: HashMap<u64, String>,
    join_years: HashMap<u64, i32>,
    member_roles: HashSet<(u64, u64)>,
    deleted_messages: HashSet<(u64, u64)>,
    fail_role_changes: bool,
}

/// In-memory [`ChatGateway`] that records what the bot does.
#[derive(Default)]
pub struct RecordingChat {
    state: Mutex<ChatState>,
}

impl RecordingChat {
    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, action: ChatAction) {
        self.state().actions.push(action);
    }

    /// Every recorded call, oldest first.
    pub fn actions(&self) -> Vec<ChatAction> {
        self.state().actions.clone()
    }

    /// Texts of channel messages, oldest first.
    pub fn channel_messages(&self) -> Vec<String> {
        self.state()
            .actions
            .iter()
            .filter_map(|a| match a {
                ChatAction::Message { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts of direct messages sent to `user`.
    pub fn direct_messages_to(&self, user: u64) -> Vec<String> {
        self.state()
            .actions
            .iter()
            .filter_map(|a| match a {
                ChatAction::DirectMessage { user: to, text } if *to == user => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Lets `user` ban members.
    pub fn add_moderator(&self, user: u64) {
        self.state().moderators.insert(user);
    }

    /// Sets the guild's human members.
    pub fn set_members(&self, members: &[u64]) {
        self.state().members = members.to_vec();
    }

    /// Names a role.
    pub fn set_role_name(&self, role: u64, name: &str) {
        self.state().role_names.insert(role, name.to_string());
    }

    /// Sets the year `user` joined.
    pub fn set_join_year(&self, user: u64, year: i32) {
        self.state().join_years.insert(user, year);
    }

    /// Gives `user` a role without recording an action.
    pub fn give_role(&self, user: u64, role: u64) {
        self.state().member_roles.insert((user, role));
    }

    /// Marks a message as deleted.
    pub fn delete_message(&self, channel: u64, message: u64) {
        self.state().deleted_messages.insert((channel, message));
    }

    /// Makes every role grant and removal fail.
    pub fn fail_role_changes(&self) {
        self.state().fail_role_changes = true;
    }
}

#[async_trait]
impl ChatGateway for RecordingChat {
    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<()> {
        self.record(ChatAction::Message {
            channel: channel.get(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_direct_message(&self, user: UserId, text: &str) -> Result<()> {
        self.record(ChatAction::DirectMessage {
            user: user.get(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.record(ChatAction::Reaction {
            channel: channel.get(),
            message: message.get(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        let mut state = self.state();
        if state.fail_role_changes {
            return Err(Error::invalid("missing permissions"));
        }
        state.member_roles.insert((user.get(), role.get()));
        state.actions.push(ChatAction::RoleAdded {
            guild: guild.get(),
            user: user.get(),
            role: role.get(),
        });
        Ok(())
    }

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        let mut state = self.state();
        if state.fail_role_changes {
            return Err(Error::invalid("missing permissions"));
        }
        state.member_roles.remove(&(user.get(), role.get()));
        state.actions.push(ChatAction::RoleRemoved {
            guild: guild.get(),
            user: user.get(),
            role: role.get(),
        });
        Ok(())
    }

    async fn can_ban_members(
        &self,
        _guild: GuildId,
        _channel: ChannelId,
        user: UserId,
    ) -> Result<bool> {
        Ok(self.state().moderators.contains(&user.get()))
    }

    async fn has_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<bool> {
        Ok(self.state().member_roles.contains(&(user.get(), role.get())))
    }

    async fn role_name(&self, _guild: GuildId, role: RoleId) -> Result<Option<String>> {
        Ok(self.state().role_names.get(&role.get()).cloned())
    }

    async fn member_join_year(&self, _guild: GuildId, user: UserId) -> Result<Option<i32>> {
        Ok(self.state().join_years.get(&user.get()).copied())
    }

    async fn guild_member_ids(&self, _guild: GuildId) -> Result<Vec<UserId>> {
        Ok(self
            .state()
            .members
            .iter()
            .map(|id| UserId::new(*id))
            .collect())
    }

    async fn message_exists(&self, channel: ChannelId, message: MessageId) -> Result<bool> {
        Ok(!self
            .state()
            .deleted_messages
            .contains(&(channel.get(), message.get())))
    }
}
