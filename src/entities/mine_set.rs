//! Mine set entity - A batch of chat-triggered traps scoped to a guild or one channel.
//!
//! A set fires either on a case-insensitive substring match of `trigger_text` or,
//! when no trigger text is configured, with probability `chance` per message.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mine set database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mine_sets")]
pub struct Model {
    /// Unique identifier for the set
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Discord guild ID the set belongs to
    pub guild_id: String,
    /// Discord channel ID, or None for every channel of the guild
    pub channel_id: Option<String>,
    /// Remaining triggers; the row is deleted once this reaches zero
    pub amount: i32,
    /// Per-message trigger probability, zero when `trigger_text` is set
    pub chance: f64,
    /// Substring that triggers the set
    pub trigger_text: Option<String>,
    /// Seconds the timeout role is held, zero for message only
    pub duration_secs: i64,
    /// Custom message template
    pub message: Option<String>,
    /// Discord user ID of the moderator who placed the set
    pub created_by: String,
    /// When the set was placed
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
