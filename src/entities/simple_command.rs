//! Simple command entity - A stored literal key-to-response mapping.
//!
//! `guild_id` is empty for globally scoped commands. `(key, guild_id)` is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Simple command database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "simple_commands")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Lower-cased command key including the marker (e.g. `"!rules"`)
    pub key: String,
    /// Text sent back when the command is invoked
    pub response: String,
    /// Owning guild ID, empty string for global
    pub guild_id: String,
    /// Discord user ID of the creator
    pub created_by: String,
    /// When the command was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
