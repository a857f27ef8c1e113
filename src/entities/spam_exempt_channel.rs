//! Channels flagged "spammable": commands used there never start a cooldown.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Spam-exempt channel database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spam_exempt_channels")]
pub struct Model {
    /// Discord channel ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_id: String,
    /// When the flag was set
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
