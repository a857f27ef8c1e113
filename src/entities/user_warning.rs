//! User warning entity - Append-only moderation history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User warning database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_warnings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Discord user ID of the warned member
    pub user_id: String,
    /// Discord user ID of the moderator
    pub issuer_id: String,
    /// Guild the warning was issued in
    pub guild_id: String,
    /// Free-text reason
    pub reason: String,
    /// When the warning was issued
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
