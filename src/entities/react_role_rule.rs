//! React-for-role rule entity.
//!
//! Reacting to `message_id` with `emoji` grants `role_id`, optionally only to
//! members already holding `required_role_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// React-for-role rule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "react_role_rules")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Channel holding the rule message
    pub channel_id: String,
    /// The rule message
    pub message_id: String,
    /// Custom emoji ID, or the unicode emoji itself
    pub emoji: String,
    /// Role granted on reaction
    pub role_id: String,
    /// Role a member must already hold
    pub required_role_id: Option<String>,
    /// When the rule was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
