//! Server property entity - Per-guild key-value settings such as the timeout role.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Server property database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "server_properties")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Guild the property belongs to
    pub guild_id: String,
    /// Property name (e.g. `"timeout_role"`)
    pub name: String,
    /// Property value stored as string
    pub value: String,
    /// When this property was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
