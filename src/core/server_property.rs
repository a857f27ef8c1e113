//! Per-guild key-value properties.

use crate::{
    entities::{ServerProperty, server_property},
    errors::Result,
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info};

/// Property naming the role used as a timeout substitute.
pub const TIMEOUT_ROLE: &str = "timeout_role";

/// Reads a property of a guild.
pub async fn get_server_property(
    db: &DatabaseConnection,
    guild_id: &str,
    name: &str,
) -> Result<Option<String>> {
    let row = ServerProperty::find()
        .filter(server_property::Column::GuildId.eq(guild_id))
        .filter(server_property::Column::Name.eq(name))
        .one(db)
        .await?;
    debug!("Server property {}/{}: {:?}", guild_id, name, row);
    Ok(row.map(|r| r.value))
}

/// Inserts or replaces a property of a guild.
pub async fn set_server_property(
    db: &DatabaseConnection,
    guild_id: &str,
    name: &str,
    value: &str,
) -> Result<()> {
    let existing = ServerProperty::find()
        .filter(server_property::Column::GuildId.eq(guild_id))
        .filter(server_property::Column::Name.eq(name))
        .one(db)
        .await?;

    let now = chrono::Utc::now();
    match existing {
        Some(row) => {
            let mut active: server_property::ActiveModel = row.into();
            active.value = Set(value.to_string());
            active.updated_at = Set(now);
            active.update(db).await?;
        }
        None => {
            server_property::ActiveModel {
                guild_id: Set(guild_id.to_string()),
                name: Set(name.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    info!("Set server property {}/{} = {}", guild_id, name, value);
    Ok(())
}
