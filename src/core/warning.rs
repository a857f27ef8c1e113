//! User warnings - Append-only moderation history per guild.

use crate::{
    entities::{UserWarning, user_warning},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Records a warning.
pub async fn add_warning(
    db: &DatabaseConnection,
    user_id: &str,
    issuer_id: &str,
    guild_id: &str,
    reason: &str,
) -> Result<user_warning::Model> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::invalid("a warning needs a reason"));
    }

    user_warning::ActiveModel {
        user_id: Set(user_id.to_string()),
        issuer_id: Set(issuer_id.to_string()),
        guild_id: Set(guild_id.to_string()),
        reason: Set(reason.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A user's warnings in one guild, oldest first.
pub async fn get_warnings(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
) -> Result<Vec<user_warning::Model>> {
    UserWarning::find()
        .filter(user_warning::Column::UserId.eq(user_id))
        .filter(user_warning::Column::GuildId.eq(guild_id))
        .order_by_asc(user_warning::Column::CreatedAt)
        .order_by_asc(user_warning::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
