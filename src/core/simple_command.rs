//! Simple commands - Stored literal responses, scoped to a guild or global.
//!
//! The global scope is the empty guild ID. When both scopes define a key, the
//! guild-scoped response wins.

use crate::{
    entities::{SimpleCommand, simple_command},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};

/// Guild ID used for commands available everywhere.
pub const GLOBAL_SCOPE: &str = "";

/// Looks up the response for `key`, preferring the row of `guild_id` over the global one.
///
/// The dispatcher calls this for every command key that is not a built-in.
/// Messages outside a guild (`guild_id` None) only see global commands.
pub async fn get_simple_command_response(
    db: &DatabaseConnection,
    key: &str,
    guild_id: Option<&str>,
) -> Result<Option<String>> {
    let scope = Condition::any().add(simple_command::Column::GuildId.eq(GLOBAL_SCOPE));
    let scope = match guild_id {
        Some(guild) => scope.add(simple_command::Column::GuildId.eq(guild)),
        None => scope,
    };

    let rows = SimpleCommand::find()
        .filter(simple_command::Column::Key.eq(key.to_lowercase()))
        .filter(scope)
        .all(db)
        .await?;

    let chosen = rows
        .iter()
        .find(|row| row.guild_id != GLOBAL_SCOPE)
        .or_else(|| rows.first());
    Ok(chosen.map(|row| row.response.clone()))
}

/// Stores a new command. Fails if the key already exists in that scope.
///
/// A guild command may shadow a global one with the same key; the unique index on
/// `(key, guild_id)` only rejects duplicates within one scope.
pub async fn add_simple_command(
    db: &DatabaseConnection,
    key: &str,
    response: &str,
    guild_id: &str,
    created_by: &str,
) -> Result<simple_command::Model> {
    let key = key.to_lowercase();
    if response.trim().is_empty() {
        return Err(Error::invalid("the response cannot be empty"));
    }

    let existing = SimpleCommand::find()
        .filter(simple_command::Column::Key.eq(key.as_str()))
        .filter(simple_command::Column::GuildId.eq(guild_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::invalid(format!("`{key}` already exists")));
    }

    let model = simple_command::ActiveModel {
        key: Set(key),
        response: Set(response.to_string()),
        guild_id: Set(guild_id.to_string()),
        created_by: Set(created_by.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Deletes `key` from exactly the given scope.
///
/// # Errors
/// [`Error::NoRowsAffected`] when no such command exists in that scope.
pub async fn remove_simple_command(
    db: &DatabaseConnection,
    key: &str,
    guild_id: &str,
) -> Result<()> {
    let result = SimpleCommand::delete_many()
        .filter(simple_command::Column::Key.eq(key.to_lowercase()))
        .filter(simple_command::Column::GuildId.eq(guild_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NoRowsAffected {
            what: format!("command `{key}`"),
        });
    }
    Ok(())
}

/// Commands visible from a guild (its own plus the global ones), sorted by key.
///
/// Feeds the `commands` listing. A key defined in both scopes is listed once per
/// scope.
pub async fn list_simple_commands(
    db: &DatabaseConnection,
    guild_id: &str,
) -> Result<Vec<simple_command::Model>> {
    SimpleCommand::find()
        .filter(
            Condition::any()
                .add(simple_command::Column::GuildId.eq(guild_id))
                .add(simple_command::Column::GuildId.eq(GLOBAL_SCOPE)),
        )
        .order_by_asc(simple_command::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}
