//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    MineSet, ReactRoleRule, ServerProperty, SimpleCommand, SimpleCommandColumn,
    SpamExemptChannel, UserWarning,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/minefield.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// File path of a `sqlite://` URL, None for in-memory databases and other backends.
fn sqlite_file_path(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

/// Establishes a connection to the database named by `DATABASE_URL`, creating the
/// directory of a `SQLite` file first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(parent) = sqlite_file_path(&database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table the bot uses, skipping the ones that already exist.
///
/// Also creates the unique `(key, guild_id)` index on simple commands, which the
/// entity macros cannot express.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, MineSet).await?;
    create_table(db, &schema, SimpleCommand).await?;
    create_table(db, &schema, SpamExemptChannel).await?;
    create_table(db, &schema, UserWarning).await?;
    create_table(db, &schema, ReactRoleRule).await?;
    create_table(db, &schema, ServerProperty).await?;

    let index = Index::create()
        .name("idx_simple_commands_key_guild")
        .table(SimpleCommand)
        .col(SimpleCommandColumn::Key)
        .col(SimpleCommandColumn::GuildId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&index)).await?;

    info!("Database tables ensured.");
    Ok(())
}
