//! Spam-exempt ("spammable") channels, where commands never start a cooldown.

use crate::{
    entities::{SpamExemptChannel, spam_exempt_channel},
    errors::Result,
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Whether commands used in `channel_id` skip the cooldown.
pub async fn is_channel_exempt_from_cooldown(
    db: &DatabaseConnection,
    channel_id: &str,
) -> Result<bool> {
    let row = SpamExemptChannel::find_by_id(channel_id.to_string())
        .one(db)
        .await?;
    Ok(row.is_some())
}

/// Flags or unflags a channel.
pub async fn set_channel_exempt(
    db: &DatabaseConnection,
    channel_id: &str,
    exempt: bool,
) -> Result<()> {
    let currently = is_channel_exempt_from_cooldown(db, channel_id).await?;
    match (currently, exempt) {
        (false, true) => {
            spam_exempt_channel::ActiveModel {
                channel_id: Set(channel_id.to_string()),
                created_at: Set(chrono::Utc::now()),
            }
            .insert(db)
            .await?;
        }
        (true, false) => {
            SpamExemptChannel::delete_by_id(channel_id.to_string())
                .exec(db)
                .await?;
        }
        _ => return Ok(()),
    }
    info!("Channel {} spam exemption set to {}", channel_id, exempt);
    Ok(())
}

/// Flips the flag and returns the new state.
pub async fn toggle_channel_exempt(db: &DatabaseConnection, channel_id: &str) -> Result<bool> {
    let exempt = !is_channel_exempt_from_cooldown(db, channel_id).await?;
    set_channel_exempt(db, channel_id, exempt).await?;
    Ok(exempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_toggle_channel_exempt() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(!is_channel_exempt_from_cooldown(&db, "chan").await?);

        assert!(toggle_channel_exempt(&db, "chan").await?);
        assert!(is_channel_exempt_from_cooldown(&db, "chan").await?);
        assert!(!is_channel_exempt_from_cooldown(&db, "other").await?);

        assert!(!toggle_channel_exempt(&db, "chan").await?);
        assert!(!is_channel_exempt_from_cooldown(&db, "chan").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_channel_exempt_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        set_channel_exempt(&db, "chan", true).await?;
        set_channel_exempt(&db, "chan", true).await?;
        assert!(is_channel_exempt_from_cooldown(&db, "chan").await?);
        Ok(())
    }
}
