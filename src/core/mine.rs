//! Mine set storage - Placement validation, active-set queries and decrements.
//!
//! A set is active while `amount > 0`. Decrementing to zero (or below) deletes the
//! row, so exhausted sets never come back from [`get_active_mine_sets`].
//! The decrement is a single UPDATE; two near-simultaneous triggers may both see the
//! same amount before either lands.

use crate::{
    config::MineLimits,
    entities::{MineSet, mine_set},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Parameters of a mine set before validation.
#[derive(Debug, Clone, Default)]
pub struct NewMineSet {
    /// Owning guild
    pub guild_id: String,
    /// Channel scope, None for the whole guild
    pub channel_id: Option<String>,
    /// Requested number of triggers
    pub amount: i64,
    /// Requested chance, None for the configured default
    pub chance: Option<f64>,
    /// Substring trigger; disables the probabilistic trigger
    pub trigger_text: Option<String>,
    /// Requested timeout duration in seconds
    pub duration_secs: i64,
    /// Custom message template
    pub message: Option<String>,
    /// Moderator placing the set
    pub created_by: String,
}

/// Validates and clamps `new` against `limits`, then stores it.
///
/// Called by the `mine` command once its flags are parsed. Amount and duration are
/// clamped to their maxima; chance is clamped into `[min_chance, max_chance]` unless
/// a trigger text is given, in which case it is 0. The per-guild quota is checked
/// before anything is written.
pub async fn add_mine_set(
    db: &DatabaseConnection,
    limits: &MineLimits,
    new: NewMineSet,
) -> Result<mine_set::Model> {
    let existing = MineSet::find()
        .filter(mine_set::Column::GuildId.eq(new.guild_id.as_str()))
        .count(db)
        .await?;
    if existing >= limits.max_sets_per_guild {
        return Err(Error::MineQuotaExceeded {
            limit: limits.max_sets_per_guild,
        });
    }

    if new.amount < 1 {
        return Err(Error::invalid("amount must be at least 1"));
    }
    let amount = i32::try_from(new.amount.min(i64::from(limits.max_amount)))
        .unwrap_or(limits.max_amount);

    if new.duration_secs < 0 {
        return Err(Error::invalid("duration cannot be negative"));
    }
    let duration_secs = new.duration_secs.min(limits.max_duration_seconds);

    let trigger_text = new
        .trigger_text
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    if let Some(text) = &trigger_text {
        if text.chars().count() > limits.max_trigger_length {
            return Err(Error::invalid(format!(
                "trigger text is longer than {} characters",
                limits.max_trigger_length
            )));
        }
    }

    let message = new.message.filter(|m| !m.trim().is_empty());
    if let Some(message) = &message {
        if message.chars().count() > limits.max_message_length {
            return Err(Error::invalid(format!(
                "message is longer than {} characters",
                limits.max_message_length
            )));
        }
    }

    let chance = if trigger_text.is_some() {
        0.0
    } else {
        let requested = new.chance.unwrap_or(limits.default_chance);
        if !requested.is_finite() {
            return Err(Error::invalid("chance must be a number"));
        }
        requested.clamp(limits.min_chance, limits.max_chance)
    };

    let model = mine_set::ActiveModel {
        guild_id: Set(new.guild_id),
        channel_id: Set(new.channel_id),
        amount: Set(amount),
        chance: Set(chance),
        trigger_text: Set(trigger_text),
        duration_secs: Set(duration_secs),
        message: Set(message),
        created_by: Set(new.created_by),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = model.insert(db).await?;
    info!(
        "Placed mine set {} in guild {} (amount {}, chance {}, text {:?})",
        result.id, result.guild_id, result.amount, result.chance, result.trigger_text
    );
    Ok(result)
}

/// Active sets that apply to a message in `channel_id` of `guild_id`: the
/// channel's own sets plus the guild-wide ones.
///
/// Read on every guild message by the mine engine, so exhausted sets must already
/// be gone from the table for them to stop firing.
pub async fn get_active_mine_sets(
    db: &DatabaseConnection,
    guild_id: &str,
    channel_id: &str,
) -> Result<Vec<mine_set::Model>> {
    MineSet::find()
        .filter(mine_set::Column::GuildId.eq(guild_id))
        .filter(mine_set::Column::Amount.gt(0))
        .filter(
            Condition::any()
                .add(mine_set::Column::ChannelId.eq(channel_id))
                .add(mine_set::Column::ChannelId.is_null()),
        )
        .order_by_asc(mine_set::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every set of a guild, oldest first.
///
/// Used by the `mines` listing, which shows channel and guild-wide sets together.
pub async fn get_mine_sets_for_guild(
    db: &DatabaseConnection,
    guild_id: &str,
) -> Result<Vec<mine_set::Model>> {
    MineSet::find()
        .filter(mine_set::Column::GuildId.eq(guild_id))
        .order_by_asc(mine_set::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Subtracts `by` from the set's amount and deletes it once exhausted.
///
/// The subtraction is a single `UPDATE` so two messages firing the same set both
/// count. Returns the remaining amount, 0 when the set was removed.
///
/// # Errors
/// [`Error::NoRowsAffected`] when the set no longer exists.
pub async fn decrement_mine_set(db: &DatabaseConnection, id: i32, by: i32) -> Result<i32> {
    let updated = MineSet::update_many()
        .col_expr(
            mine_set::Column::Amount,
            Expr::col(mine_set::Column::Amount).sub(by),
        )
        .filter(mine_set::Column::Id.eq(id))
        .exec(db)
        .await?;
    if updated.rows_affected == 0 {
        return Err(Error::NoRowsAffected {
            what: format!("mine set {id}"),
        });
    }

    let remaining = MineSet::find_by_id(id)
        .one(db)
        .await?
        .map_or(0, |set| set.amount);
    if remaining <= 0 {
        MineSet::delete_by_id(id).exec(db).await?;
        debug!("Mine set {} exhausted and removed", id);
        return Ok(0);
    }
    Ok(remaining)
}

/// Removes one set, which must belong to `guild_id`.
///
/// The guild filter keeps moderators from removing sets of other servers by ID.
///
/// # Errors
/// [`Error::NoRowsAffected`] when the guild has no set with that ID.
pub async fn remove_mine_set(db: &DatabaseConnection, id: i32, guild_id: &str) -> Result<()> {
    let result = MineSet::delete_many()
        .filter(mine_set::Column::Id.eq(id))
        .filter(mine_set::Column::GuildId.eq(guild_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NoRowsAffected {
            what: format!("mine set {id} in guild {guild_id}"),
        });
    }
    Ok(())
}

/// Removes every set of a guild and returns how many were removed.
///
/// Backs `clearmines`; a guild without sets yields 0 rather than an error.
pub async fn remove_all_mine_sets(db: &DatabaseConnection, guild_id: &str) -> Result<u64> {
    let result = MineSet::delete_many()
        .filter(mine_set::Column::GuildId.eq(guild_id))
        .exec(db)
        .await?;
    info!(
        "Removed {} mine sets from guild {}",
        result.rows_affected, guild_id
    );
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_amount_is_clamped_to_max() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits {
            max_amount: 50,
            ..MineLimits::default()
        };

        let set = add_mine_set(
            &db,
            &limits,
            NewMineSet {
                amount: 999,
                ..test_new_mine("guild", Some("chan"))
            },
        )
        .await?;

        assert_eq!(set.amount, 50);
        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_text_forces_zero_chance() -> Result<()> {
        let db = setup_test_db().await?;
        let set = add_mine_set(
            &db,
            &MineLimits::default(),
            NewMineSet {
                chance: Some(0.15),
                trigger_text: Some("  boom ".to_string()),
                ..test_new_mine("guild", None)
            },
        )
        .await?;

        assert_eq!(set.chance, 0.0);
        assert_eq!(set.trigger_text.as_deref(), Some("boom"));
        Ok(())
    }

    #[tokio::test]
    async fn test_chance_is_clamped_into_band() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits::default();

        let high = add_mine_set(
            &db,
            &limits,
            NewMineSet {
                chance: Some(0.9),
                ..test_new_mine("guild", None)
            },
        )
        .await?;
        let low = add_mine_set(
            &db,
            &limits,
            NewMineSet {
                chance: Some(0.0),
                ..test_new_mine("guild", None)
            },
        )
        .await?;
        let default = add_mine_set(&db, &limits, test_new_mine("guild", None)).await?;

        assert_eq!(high.chance, limits.max_chance);
        assert_eq!(low.chance, limits.min_chance);
        assert_eq!(default.chance, limits.default_chance);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits {
            max_message_length: 5,
            ..MineLimits::default()
        };

        let zero = add_mine_set(
            &db,
            &limits,
            NewMineSet {
                amount: 0,
                ..test_new_mine("guild", None)
            },
        )
        .await;
        assert!(matches!(zero, Err(Error::InvalidArgument { .. })));

        let long_message = add_mine_set(
            &db,
            &limits,
            NewMineSet {
                message: Some("far too long".to_string()),
                ..test_new_mine("guild", None)
            },
        )
        .await;
        assert!(matches!(long_message, Err(Error::InvalidArgument { .. })));

        let nan = add_mine_set(
            &db,
            &limits,
            NewMineSet {
                chance: Some(f64::NAN),
                ..test_new_mine("guild", None)
            },
        )
        .await;
        assert!(matches!(nan, Err(Error::InvalidArgument { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_quota_per_guild() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits {
            max_sets_per_guild: 2,
            ..MineLimits::default()
        };

        add_mine_set(&db, &limits, test_new_mine("guild", None)).await?;
        add_mine_set(&db, &limits, test_new_mine("guild", None)).await?;
        let third = add_mine_set(&db, &limits, test_new_mine("guild", None)).await;
        assert!(matches!(third, Err(Error::MineQuotaExceeded { limit: 2 })));

        // Other guilds have their own quota
        add_mine_set(&db, &limits, test_new_mine("other", None)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_active_sets_respect_scope() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits::default();
        let global = add_mine_set(&db, &limits, test_new_mine("guild", None)).await?;
        let here = add_mine_set(&db, &limits, test_new_mine("guild", Some("here"))).await?;
        add_mine_set(&db, &limits, test_new_mine("guild", Some("elsewhere"))).await?;
        add_mine_set(&db, &limits, test_new_mine("other", None)).await?;

        let active = get_active_mine_sets(&db, "guild", "here").await?;
        let ids: Vec<i32> = active.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![global.id, here.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_amount_set_is_exhausted_after_one_decrement() -> Result<()> {
        let db = setup_test_db().await?;
        let set = add_mine_set(
            &db,
            &MineLimits::default(),
            NewMineSet {
                amount: 1,
                ..test_new_mine("guild", Some("chan"))
            },
        )
        .await?;

        assert_eq!(decrement_mine_set(&db, set.id, 1).await?, 0);
        assert!(get_active_mine_sets(&db, "guild", "chan").await?.is_empty());
        assert!(MineSet::find_by_id(set.id).one(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_large_decrement_exhausts_small_set() -> Result<()> {
        let db = setup_test_db().await?;
        let set = add_mine_set(
            &db,
            &MineLimits::default(),
            NewMineSet {
                amount: 6,
                ..test_new_mine("guild", None)
            },
        )
        .await?;

        assert_eq!(decrement_mine_set(&db, set.id, 4).await?, 2);
        assert_eq!(decrement_mine_set(&db, set.id, 4).await?, 0);
        assert!(get_mine_sets_for_guild(&db, "guild").await?.is_empty());

        let missing = decrement_mine_set(&db, set.id, 1).await;
        assert!(matches!(missing, Err(Error::NoRowsAffected { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_mine_set_checks_guild() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits::default();
        let set = add_mine_set(&db, &limits, test_new_mine("guild", None)).await?;

        let wrong_guild = remove_mine_set(&db, set.id, "other").await;
        assert!(matches!(wrong_guild, Err(Error::NoRowsAffected { .. })));

        remove_mine_set(&db, set.id, "guild").await?;
        assert!(get_mine_sets_for_guild(&db, "guild").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_all_mine_sets() -> Result<()> {
        let db = setup_test_db().await?;
        let limits = MineLimits::default();
        add_mine_set(&db, &limits, test_new_mine("guild", None)).await?;
        add_mine_set(&db, &limits, test_new_mine("guild", Some("c"))).await?;
        add_mine_set(&db, &limits, test_new_mine("other", None)).await?;

        assert_eq!(remove_all_mine_sets(&db, "guild").await?, 2);
        assert!(get_mine_sets_for_guild(&db, "guild").await?.is_empty());
        assert_eq!(get_mine_sets_for_guild(&db, "other").await?.len(), 1);
        Ok(())
    }
}
