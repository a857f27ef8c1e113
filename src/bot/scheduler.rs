//! Detached, non-cancellable delayed actions.
//!
//! Each call spawns one tokio task that sleeps and then performs a single
//! best-effort chat call. Timers for the same member and role are not coalesced;
//! a second removal of an already removed role is a no-op on Discord's side.

use crate::bot::chat::ChatGateway;
use poise::serenity_prelude::{GuildId, RoleId, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Removes `role` from `user` after `after` has elapsed.
pub fn schedule_role_removal(
    chat: Arc<dyn ChatGateway>,
    guild: GuildId,
    user: UserId,
    role: RoleId,
    after: Duration,
) -> JoinHandle<()> {
    debug!(
        "Scheduling removal of role {} from {} in {:?}",
        role, user, after
    );
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        match chat.remove_role(guild, user, role).await {
            Ok(()) => debug!("Removed role {} from {}", role, user),
            Err(e) => warn!("Failed to remove role {} from {}: {}", role, user, e),
        }
    })
}

/// Sends `text` to `user` by direct message after `after` has elapsed.
pub fn schedule_direct_message(
    chat: Arc<dyn ChatGateway>,
    user: UserId,
    text: String,
    after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Err(e) = chat.send_direct_message(user, &text).await {
            warn!("Failed to deliver reminder to {}: {}", user, e);
        }
    })
}
