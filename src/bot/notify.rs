//! Administrative notification channel.
//!
//! Internal failures are delivered to the configured admin by direct message.
//! Delivery problems are only logged; nothing here returns an error.

use crate::bot::chat::ChatGateway;
use poise::serenity_prelude::UserId;
use tracing::{error, warn};

/// Discord rejects messages longer than 2000 characters.
const MAX_DETAIL_CHARS: usize = 1800;

/// Formats an admin diagnostic, cutting overly long details.
#[must_use]
pub fn format_notification(context: &str, detail: &str) -> String {
    let mut shown: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
    if detail.chars().count() > MAX_DETAIL_CHARS {
        shown.push('…');
    }
    format!("⚠️ **{context}**\n```\n{shown}\n```")
}

/// Sends a diagnostic to the admin. `admin_id` 0 means no admin is configured.
pub async fn notify_admin(chat: &dyn ChatGateway, admin_id: u64, context: &str, detail: &str) {
    error!("{}: {}", context, detail);
    if admin_id == 0 {
        warn!("No admin configured, notification dropped");
        return;
    }
    let text = format_notification(context, detail);
    if let Err(e) = chat
        .send_direct_message(UserId::new(admin_id), &text)
        .await
    {
        error!("Failed to notify admin: {}", e);
    }
}
