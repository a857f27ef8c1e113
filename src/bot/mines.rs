//! Mine trigger engine.
//!
//! Runs once per incoming guild message:
//!
//! 1. fetch the active sets for the guild and channel, returning early (without
//!    touching the RNG) when there are none;
//! 2. shuffle them so no set is always evaluated first;
//! 3. the first set whose trigger text occurs in the message fires;
//! 4. otherwise one uniform draw is compared against each probabilistic set's
//!    chance in shuffled order, and the first with `draw <= chance` fires;
//! 5. a fired set rolls for a nuke. A nuke hits many members and costs
//!    [`NUKE_DECREMENT`] mines, a normal hit costs one and times out the author.
//!
//! Every chat call in the effect stage is best-effort: failures go to the admin and
//! evaluation carries on.

use crate::{
    bot::{BotData, chat::ChatGateway, chat::IncomingMessage, notify, scheduler},
    core::{mine, server_property, weighted::WeightedTable},
    entities::mine_set,
    errors::Result,
};
use chrono::{Datelike, Utc};
use poise::serenity_prelude::{GuildId, RoleId, UserId};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Mines consumed by a nuke.
pub const NUKE_DECREMENT: i32 = 4;

static FLAVOR_MESSAGES: LazyLock<WeightedTable<&'static str>> = LazyLock::new(|| {
    WeightedTable::new(vec![
        ("💥 {user} stepped on a mine!", 10),
        ("💥 BOOM! {user} found one of the mines.", 10),
        ("💣 {user} should have watched their step.", 8),
        ("💥 {user} triggered a mine and earned the {role} role.", 6),
        ("💥 A mine buried since {year} went off under {user}.", 3),
        ("💥 {user}, a member since {joinyear}, was not careful enough.", 3),
    ])
});

const NUKE_MESSAGE: &str =
    "☢️ {user} stepped on a **nuke**! {count} members were caught in the blast.";

/// Result of a message that fired a mine set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// A normal hit on the author
    Triggered {
        /// The set that fired
        set_id: i32,
        /// Mines left in the set
        remaining: i32,
        /// Whether the timeout role was granted
        timed_out: bool,
    },
    /// A nuke
    Nuked {
        /// The set that fired
        set_id: i32,
        /// Mines left in the set
        remaining: i32,
        /// Members that received the timeout role
        victims: usize,
    },
}

/// Picks the set that fires for `content`, given sets already in evaluation order.
///
/// Trigger texts are checked first. Only when none matches is a single uniform
/// value drawn and reused for every probabilistic set.
pub fn select_triggered_set<'a, R: Rng>(
    sets: &'a [mine_set::Model],
    content: &str,
    rng: &mut R,
) -> Option<&'a mine_set::Model> {
    let lowered = content.to_lowercase();
    let by_text = sets.iter().find(|set| {
        set.trigger_text
            .as_deref()
            .is_some_and(|text| !text.is_empty() && lowered.contains(&text.to_lowercase()))
    });
    if by_text.is_some() {
        return by_text;
    }

    if !sets.iter().any(|set| set.chance > 0.0) {
        return None;
    }
    let draw: f64 = rng.random();
    sets.iter().find(|set| set.chance > 0.0 && draw <= set.chance)
}

/// The timeout-equivalent role configured for a guild.
pub async fn timeout_role(data: &BotData, guild: GuildId) -> Result<Option<RoleId>> {
    let value = server_property::get_server_property(
        &data.database,
        &guild.to_string(),
        server_property::TIMEOUT_ROLE,
    )
    .await?;
    Ok(value.and_then(|raw| match raw.trim().parse::<u64>() {
        Ok(id) if id != 0 => Some(RoleId::new(id)),
        _ => {
            warn!("Guild {} has an invalid timeout role {:?}", guild, raw);
            None
        }
    }))
}

/// Fills `{user}`, `{year}`, `{joinyear}` and `{role}`; lookups only run for tokens present.
pub async fn render_template(
    template: &str,
    chat: &dyn ChatGateway,
    guild: GuildId,
    user: UserId,
    role: Option<RoleId>,
) -> String {
    let mut text = template.replace("{user}", &format!("<@{user}>"));
    if text.contains("{year}") {
        text = text.replace("{year}", &Utc::now().year().to_string());
    }
    if text.contains("{joinyear}") {
        let year = match chat.member_join_year(guild, user).await {
            Ok(Some(year)) => year.to_string(),
            Ok(None) => "?".to_string(),
            Err(e) => {
                warn!("Join year lookup for {} failed: {}", user, e);
                "?".to_string()
            }
        };
        text = text.replace("{joinyear}", &year);
    }
    if text.contains("{role}") {
        let name = match role {
            Some(role) => chat.role_name(guild, role).await.unwrap_or_else(|e| {
                warn!("Role name lookup for {} failed: {}", role, e);
                None
            }),
            None => None,
        };
        text = text.replace("{role}", name.as_deref().unwrap_or("timeout"));
    }
    text
}

/// Evaluates one message against the mine sets of its guild and channel.
pub async fn evaluate_message<R: Rng + Send>(
    data: &BotData,
    chat: &Arc<dyn ChatGateway>,
    message: &IncomingMessage,
    rng: &mut R,
) -> Result<Option<MineOutcome>> {
    if message.from_self || message.author_is_bot {
        return Ok(None);
    }
    let Some(guild) = message.guild_id else {
        return Ok(None);
    };

    let mut sets = mine::get_active_mine_sets(
        &data.database,
        &guild.to_string(),
        &message.channel_id.to_string(),
    )
    .await?;
    if sets.is_empty() {
        return Ok(None);
    }

    sets.shuffle(rng);
    let Some(set) = select_triggered_set(&sets, &message.content, rng).cloned() else {
        return Ok(None);
    };

    let limits = &data.config.mines;
    let nuke = rng.random::<f64>() < limits.nuke_chance;
    let decrement = if nuke { NUKE_DECREMENT } else { 1 };
    let remaining = mine::decrement_mine_set(&data.database, set.id, decrement).await?;
    info!(
        "Mine set {} fired on {} in guild {} ({} left, nuke: {})",
        set.id, message.author_id, guild, remaining, nuke
    );

    let role = match timeout_role(data, guild).await {
        Ok(role) => role,
        Err(e) => {
            report(data, chat, "Timeout role lookup failed", &e.to_string()).await;
            None
        }
    };
    if nuke {
        let victims = apply_nuke(data, chat, message, guild, role, rng).await;
        return Ok(Some(MineOutcome::Nuked {
            set_id: set.id,
            remaining,
            victims,
        }));
    }

    let timed_out = apply_hit(data, chat, message, guild, role, &set, rng).await;
    Ok(Some(MineOutcome::Triggered {
        set_id: set.id,
        remaining,
        timed_out,
    }))
}

async fn report(data: &BotData, chat: &Arc<dyn ChatGateway>, context: &str, detail: &str) {
    notify::notify_admin(chat.as_ref(), data.config.admin_id, context, detail).await;
}

/// Grants the timeout role and schedules its removal. Returns whether the grant worked.
async fn time_out(
    data: &BotData,
    chat: &Arc<dyn ChatGateway>,
    guild: GuildId,
    user: UserId,
    role: RoleId,
    duration: Duration,
) -> bool {
    match chat.add_role(guild, user, role).await {
        Ok(()) => {
            scheduler::schedule_role_removal(Arc::clone(chat), guild, user, role, duration);
            true
        }
        Err(e) => {
            report(
                data,
                chat,
                &format!("Could not give the timeout role to {user} in {guild}"),
                &e.to_string(),
            )
            .await;
            false
        }
    }
}

async fn apply_hit<R: Rng + Send>(
    data: &BotData,
    chat: &Arc<dyn ChatGateway>,
    message: &IncomingMessage,
    guild: GuildId,
    role: Option<RoleId>,
    set: &mine_set::Model,
    rng: &mut R,
) -> bool {
    let template = set
        .message
        .clone()
        .or_else(|| FLAVOR_MESSAGES.pick(rng).map(|m| (*m).to_string()))
        .unwrap_or_else(|| "💥 {user} stepped on a mine!".to_string());
    let text = render_template(&template, chat.as_ref(), guild, message.author_id, role).await;
    if let Err(e) = chat.send_message(message.channel_id, &text).await {
        report(data, chat, "Could not announce a mine", &e.to_string()).await;
    }

    if set.duration_secs <= 0 {
        return false;
    }
    let Some(role) = role else {
        report(
            data,
            chat,
            &format!("Guild {guild} has no timeout role"),
            "Set one with the `timeout_role` server property.",
        )
        .await;
        return false;
    };
    let duration = Duration::from_secs(u64::try_from(set.duration_secs).unwrap_or_default());
    time_out(data, chat, guild, message.author_id, role, duration).await
}

async fn apply_nuke<R: Rng + Send>(
    data: &BotData,
    chat: &Arc<dyn ChatGateway>,
    message: &IncomingMessage,
    guild: GuildId,
    role: Option<RoleId>,
    rng: &mut R,
) -> usize {
    let limits = &data.config.mines;
    let members = match chat.guild_member_ids(guild).await {
        Ok(members) => members,
        Err(e) => {
            report(data, chat, "Could not list members for a nuke", &e.to_string()).await;
            Vec::new()
        }
    };
    let targets: Vec<UserId> =
        if limits.nuke_max_targets == 0 || members.len() <= limits.nuke_max_targets {
            members
        } else {
            members
                .choose_multiple(rng, limits.nuke_max_targets)
                .copied()
                .collect()
        };
    debug!("Nuke in guild {} targets {} members", guild, targets.len());

    let mut victims = 0;
    match role {
        Some(role) => {
            let duration = Duration::from_secs(limits.nuke_duration_seconds);
            for target in targets {
                if time_out(data, chat, guild, target, role, duration).await {
                    victims += 1;
                }
            }
        }
        None => {
            report(
                data,
                chat,
                &format!("Guild {guild} has no timeout role"),
                "A nuke went off without effect.",
            )
            .await;
        }
    }

    let text = NUKE_MESSAGE
        .replace("{user}", &format!("<@{}>", message.author_id))
        .replace("{count}", &victims.to_string());
    if let Err(e) = chat.send_message(message.channel_id, &text).await {
        report(data, chat, "Could not announce a nuke", &e.to_string()).await;
    }
    victims
}
