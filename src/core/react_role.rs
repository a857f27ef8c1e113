//! React-for-role rules - Parsing rule definitions and storing them.
//!
//! A rule definition is one line per emoji:
//!
//! ```text
//! 🍎 <@&111>
//! <:party:222> <@&333> <@&444>
//! ```
//!
//! The first role is granted on reaction; the optional second one is required.

use crate::{
    entities::{ReactRoleRule, react_role_rule},
    errors::{Error, Result},
};
use regex::Regex;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::info;

#[allow(clippy::expect_used)] // Constant pattern, checked by the tests below
static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<emoji><a?:\w+:\d+>|\S+)\s+<@&(?P<role>\d+)>(?:\s+<@&(?P<required>\d+)>)?\s*$",
    )
    .expect("rule line pattern is valid")
});

#[allow(clippy::expect_used)]
static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<a?:\w+:(?P<id>\d+)>$").expect("custom emoji pattern is valid")
});

/// One parsed rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// Emoji as written, used to react
    pub emoji: String,
    /// Emoji identity stored in the database
    pub emoji_key: String,
    /// Role to grant
    pub role_id: String,
    /// Role the member must already hold
    pub required_role_id: Option<String>,
}

/// Identity of an emoji: the ID for custom emojis, the text itself otherwise.
#[must_use]
pub fn emoji_identity(emoji: &str) -> String {
    CUSTOM_EMOJI
        .captures(emoji)
        .and_then(|caps| caps.name("id"))
        .map_or_else(|| emoji.to_string(), |id| id.as_str().to_string())
}

/// Parses rule lines, skipping blank ones.
///
/// # Errors
/// [`Error::InvalidArgument`] naming the first malformed line, or when no rule is found.
pub fn parse_rule_lines(body: &str) -> Result<Vec<ParsedRule>> {
    let mut rules = Vec::new();
    for (number, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let caps = RULE_LINE.captures(line).ok_or_else(|| {
            Error::invalid(format!(
                "line {} should look like `<emoji> <@&role> [<@&required role>]`",
                number + 1
            ))
        })?;
        let emoji = caps["emoji"].to_string();
        rules.push(ParsedRule {
            emoji_key: emoji_identity(&emoji),
            emoji,
            role_id: caps["role"].to_string(),
            required_role_id: caps.name("required").map(|m| m.as_str().to_string()),
        });
    }

    if rules.is_empty() {
        return Err(Error::invalid("no react-for-role rules found"));
    }
    let distinct: BTreeSet<&str> = rules.iter().map(|r| r.emoji_key.as_str()).collect();
    if distinct.len() != rules.len() {
        return Err(Error::invalid("each emoji may only be used once per message"));
    }
    Ok(rules)
}

/// Stores the rules of one message.
pub async fn add_rules(
    db: &DatabaseConnection,
    channel_id: &str,
    message_id: &str,
    rules: &[ParsedRule],
) -> Result<Vec<react_role_rule::Model>> {
    let now = chrono::Utc::now();
    let mut stored = Vec::with_capacity(rules.len());
    for rule in rules {
        let model = react_role_rule::ActiveModel {
            channel_id: Set(channel_id.to_string()),
            message_id: Set(message_id.to_string()),
            emoji: Set(rule.emoji_key.clone()),
            role_id: Set(rule.role_id.clone()),
            required_role_id: Set(rule.required_role_id.clone()),
            created_at: Set(now),
            ..Default::default()
        };
        stored.push(model.insert(db).await?);
    }
    info!(
        "Stored {} react-for-role rules for message {}",
        stored.len(),
        message_id
    );
    Ok(stored)
}

/// The rule matching a reaction, if any.
pub async fn find_rule(
    db: &DatabaseConnection,
    channel_id: &str,
    message_id: &str,
    emoji_key: &str,
) -> Result<Option<react_role_rule::Model>> {
    ReactRoleRule::find()
        .filter(react_role_rule::Column::ChannelId.eq(channel_id))
        .filter(react_role_rule::Column::MessageId.eq(message_id))
        .filter(react_role_rule::Column::Emoji.eq(emoji_key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Every `(channel, message)` pair that carries at least one rule.
pub async fn get_rule_messages(db: &DatabaseConnection) -> Result<Vec<(String, String)>> {
    let rules = ReactRoleRule::find()
        .order_by_asc(react_role_rule::Column::Id)
        .all(db)
        .await?;
    let pairs: BTreeSet<(String, String)> = rules
        .into_iter()
        .map(|rule| (rule.channel_id, rule.message_id))
        .collect();
    Ok(pairs.into_iter().collect())
}

/// Deletes all rules of one message, returning how many were removed.
pub async fn delete_rules_for_message(
    db: &DatabaseConnection,
    channel_id: &str,
    message_id: &str,
) -> Result<u64> {
    let result = ReactRoleRule::delete_many()
        .filter(react_role_rule::Column::ChannelId.eq(channel_id))
        .filter(react_role_rule::Column::MessageId.eq(message_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
