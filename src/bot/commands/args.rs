//! Argument helpers shared by the text commands.

use crate::errors::{Error, Result};
use poise::serenity_prelude::UserId;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

#[allow(clippy::expect_used)] // Constant pattern, checked by the tests below
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:<@!?(\d+)>|(\d+))$").expect("mention pattern is valid"));

#[allow(clippy::expect_used)]
static DELAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:(?P<h>\d+)h)?\s*(?:(?P<m>\d+)m)?\s*(?:(?P<s>\d+)s)?\s+(?P<text>\S.*)$")
        .expect("delay pattern is valid")
});

/// Splits on whitespace, keeping `"double quoted"` runs together.
#[must_use]
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        args.push(current);
    }
    args
}

/// Parses `<@id>`, `<@!id>` or a bare ID.
#[must_use]
pub fn parse_user_mention(token: &str) -> Option<UserId> {
    let caps = MENTION.captures(token.trim())?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    match raw.parse::<u64>() {
        Ok(id) if id != 0 => Some(UserId::new(id)),
        _ => None,
    }
}

/// Splits `<first token> <rest>`; both must be present.
pub fn split_first<'a>(args: &'a str, usage: &str) -> Result<(&'a str, &'a str)> {
    args.split_once(char::is_whitespace)
        .map(|(first, rest)| (first, rest.trim()))
        .filter(|(first, rest)| !first.is_empty() && !rest.is_empty())
        .ok_or_else(|| Error::invalid(format!("usage: `{usage}`")))
}

/// Parses `<N>h <N>m <N>s <text>` where each unit is optional but one is required.
pub fn parse_delay(input: &str) -> Result<(Duration, String)> {
    let usage = || Error::invalid("usage: `remindme <N>h <N>m <N>s <text>`, e.g. `remindme 1h 30m stretch`");
    let caps = DELAY.captures(input.trim()).ok_or_else(usage)?;

    let mut seconds: u64 = 0;
    let mut any = false;
    for (name, factor) in [("h", 3600), ("m", 60), ("s", 1)] {
        if let Some(value) = caps.name(name) {
            any = true;
            let value: u64 = value
                .as_str()
                .parse()
                .map_err(|_| Error::invalid("that delay is too long"))?;
            seconds = value
                .checked_mul(factor)
                .and_then(|part| seconds.checked_add(part))
                .ok_or_else(|| Error::invalid("that delay is too long"))?;
        }
    }
    if !any {
        return Err(usage());
    }
    if seconds == 0 {
        return Err(Error::invalid("the delay must be longer than zero"));
    }
    Ok((Duration::from_secs(seconds), caps["text"].trim().to_string()))
}
