//! Bot settings loaded from config.toml
//!
//! Every field has a default, so an empty file (or no file at all) yields a working
//! configuration. `ADMIN_USER_ID` in the environment overrides `admin_id`.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Top-level bot configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Character every text command starts with
    pub command_marker: char,
    /// Discord user ID of the single bot administrator, 0 when unset
    pub admin_id: u64,
    /// Minimum seconds between two commands of the same user
    pub cooldown_seconds: i64,
    /// Interval of the sweep that drops rules for deleted react-for-role messages
    pub react_role_sweep_seconds: u64,
    /// Longest delay accepted by `remindme`
    pub max_reminder_seconds: u64,
    /// Mine placement limits and trigger tuning
    pub mines: MineLimits,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_marker: '!',
            admin_id: 0,
            cooldown_seconds: 10,
            react_role_sweep_seconds: 3600,
            max_reminder_seconds: 7 * 24 * 3600,
            mines: MineLimits::default(),
        }
    }
}

/// Limits applied when a mine set is created, and the nuke tuning used when one fires
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MineLimits {
    /// Maximum mine sets per guild
    pub max_sets_per_guild: u64,
    /// Upper bound for a set's amount
    pub max_amount: i32,
    /// Upper bound for the timeout duration
    pub max_duration_seconds: i64,
    /// Lower bound for a probabilistic set's chance
    pub min_chance: f64,
    /// Upper bound for a probabilistic set's chance
    pub max_chance: f64,
    /// Chance used when none is given
    pub default_chance: f64,
    /// Longest custom message template
    pub max_message_length: usize,
    /// Longest trigger text
    pub max_trigger_length: usize,
    /// Probability that a hit becomes a nuke
    pub nuke_chance: f64,
    /// How many members a nuke can hit, 0 for everyone
    pub nuke_max_targets: usize,
    /// Seconds the timeout role is held after a nuke
    pub nuke_duration_seconds: u64,
}

impl Default for MineLimits {
    fn default() -> Self {
        Self {
            max_sets_per_guild: 5,
            max_amount: 50,
            max_duration_seconds: 3600,
            min_chance: 0.001,
            max_chance: 0.2,
            default_chance: 0.01,
            max_message_length: 500,
            max_trigger_length: 100,
            nuke_chance: 0.01,
            nuke_max_targets: 10,
            nuke_duration_seconds: 60,
        }
    }
}

impl BotConfig {
    fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var("ADMIN_USER_ID") {
            self.admin_id = raw.trim().parse().map_err(|e| Error::Config {
                message: format!("ADMIN_USER_ID is not a valid user ID: {e}"),
            })?;
        }
        Ok(self)
    }

    fn validate(self) -> Result<Self> {
        let mines = &self.mines;
        if mines.min_chance < 0.0 || mines.max_chance > 1.0 || mines.min_chance > mines.max_chance
        {
            return Err(Error::Config {
                message: format!(
                    "mine chance band [{}, {}] must lie within [0, 1]",
                    mines.min_chance, mines.max_chance
                ),
            });
        }
        if mines.max_amount < 1 {
            return Err(Error::Config {
                message: "mines.max_amount must be at least 1".to_string(),
            });
        }
        if self.command_marker.is_alphanumeric() || self.command_marker.is_whitespace() {
            return Err(Error::Config {
                message: format!("'{}' cannot be used as command marker", self.command_marker),
            });
        }
        Ok(self)
    }
}

/// Parses a configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<BotConfig> {
    let config: BotConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()
}

/// Loads the bot configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid, or a
/// value is out of range.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)?.apply_env_overrides()
}

/// Like [`load_config`], but a missing file falls back to the defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    if path.as_ref().exists() {
        return load_config(path);
    }
    warn!(
        "Config file {} not found, using defaults",
        path.as_ref().display()
    );
    BotConfig::default().validate()?.apply_env_overrides()
}
