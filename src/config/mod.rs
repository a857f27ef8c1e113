/// Bot settings loaded from config.toml
pub mod bot;

/// Database configuration and connection management
pub mod database;

pub use bot::{BotConfig, MineLimits, load_config, load_config_or_default};
