//! Core logic - framework-agnostic storage operations and helpers.
//!
//! Everything here works on a `DatabaseConnection` or plain values; nothing talks
//! to Discord.

/// Per-user command cooldowns
pub mod cooldown;
/// Mine set placement, queries and decrements
pub mod mine;
/// React-for-role rule parsing and storage
pub mod react_role;
/// Per-guild key-value properties
pub mod server_property;
/// Stored literal-response commands
pub mod simple_command;
/// Cooldown-exempt channels
pub mod spam;
/// Moderation warnings
pub mod warning;
/// Ordered weighted random choice
pub mod weighted;
