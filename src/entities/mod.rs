//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod mine_set;
pub mod react_role_rule;
pub mod server_property;
pub mod simple_command;
pub mod spam_exempt_channel;
pub mod user_warning;

// Re-export specific types to avoid conflicts
pub use mine_set::{Column as MineSetColumn, Entity as MineSet, Model as MineSetModel};
pub use react_role_rule::{
    Column as ReactRoleRuleColumn, Entity as ReactRoleRule, Model as ReactRoleRuleModel,
};
pub use server_property::{
    Column as ServerPropertyColumn, Entity as ServerProperty, Model as ServerPropertyModel,
};
pub use simple_command::{
    Column as SimpleCommandColumn, Entity as SimpleCommand, Model as SimpleCommandModel,
};
pub use spam_exempt_channel::{
    Column as SpamExemptChannelColumn, Entity as SpamExemptChannel,
    Model as SpamExemptChannelModel,
};
pub use user_warning::{
    Column as UserWarningColumn, Entity as UserWarning, Model as UserWarningModel,
};
