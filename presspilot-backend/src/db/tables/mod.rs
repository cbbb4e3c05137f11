//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod commerce; // members, memberships, transactions, subscriptions
mod conversation; // conversation_messages
mod executions; // tool_executions (audit log)
mod site; // posts, site_users, plugins, site_options

pub use executions::history_window;
