//! Shared types for the lock bot

pub mod command;
pub mod errors;
pub mod types;

pub use command::{parse_member_id, LockCommand};
pub use errors::{DiscordErrorCode, ErrorCategory};
pub use types::*;
