//! Core guild domain types

use serde::{Deserialize, Serialize};

/// Author of an inbound message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageAuthor {
    pub id: u64,
    pub username: String,
    /// `username#discriminator` for legacy accounts, plain username otherwise
    pub tag: String,
    pub bot: bool,
}

/// Inbound chat message, as seen by the command handler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
    pub author: MessageAuthor,
    pub content: String,
    /// Mentioned user ids, in mention order
    #[serde(default)]
    pub mentions: Vec<u64>,
}

/// Guild role snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildRole {
    pub id: u64,
    pub name: String,
    /// Hierarchy position; higher is more senior
    pub position: i64,
}

impl GuildRole {
    /// Case-insensitive exact name match
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Guild member snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildMember {
    pub id: u64,
    pub username: String,
    /// Nickname, else global name, else username
    pub display_name: String,
    pub tag: String,
    pub bot: bool,
    pub role_ids: Vec<u64>,
}

impl GuildMember {
    /// Position of the member's most senior role.
    ///
    /// Members with no roles sit at the `@everyone` position, 0.
    pub fn highest_position(&self, roles: &[GuildRole]) -> i64 {
        roles
            .iter()
            .filter(|r| self.role_ids.contains(&r.id))
            .map(|r| r.position)
            .max()
            .unwrap_or(0)
    }

    /// Case-insensitive exact match on display name, then username.
    pub fn answers_to(&self, name: &str) -> bool {
        let lc = name.to_lowercase();
        self.display_name.to_lowercase() == lc || self.username.to_lowercase() == lc
    }
}

/// The capabilities the bot needs in a guild
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberPermissions {
    pub manage_roles: bool,
    pub manage_nicknames: bool,
}

impl MemberPermissions {
    pub const MANAGE_ROLES: &'static str = "Manage Roles";
    pub const MANAGE_NICKNAMES: &'static str = "Manage Nicknames";

    /// Both capabilities granted
    pub fn all() -> Self {
        Self {
            manage_roles: true,
            manage_nicknames: true,
        }
    }

    /// Human-readable names of the capabilities that are not granted
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.manage_roles {
            missing.push(Self::MANAGE_ROLES);
        }
        if !self.manage_nicknames {
            missing.push(Self::MANAGE_NICKNAMES);
        }
        missing
    }
}
