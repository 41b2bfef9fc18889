//! Discord error taxonomy for role and member operations.
//!
//! Maps the Discord JSON error codes
//! (<https://discord.com/developers/docs/topics/opcodes-and-status-codes#json>)
//! that the lock command can run into to named variants; everything else
//! falls through to [`DiscordErrorCode::Unknown`].

use serde::{Deserialize, Serialize};

/// High-level category of a Discord API error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limit hit.
    RateLimit,
    /// Target resource (guild, member, role …) not found.
    NotFound,
    /// Insufficient bot permissions or hierarchy for the requested action.
    PermissionDenied,
    /// A guild-wide resource limit was reached.
    LimitReached,
    /// Malformed or semantically invalid input.
    InvalidInput,
    /// Network or I/O error (transient).
    Network,
    /// Unknown or uncategorised error.
    Unknown,
}

/// Discord-specific error code (subset relevant to the lock command).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscordErrorCode {
    // ── Not found ─────────────────────────────────────────────────────────────
    /// 10003 — Unknown channel.
    UnknownChannel,
    /// 10004 — Unknown guild.
    UnknownGuild,
    /// 10007 — Unknown member.
    UnknownMember,
    /// 10008 — Unknown message (reply target deleted).
    UnknownMessage,
    /// 10011 — Unknown role.
    UnknownRole,
    /// 10013 — Unknown user.
    UnknownUser,

    // ── Permission errors ──────────────────────────────────────────────────────
    /// 50001 — Missing access.
    MissingAccess,
    /// 50013 — Missing permissions (also returned for hierarchy violations).
    MissingPermissions,

    // ── Limits ─────────────────────────────────────────────────────────────────
    /// 30005 — Maximum number of guild roles reached.
    MaxRolesReached,
    /// HTTP 429 — Global or per-route rate limit.
    RateLimited,

    // ── Input errors ───────────────────────────────────────────────────────────
    /// 50035 — Invalid form body (validation failed).
    InvalidFormBody,
    /// 160002 — Cannot reply without permission to read message history.
    CannotReplyWithoutHistory,

    // ── Auth ───────────────────────────────────────────────────────────────────
    /// 40001 / 50014 — Invalid or expired token.
    InvalidToken,

    // ── Server errors ──────────────────────────────────────────────────────────
    /// 130000 — API resource overloaded.
    ApiOverloaded,

    // ── Client errors ─────────────────────────────────────────────────────────
    /// Network or I/O error on the client side.
    NetworkError,

    // ── Catch-all ─────────────────────────────────────────────────────────────
    /// Any Discord JSON error code not listed above.
    Unknown,
}

impl DiscordErrorCode {
    /// Derive the code from a raw Discord JSON error code integer.
    pub fn from_raw(code: u32) -> Self {
        match code {
            10003 => Self::UnknownChannel,
            10004 => Self::UnknownGuild,
            10007 => Self::UnknownMember,
            10008 => Self::UnknownMessage,
            10011 => Self::UnknownRole,
            10013 => Self::UnknownUser,
            30005 => Self::MaxRolesReached,
            40001 | 50014 => Self::InvalidToken,
            50001 => Self::MissingAccess,
            50013 => Self::MissingPermissions,
            50035 => Self::InvalidFormBody,
            160002 => Self::CannotReplyWithoutHistory,
            130000 => Self::ApiOverloaded,
            _ => Self::Unknown,
        }
    }

    /// The high-level category for this code.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownChannel
            | Self::UnknownGuild
            | Self::UnknownMember
            | Self::UnknownMessage
            | Self::UnknownRole
            | Self::UnknownUser => ErrorCategory::NotFound,

            Self::MissingAccess | Self::MissingPermissions => ErrorCategory::PermissionDenied,

            Self::MaxRolesReached => ErrorCategory::LimitReached,

            Self::RateLimited => ErrorCategory::RateLimit,

            Self::InvalidFormBody | Self::CannotReplyWithoutHistory => {
                ErrorCategory::InvalidInput
            }

            Self::NetworkError => ErrorCategory::Network,

            Self::InvalidToken | Self::ApiOverloaded | Self::Unknown => ErrorCategory::Unknown,
        }
    }

    /// True if repeating the same call cannot succeed without operator action.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::UnknownChannel
                | Self::UnknownGuild
                | Self::UnknownMember
                | Self::UnknownRole
                | Self::UnknownUser
                | Self::MissingAccess
                | Self::MissingPermissions
                | Self::MaxRolesReached
                | Self::InvalidToken
        )
    }
}
