//! Parsing of the `!lock` / `!lockme` chat commands

/// Prefix that triggers the command
pub const DEFAULT_COMMAND_PREFIX: &str = "!lock";

/// Role handed out by the command
pub const DEFAULT_ROLE_NAME: &str = "lock";

/// Nickname given to the target
pub const DEFAULT_NICKNAME: &str = "git hub";

/// A parsed trigger command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCommand {
    /// `!lockme`: the author targets themselves
    LockMe,
    /// `!lock …`: the target comes from mentions or the first argument
    Lock { argument: Option<String> },
}

impl LockCommand {
    /// Parse message content.
    ///
    /// Returns `None` when the trimmed content does not start with `prefix`.
    /// Anything else starting with the prefix is a command, even when it
    /// carries no usable target (`!lockdown` parses as `Lock` with no argument).
    pub fn parse(content: &str, prefix: &str) -> Option<Self> {
        let content = content.trim();
        if prefix.is_empty() || !content.starts_with(prefix) {
            return None;
        }

        if content.strip_prefix(prefix) == Some("me") {
            return Some(Self::LockMe);
        }

        let argument = content.split_whitespace().nth(1).map(str::to_string);
        Some(Self::Lock { argument })
    }
}

/// Interpret a command argument as a member id.
///
/// Accepts a raw snowflake (`123`) or a user mention token (`<@123>`, `<@!123>`).
pub fn parse_member_id(token: &str) -> Option<u64> {
    let raw = match token.strip_prefix("<@").and_then(|t| t.strip_suffix('>')) {
        Some(inner) => inner.strip_prefix('!').unwrap_or(inner),
        None => token,
    };
    raw.parse::<u64>().ok().filter(|id| *id != 0)
}
