//! Error types for the lock command.
//!
//! `PlatformError` wraps failures of individual platform calls; `LockError`
//! is the closed set of ways one command invocation can end short of success.
//! `classify` turns a platform failure into a structured `PlatformFailure`
//! so `log_platform_error` can log it at the level it deserves.

use lock_types::{DiscordErrorCode, ErrorCategory};
use serenity::http::HttpError;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failure of a single call through the platform seam
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Discord API error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("Member {0} not found")]
    MemberNotFound(u64),

    #[error("Guild {0} not available")]
    GuildUnavailable(u64),
}

/// Why a lock command did not complete
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Could not find the target member")]
    TargetNotFound,

    #[error("Bot is missing permissions: {}", .missing.join(", "))]
    InsufficientBotPermissions { missing: Vec<&'static str> },

    #[error("Failed to create role: {0}")]
    RoleCreationFailed(#[source] PlatformError),

    #[error("Role position {role_position} is not below the bot's highest role ({bot_position})")]
    HierarchyViolation { role_position: i64, bot_position: i64 },

    #[error("Role hierarchy prevents renaming {target}")]
    NicknameHierarchyBlocked { target: String },

    #[error("Platform call failed: {0}")]
    Unclassified(#[from] PlatformError),
}

/// Structured view of a platform failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFailure {
    pub error_code: DiscordErrorCode,
    pub category: ErrorCategory,
    pub message: String,
    /// Raw Discord JSON error code (0 if not an API error).
    pub raw_discord_code: u32,
    /// HTTP status code (0 if not an HTTP error).
    pub http_status: u16,
}

/// Result of classifying a platform failure.
#[derive(Debug)]
pub enum ErrorOutcome {
    /// Needs operator action (permissions, hierarchy, missing resources).
    Permanent(PlatformFailure),
    /// Likely to clear up by itself (network, rate limit, overload).
    Transient(PlatformFailure),
}

/// Classify a platform failure.
pub fn classify(err: &PlatformError) -> ErrorOutcome {
    match err {
        PlatformError::Discord(serenity::Error::Http(http_err)) => classify_http(http_err),
        PlatformError::Discord(other) => {
            debug!("Non-HTTP serenity error: {}", other);
            ErrorOutcome::Transient(make_failure(
                DiscordErrorCode::NetworkError,
                &other.to_string(),
                0,
                0,
            ))
        }
        PlatformError::MemberNotFound(_) => ErrorOutcome::Permanent(make_failure(
            DiscordErrorCode::UnknownMember,
            &err.to_string(),
            0,
            0,
        )),
        PlatformError::GuildUnavailable(_) => ErrorOutcome::Transient(make_failure(
            DiscordErrorCode::UnknownGuild,
            &err.to_string(),
            0,
            0,
        )),
    }
}

/// Log a platform failure at the appropriate level.
///
/// - Permanent errors → `error!`
/// - Transient errors → `warn!`
pub fn log_platform_error(context: &str, err: &PlatformError) {
    match classify(err) {
        ErrorOutcome::Permanent(f) => {
            error!(
                "{} [{:?}/{:?}, HTTP {}, code {}]: {}",
                context, f.error_code, f.category, f.http_status, f.raw_discord_code, f.message
            );
        }
        ErrorOutcome::Transient(f) => {
            warn!(
                "{} [{:?}/{:?}, HTTP {}, code {}]: {}",
                context, f.error_code, f.category, f.http_status, f.raw_discord_code, f.message
            );
        }
    }
}

/// Log the way a lock command ended short of success.
pub fn log_lock_error(invoker: &str, err: &LockError) {
    match err {
        LockError::TargetNotFound => {
            info!("Lock by {}: no resolvable target", invoker);
        }
        LockError::InsufficientBotPermissions { .. }
        | LockError::HierarchyViolation { .. }
        | LockError::NicknameHierarchyBlocked { .. } => {
            warn!("Lock by {}: {}", invoker, err);
        }
        LockError::RoleCreationFailed(e) => {
            log_platform_error(&format!("Lock by {}: failed to create role", invoker), e);
        }
        LockError::Unclassified(e) => {
            log_platform_error(&format!("Lock by {}: command error", invoker), e);
        }
    }
}

fn classify_http(http_err: &HttpError) -> ErrorOutcome {
    match http_err {
        HttpError::UnsuccessfulRequest(resp) => {
            let status = resp.status_code.as_u16();

            if status == 429 {
                return ErrorOutcome::Transient(make_failure(
                    DiscordErrorCode::RateLimited,
                    &resp.error.message,
                    0,
                    status,
                ));
            }

            let raw_code = resp.error.code as u32;
            let code = DiscordErrorCode::from_raw(raw_code);
            let failure = make_failure(code, &resp.error.message, raw_code, status);

            if code.is_permanent() {
                ErrorOutcome::Permanent(failure)
            } else {
                ErrorOutcome::Transient(failure)
            }
        }

        // Network / request-level failures (not Discord API errors)
        _ => {
            debug!("Network-level HTTP error: {}", http_err);
            ErrorOutcome::Transient(make_failure(
                DiscordErrorCode::NetworkError,
                &http_err.to_string(),
                0,
                0,
            ))
        }
    }
}

fn make_failure(
    code: DiscordErrorCode,
    message: &str,
    raw_discord_code: u32,
    http_status: u16,
) -> PlatformFailure {
    PlatformFailure {
        error_code: code,
        category: code.category(),
        message: message.to_string(),
        raw_discord_code,
        http_status,
    }
}
