//! The lock command.
//!
//! `!lockme` or `!lock <mention|id|name>` ensures the lock role exists,
//! assigns it to the target and renames the target. `run` performs the
//! command and returns a typed outcome; `handle_message` is the boundary
//! that turns the outcome into one log line and one chat reply.

#[path = "lock_tests.rs"]
mod lock_tests;

use lock_types::{parse_member_id, GuildMember, GuildRole, IncomingMessage, LockCommand};
use serenity::prelude::TypeMapKey;
use tracing::{debug, info, warn};

use crate::config::LockConfig;
use crate::errors::{log_lock_error, log_platform_error, LockError, PlatformError};
use crate::platform::GuildPlatform;

const ROLE_CREATE_REASON: &str = "Created by bot for lock group";

const GENERIC_FAILURE_REPLY: &str =
    "Something went wrong while running the command. Check bot logs.";

/// A completed lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locked {
    /// Name of the role as it exists in the guild
    pub role_name: String,
    pub nickname: String,
    pub target_tag: String,
}

/// What `handle_message` did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not a lock command, or not one this bot answers
    Ignored,
    Locked,
    Failed,
}

/// Handles lock commands for every guild the bot is in.
pub struct LockService {
    config: LockConfig,
}

impl TypeMapKey for LockService {
    type Value = std::sync::Arc<LockService>;
}

impl LockService {
    pub fn new(config: LockConfig) -> Self {
        Self { config }
    }

    /// React to an inbound message.
    ///
    /// Messages from bots and messages that are not a lock command are
    /// dropped without touching the platform.
    pub async fn handle_message<P: GuildPlatform>(
        &self,
        platform: &P,
        message: &IncomingMessage,
    ) -> Disposition {
        if message.author.bot || message.author.id == platform.bot_id() {
            return Disposition::Ignored;
        }

        let Some(command) = LockCommand::parse(&message.content, &self.config.command_prefix)
        else {
            return Disposition::Ignored;
        };

        let Some(guild_id) = message.guild_id else {
            debug!(
                "Ignoring lock command from {} outside a guild",
                message.author.tag
            );
            return Disposition::Ignored;
        };

        info!(
            "Lock command from {} in guild {}: {:?}",
            message.author.tag, guild_id, command
        );

        let result = self.run(platform, guild_id, message, &command).await;
        match &result {
            Ok(locked) => info!(
                "Locked {} with role '{}' (invoked by {})",
                locked.target_tag, locked.role_name, message.author.tag
            ),
            Err(e) => log_lock_error(&message.author.tag, e),
        }

        let reply = self.reply_for(&result);
        if let Err(e) = platform.reply(message, &reply).await {
            log_platform_error("Failed to send lock reply", &e);
        }

        if result.is_ok() {
            Disposition::Locked
        } else {
            Disposition::Failed
        }
    }

    /// Run a parsed command in a guild.
    pub async fn run<P: GuildPlatform>(
        &self,
        platform: &P,
        guild_id: u64,
        message: &IncomingMessage,
        command: &LockCommand,
    ) -> Result<Locked, LockError> {
        let invoker = &message.author.tag;

        let bot = platform.fetch_member(guild_id, platform.bot_id()).await?;
        let missing = platform
            .member_permissions(guild_id, &bot)
            .await?
            .missing();
        if !missing.is_empty() {
            return Err(LockError::InsufficientBotPermissions { missing });
        }

        let target = self
            .resolve_target(platform, guild_id, message, command)
            .await?
            .ok_or(LockError::TargetNotFound)?;

        let mut roles = platform.roles(guild_id).await?;
        let role = self.ensure_role(platform, guild_id, &mut roles).await?;

        let bot_position = bot.highest_position(&roles);
        if role.position >= bot_position {
            return Err(LockError::HierarchyViolation {
                role_position: role.position,
                bot_position,
            });
        }

        platform
            .add_role(
                guild_id,
                target.id,
                role.id,
                &format!(
                    "Assigning {} role via bot by {}",
                    self.config.role_name, invoker
                ),
            )
            .await?;

        // Renaming needs the bot to out-rank the target; owners are still attempted
        let owner_id = platform.owner_id(guild_id).await?;
        let can_rename =
            bot_position > target.highest_position(&roles) || target.id == owner_id;
        if !can_rename && target.id != platform.bot_id() {
            return Err(LockError::NicknameHierarchyBlocked { target: target.tag });
        }

        let nickname = &self.config.nickname;
        platform
            .set_nickname(
                guild_id,
                target.id,
                nickname,
                &format!("Setting nickname to {} via bot by {}", nickname, invoker),
            )
            .await?;

        Ok(Locked {
            role_name: role.name,
            nickname: nickname.clone(),
            target_tag: target.tag,
        })
    }

    /// Chat reply for a command result
    pub fn reply_for(&self, result: &Result<Locked, LockError>) -> String {
        let prefix = &self.config.command_prefix;
        match result {
            Ok(locked) => format!(
                "Success: assigned role `{}` and set nickname to `{}` for {}.",
                locked.role_name, locked.nickname, locked.target_tag
            ),
            Err(LockError::TargetNotFound) => format!(
                "Could not find the target member. Use `{} @user` or `{}me`.",
                prefix, prefix
            ),
            Err(LockError::InsufficientBotPermissions { missing }) => format!(
                "I need Manage Roles and Manage Nicknames permissions for this to work. Missing: {}.",
                missing.join(", ")
            ),
            Err(LockError::HierarchyViolation { .. }) => format!(
                "I cannot manage the `{}` role because it is equal or higher than my highest role. \
                 Move my role above it and try again.",
                self.config.role_name
            ),
            Err(LockError::NicknameHierarchyBlocked { .. }) => {
                "I cannot change that member's nickname due to role hierarchy. \
                 Role was assigned but nickname change failed."
                    .to_string()
            }
            Err(LockError::RoleCreationFailed(_)) | Err(LockError::Unclassified(_)) => {
                GENERIC_FAILURE_REPLY.to_string()
            }
        }
    }

    /// Find the member a command is aimed at.
    ///
    /// Order: the author for `!lockme`, then the first mentioned member, then
    /// the first argument as an id, then as a display name or username.
    async fn resolve_target<P: GuildPlatform>(
        &self,
        platform: &P,
        guild_id: u64,
        message: &IncomingMessage,
        command: &LockCommand,
    ) -> Result<Option<GuildMember>, PlatformError> {
        let argument = match command {
            LockCommand::LockMe => {
                return platform
                    .fetch_member(guild_id, message.author.id)
                    .await
                    .map(Some);
            }
            LockCommand::Lock { argument } => argument,
        };

        for user_id in &message.mentions {
            match platform.fetch_member(guild_id, *user_id).await {
                Ok(member) => return Ok(Some(member)),
                Err(e) => debug!("Mentioned user {} is not a member: {}", user_id, e),
            }
        }

        let Some(token) = argument else {
            return Ok(None);
        };

        if let Some(user_id) = parse_member_id(token) {
            match platform.fetch_member(guild_id, user_id).await {
                Ok(member) => return Ok(Some(member)),
                Err(e) => debug!("No member with id {}: {}", user_id, e),
            }
        }

        let members = match platform.cached_members(guild_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!("Member cache unavailable for guild {}: {}", guild_id, e);
                return Ok(None);
            }
        };
        Ok(members.into_iter().find(|m| m.answers_to(token)))
    }

    /// Reuse the lock role if the guild has one, otherwise create it.
    async fn ensure_role<P: GuildPlatform>(
        &self,
        platform: &P,
        guild_id: u64,
        roles: &mut Vec<GuildRole>,
    ) -> Result<GuildRole, LockError> {
        let name = &self.config.role_name;
        if let Some(existing) = roles.iter().find(|r| r.has_name(name)) {
            debug!("Reusing role '{}' ({})", existing.name, existing.id);
            return Ok(existing.clone());
        }

        let role = platform
            .create_role(guild_id, name, ROLE_CREATE_REASON)
            .await
            .map_err(LockError::RoleCreationFailed)?;
        info!("Created role '{}' ({}) in guild {}", role.name, role.id, guild_id);
        roles.push(role.clone());
        Ok(role)
    }
}
