//! Platform seam: the guild operations the lock command needs.
//!
//! `SerenityPlatform` performs them with serenity's cache and HTTP client.
//! Tests run the command against `MockPlatform` instead.

#[path = "platform_tests.rs"]
mod platform_tests;

use std::collections::HashMap;
use std::sync::Arc;

use lock_types::{DiscordErrorCode, GuildMember, GuildRole, IncomingMessage, MemberPermissions};
use serenity::builder::{CreateMessage, EditMember, EditRole};
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::guild::{Member, Role};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::model::Permissions;
use tracing::debug;

use crate::errors::PlatformError;

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Guild operations used by the lock command.
/// Implemented by `SerenityPlatform` (Discord) and `MockPlatform` (in-memory, tests).
#[allow(async_fn_in_trait)]
pub trait GuildPlatform {
    /// The bot's own user id
    fn bot_id(&self) -> u64;

    /// Fetch a member by user id
    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<GuildMember>;

    /// Members currently held in the local cache
    async fn cached_members(&self, guild_id: u64) -> Result<Vec<GuildMember>>;

    /// All roles of the guild
    async fn roles(&self, guild_id: u64) -> Result<Vec<GuildRole>>;

    /// User id of the guild owner
    async fn owner_id(&self, guild_id: u64) -> Result<u64>;

    /// The lock-relevant capabilities a member holds
    async fn member_permissions(
        &self,
        guild_id: u64,
        member: &GuildMember,
    ) -> Result<MemberPermissions>;

    /// Create a role with no permissions
    async fn create_role(&self, guild_id: u64, name: &str, reason: &str) -> Result<GuildRole>;

    /// Add a role to a member
    async fn add_role(&self, guild_id: u64, user_id: u64, role_id: u64, reason: &str)
        -> Result<()>;

    /// Set a member's nickname
    async fn set_nickname(
        &self,
        guild_id: u64,
        user_id: u64,
        nickname: &str,
        reason: &str,
    ) -> Result<()>;

    /// Reply to a message in its channel
    async fn reply(&self, message: &IncomingMessage, content: &str) -> Result<()>;
}

/// Serenity-backed platform.
#[derive(Clone)]
pub struct SerenityPlatform {
    cache: Arc<Cache>,
    http: Arc<Http>,
    bot_id: UserId,
}

impl SerenityPlatform {
    pub fn new(cache: Arc<Cache>, http: Arc<Http>, bot_id: UserId) -> Self {
        Self {
            cache,
            http,
            bot_id,
        }
    }

    /// Build from an event context; the bot id comes from the cached current user.
    pub fn from_context(ctx: &serenity::prelude::Context) -> Self {
        let bot_id = ctx.cache.current_user().id;
        Self::new(ctx.cache.clone(), ctx.http.clone(), bot_id)
    }

    async fn raw_roles(&self, guild_id: GuildId) -> Result<HashMap<RoleId, Role>> {
        if let Some(guild) = self.cache.guild(guild_id) {
            return Ok(guild.roles.clone());
        }
        debug!("Guild {} not cached, fetching roles over HTTP", guild_id);
        Ok(guild_id.roles(&self.http).await?)
    }

    /// Guild-level permissions from the cache, when both guild and member are cached.
    fn cached_permissions(&self, guild_id: u64, user_id: u64) -> Option<Permissions> {
        let guild = self.cache.guild(GuildId::new(guild_id))?;
        let member = guild.members.get(&UserId::new(user_id))?;
        Some(guild.member_permissions(member))
    }
}

/// Unknown member/user answers become `MemberNotFound`; everything else stays a Discord error.
fn member_error(err: serenity::Error, user_id: u64) -> PlatformError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) = &err {
        if matches!(
            DiscordErrorCode::from_raw(resp.error.code as u32),
            DiscordErrorCode::UnknownMember | DiscordErrorCode::UnknownUser
        ) {
            return PlatformError::MemberNotFound(user_id);
        }
    }
    PlatformError::Discord(err)
}

impl GuildPlatform for SerenityPlatform {
    fn bot_id(&self) -> u64 {
        self.bot_id.get()
    }

    async fn fetch_member(&self, guild_id: u64, user_id: u64) -> Result<GuildMember> {
        let member = GuildId::new(guild_id)
            .member((&self.cache, self.http.as_ref()), UserId::new(user_id))
            .await
            .map_err(|e| member_error(e, user_id))?;
        Ok(to_guild_member(&member))
    }

    async fn cached_members(&self, guild_id: u64) -> Result<Vec<GuildMember>> {
        let guild = self
            .cache
            .guild(GuildId::new(guild_id))
            .ok_or(PlatformError::GuildUnavailable(guild_id))?;
        Ok(guild.members.values().map(to_guild_member).collect())
    }

    async fn roles(&self, guild_id: u64) -> Result<Vec<GuildRole>> {
        let roles = self.raw_roles(GuildId::new(guild_id)).await?;
        let mut roles: Vec<GuildRole> = roles.values().map(to_guild_role).collect();
        roles.sort_by_key(|r| r.position);
        Ok(roles)
    }

    async fn owner_id(&self, guild_id: u64) -> Result<u64> {
        let guild_id = GuildId::new(guild_id);
        if let Some(guild) = self.cache.guild(guild_id) {
            return Ok(guild.owner_id.get());
        }
        let guild = guild_id.to_partial_guild(self.http.as_ref()).await?;
        Ok(guild.owner_id.get())
    }

    async fn member_permissions(
        &self,
        guild_id: u64,
        member: &GuildMember,
    ) -> Result<MemberPermissions> {
        let permissions = match self.cached_permissions(guild_id, member.id) {
            Some(permissions) => permissions,
            None => {
                let owner_id = self.owner_id(guild_id).await?;
                let roles = self.raw_roles(GuildId::new(guild_id)).await?;
                compute_permissions(
                    guild_id,
                    owner_id,
                    member,
                    roles.iter().map(|(id, role)| (id.get(), role.permissions)),
                )
            }
        };
        Ok(MemberPermissions {
            manage_roles: permissions.contains(Permissions::MANAGE_ROLES),
            manage_nicknames: permissions.contains(Permissions::MANAGE_NICKNAMES),
        })
    }

    async fn create_role(&self, guild_id: u64, name: &str, reason: &str) -> Result<GuildRole> {
        let builder = EditRole::new()
            .name(name)
            .permissions(Permissions::empty())
            .audit_log_reason(reason);
        let role = GuildId::new(guild_id)
            .create_role(self.http.as_ref(), builder)
            .await?;
        Ok(to_guild_role(&role))
    }

    async fn add_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: &str,
    ) -> Result<()> {
        self.http
            .add_member_role(
                GuildId::new(guild_id),
                UserId::new(user_id),
                RoleId::new(role_id),
                Some(reason),
            )
            .await?;
        Ok(())
    }

    async fn set_nickname(
        &self,
        guild_id: u64,
        user_id: u64,
        nickname: &str,
        reason: &str,
    ) -> Result<()> {
        let guild_id = GuildId::new(guild_id);
        if user_id == self.bot_id.get() {
            // Own nickname goes through the current-member endpoint
            self.http
                .edit_nickname(guild_id, Some(nickname), Some(reason))
                .await?;
            return Ok(());
        }
        let builder = EditMember::new().nickname(nickname).audit_log_reason(reason);
        guild_id
            .edit_member(self.http.as_ref(), UserId::new(user_id), builder)
            .await?;
        Ok(())
    }

    async fn reply(&self, message: &IncomingMessage, content: &str) -> Result<()> {
        let channel = ChannelId::new(message.channel_id);
        let builder = CreateMessage::new()
            .content(content)
            .reference_message((channel, MessageId::new(message.id)));
        channel.send_message(self.http.as_ref(), builder).await?;
        Ok(())
    }
}

/// Guild-level permissions of a member when the guild is not cached: the owner
/// and administrators hold everything, everyone else holds the union of
/// `@everyone` and their roles.
pub(crate) fn compute_permissions(
    guild_id: u64,
    owner_id: u64,
    member: &GuildMember,
    role_permissions: impl IntoIterator<Item = (u64, Permissions)>,
) -> Permissions {
    if member.id == owner_id {
        return Permissions::all();
    }

    // The @everyone role shares the guild's id
    let permissions = role_permissions
        .into_iter()
        .filter(|(id, _)| *id == guild_id || member.role_ids.contains(id))
        .fold(Permissions::empty(), |acc, (_, p)| acc | p);

    if permissions.contains(Permissions::ADMINISTRATOR) {
        Permissions::all()
    } else {
        permissions
    }
}

pub(crate) fn to_guild_member(member: &Member) -> GuildMember {
    GuildMember {
        id: member.user.id.get(),
        username: member.user.name.clone(),
        display_name: member.display_name().to_string(),
        tag: member.user.tag(),
        bot: member.user.bot,
        role_ids: member.roles.iter().map(|r| r.get()).collect(),
    }
}

pub(crate) fn to_guild_role(role: &Role) -> GuildRole {
    GuildRole {
        id: role.id.get(),
        name: role.name.clone(),
        position: i64::from(role.position),
    }
}
