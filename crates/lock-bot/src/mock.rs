//! In-memory guild for unit testing the lock command without Discord.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use lock_types::{GuildMember, GuildRole, IncomingMessage, MemberPermissions};

use crate::errors::PlatformError;
use crate::platform::{GuildPlatform, Result};

/// A recorded call through the platform seam
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    FetchMember(u64),
    CachedMembers,
    Roles,
    OwnerId,
    MemberPermissions(u64),
    CreateRole { name: String, reason: String },
    AddRole { user_id: u64, role_id: u64, reason: String },
    SetNickname { user_id: u64, nickname: String, reason: String },
    Reply(String),
}

impl PlatformCall {
    /// True for calls that change guild state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateRole { .. } | Self::AddRole { .. } | Self::SetNickname { .. }
        )
    }
}

/// Calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateRole,
    AddRole,
    SetNickname,
    Reply,
}

/// In-memory guild that records every call.
/// Use in tests instead of `SerenityPlatform`.
///
/// # Example
/// ```rust,ignore
/// let guild = MockPlatform::new(BOT_ID, OWNER_ID).with_member(alice);
/// service.handle_message(&guild, &message).await;
/// assert_eq!(guild.replies().len(), 1);
/// ```
#[derive(Clone)]
pub struct MockPlatform {
    bot_id: u64,
    state: Arc<Mutex<MockGuild>>,
}

struct MockGuild {
    owner_id: u64,
    members: HashMap<u64, GuildMember>,
    /// Members visible in the cache but not fetchable by id
    unfetchable: HashSet<u64>,
    roles: Vec<GuildRole>,
    bot_permissions: MemberPermissions,
    failures: HashSet<FailPoint>,
    next_role_id: u64,
    calls: Vec<PlatformCall>,
}

impl MockPlatform {
    /// Empty guild; the bot holds both lock permissions.
    pub fn new(bot_id: u64, owner_id: u64) -> Self {
        Self {
            bot_id,
            state: Arc::new(Mutex::new(MockGuild {
                owner_id,
                members: HashMap::new(),
                unfetchable: HashSet::new(),
                roles: Vec::new(),
                bot_permissions: MemberPermissions::all(),
                failures: HashSet::new(),
                next_role_id: 10_000,
                calls: Vec::new(),
            })),
        }
    }

    pub fn with_member(self, member: GuildMember) -> Self {
        self.state.lock().unwrap().members.insert(member.id, member);
        self
    }

    /// Member found in the cache but whose fetch by id fails
    pub fn with_unfetchable_member(self, member: GuildMember) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.unfetchable.insert(member.id);
            state.members.insert(member.id, member);
        }
        self
    }

    pub fn with_role(self, id: u64, name: &str, position: i64) -> Self {
        self.state.lock().unwrap().roles.push(GuildRole {
            id,
            name: name.to_string(),
            position,
        });
        self
    }

    pub fn with_bot_permissions(self, permissions: MemberPermissions) -> Self {
        self.state.lock().unwrap().bot_permissions = permissions;
        self
    }

    pub fn failing(self, point: FailPoint) -> Self {
        self.state.lock().unwrap().failures.insert(point);
        self
    }

    /// Snapshot of all recorded calls, in call order.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Contents of all replies sent so far.
    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::Reply(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Recorded calls that change guild state.
    pub fn mutations(&self) -> Vec<PlatformCall> {
        self.calls().into_iter().filter(|c| c.is_mutation()).collect()
    }

    pub fn roles_named(&self, name: &str) -> Vec<GuildRole> {
        self.state
            .lock()
            .unwrap()
            .roles
            .iter()
            .filter(|r| r.has_name(name))
            .cloned()
            .collect()
    }

    pub fn member(&self, id: u64) -> Option<GuildMember> {
        self.state.lock().unwrap().members.get(&id).cloned()
    }

    fn record(&self, call: PlatformCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if self.state.lock().unwrap().failures.contains(&point) {
            return Err(PlatformError::Discord(serenity::Error::Other(
                "injected platform failure",
            )));
        }
        Ok(())
    }
}

impl GuildPlatform for MockPlatform {
    fn bot_id(&self) -> u64 {
        self.bot_id
    }

    async fn fetch_member(&self, _guild_id: u64, user_id: u64) -> Result<GuildMember> {
        self.record(PlatformCall::FetchMember(user_id));
        let state = self.state.lock().unwrap();
        if state.unfetchable.contains(&user_id) {
            return Err(PlatformError::MemberNotFound(user_id));
        }
        state
            .members
            .get(&user_id)
            .cloned()
            .ok_or(PlatformError::MemberNotFound(user_id))
    }

    async fn cached_members(&self, _guild_id: u64) -> Result<Vec<GuildMember>> {
        self.record(PlatformCall::CachedMembers);
        let state = self.state.lock().unwrap();
        let mut members: Vec<GuildMember> = state.members.values().cloned().collect();
        members.sort_by_key(|m| m.id);
        Ok(members)
    }

    async fn roles(&self, _guild_id: u64) -> Result<Vec<GuildRole>> {
        self.record(PlatformCall::Roles);
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn owner_id(&self, _guild_id: u64) -> Result<u64> {
        self.record(PlatformCall::OwnerId);
        Ok(self.state.lock().unwrap().owner_id)
    }

    async fn member_permissions(
        &self,
        _guild_id: u64,
        member: &GuildMember,
    ) -> Result<MemberPermissions> {
        self.record(PlatformCall::MemberPermissions(member.id));
        let state = self.state.lock().unwrap();
        if member.id == self.bot_id {
            Ok(state.bot_permissions)
        } else {
            Ok(MemberPermissions::default())
        }
    }

    async fn create_role(&self, _guild_id: u64, name: &str, reason: &str) -> Result<GuildRole> {
        self.record(PlatformCall::CreateRole {
            name: name.to_string(),
            reason: reason.to_string(),
        });
        self.check(FailPoint::CreateRole)?;

        // New roles land at position 1, pushing everything else up
        let mut state = self.state.lock().unwrap();
        for role in state.roles.iter_mut().filter(|r| r.position >= 1) {
            role.position += 1;
        }
        let role = GuildRole {
            id: state.next_role_id,
            name: name.to_string(),
            position: 1,
        };
        state.next_role_id += 1;
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn add_role(
        &self,
        _guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: &str,
    ) -> Result<()> {
        self.record(PlatformCall::AddRole {
            user_id,
            role_id,
            reason: reason.to_string(),
        });
        self.check(FailPoint::AddRole)?;

        let mut state = self.state.lock().unwrap();
        let member = state
            .members
            .get_mut(&user_id)
            .ok_or(PlatformError::MemberNotFound(user_id))?;
        if !member.role_ids.contains(&role_id) {
            member.role_ids.push(role_id);
        }
        Ok(())
    }

    async fn set_nickname(
        &self,
        _guild_id: u64,
        user_id: u64,
        nickname: &str,
        reason: &str,
    ) -> Result<()> {
        self.record(PlatformCall::SetNickname {
            user_id,
            nickname: nickname.to_string(),
            reason: reason.to_string(),
        });
        self.check(FailPoint::SetNickname)?;

        let mut state = self.state.lock().unwrap();
        let member = state
            .members
            .get_mut(&user_id)
            .ok_or(PlatformError::MemberNotFound(user_id))?;
        member.display_name = nickname.to_string();
        Ok(())
    }

    async fn reply(&self, _message: &IncomingMessage, content: &str) -> Result<()> {
        self.record(PlatformCall::Reply(content.to_string()));
        self.check(FailPoint::Reply)
    }
}
