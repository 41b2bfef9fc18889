//! Configuration management for lock-bot

#[path = "config_tests.rs"]
mod config_tests;

use anyhow::{bail, Context, Result};
use lock_types::command::{DEFAULT_COMMAND_PREFIX, DEFAULT_NICKNAME, DEFAULT_ROLE_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable holding the bot token
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Read access to process environment variables.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

/// Delegates to `std::env`.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Load `KEY=value` lines from a dotenv file into the process environment.
///
/// Variables already set in the environment keep their value.
pub fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path)
        .with_context(|| format!("Failed to load env file: {}", path.display()))
}

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordBotConfig,
    #[serde(default)]
    pub lock: LockConfig,
}

/// Discord connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordBotConfig {
    /// Bot token from the Discord developer portal
    #[serde(default)]
    pub bot_token: String,
}

/// Settings of the lock command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Trigger prefix; `<prefix>me` targets the author
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Role handed out, matched case-insensitively
    #[serde(default = "default_role_name")]
    pub role_name: String,
    /// Nickname given to the target
    #[serde(default = "default_nickname")]
    pub nickname: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            role_name: default_role_name(),
            nickname: default_nickname(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let defaults = LockConfig::default();
        Config {
            discord: DiscordBotConfig {
                bot_token: env.var(TOKEN_ENV).unwrap_or_default(),
            },
            lock: LockConfig {
                command_prefix: env
                    .var("LOCK_COMMAND_PREFIX")
                    .unwrap_or(defaults.command_prefix),
                role_name: env.var("LOCK_ROLE_NAME").unwrap_or(defaults.role_name),
                nickname: env.var("LOCK_NICKNAME").unwrap_or(defaults.nickname),
            },
        }
    }

    /// Reject configurations the bot cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.discord.bot_token.trim().is_empty() {
            bail!("{} environment variable is required.", TOKEN_ENV);
        }
        if self.lock.command_prefix.trim().is_empty() {
            bail!("lock.command_prefix must not be empty");
        }
        if self.lock.role_name.trim().is_empty() {
            bail!("lock.role_name must not be empty");
        }
        Ok(())
    }
}

fn default_command_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

fn default_role_name() -> String {
    DEFAULT_ROLE_NAME.to_string()
}

fn default_nickname() -> String {
    DEFAULT_NICKNAME.to_string()
}
