//! Application configuration. Bot credentials, guild, channels, retention.

use crate::adapters::discord::DEFAULT_API_BASE;
use crate::domain::{DomainError, RetentionPolicy, SweepConfig};
use serde::Deserialize;

/// Channels swept when none are configured.
pub const DEFAULT_CHANNELS: &[&str] = &["general"];

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Bot token. Read from DISCORD_BOT_TOKEN.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Message time-to-live in seconds. Read from DEFAULT_MESSAGE_TTL.
    #[serde(default)]
    pub message_ttl_secs: Option<i64>,

    /// Raw DEFAULT_MESSAGE_TTL value; parsed (and rejected if malformed) by `retention`.
    #[serde(skip)]
    pub message_ttl_raw: Option<String>,

    /// Guild to sweep. Read from DISCORD_TTL_GUILD_ID; optional when the bot is in one guild only.
    #[serde(default)]
    pub guild_id: Option<u64>,

    /// Comma-separated channel names. Read from DISCORD_TTL_CHANNELS.
    #[serde(default)]
    pub channels: Option<String>,

    /// Preview (dry-run) mode. Read from DISCORD_TTL_PREVIEW; defaults to true.
    #[serde(default)]
    pub preview: Option<bool>,

    /// REST API base URL. Read from DISCORD_TTL_API_BASE.
    #[serde(default)]
    pub api_base: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("DISCORD_TTL").try_parsing(true));
        if let Ok(path) = std::env::var("DISCORD_TTL_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // DISCORD_BOT_TOKEN and DEFAULT_MESSAGE_TTL are read without the DISCORD_TTL_ prefix
        if let Ok(token) = std::env::var("DISCORD_BOT_TOKEN") {
            cfg.bot_token = Some(token);
        }
        if let Ok(raw) = std::env::var("DEFAULT_MESSAGE_TTL") {
            cfg.message_ttl_raw = Some(raw);
        }
        Ok(cfg)
    }

    /// Returns the bot token, or a config error if unset.
    pub fn bot_token(&self) -> Result<String, DomainError> {
        self.bot_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DomainError::Config("Set DISCORD_BOT_TOKEN (env or .env)".into()))
    }

    /// Validated retention policy. Fails before any network activity.
    pub fn retention(&self) -> Result<RetentionPolicy, DomainError> {
        let secs = match self.message_ttl_raw.as_deref() {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                DomainError::Config(format!(
                    "DEFAULT_MESSAGE_TTL must be a whole number of seconds, got {:?}",
                    raw
                ))
            })?,
            None => self.message_ttl_secs.ok_or_else(|| {
                DomainError::Config("Set DEFAULT_MESSAGE_TTL (seconds) in env or .env".into())
            })?,
        };
        RetentionPolicy::from_secs(secs)
    }

    /// Configured channel names in order (duplicates kept). Defaults to DEFAULT_CHANNELS.
    pub fn channel_names(&self) -> Vec<String> {
        match self.channels.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            _ => DEFAULT_CHANNELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Returns preview mode. Defaults to true; live deletion must be asked for.
    pub fn preview_or_default(&self) -> bool {
        self.preview.unwrap_or(true)
    }

    /// Returns the REST API base URL. Defaults to Discord's v10 API.
    pub fn api_base_or_default(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    /// Assemble the sweep input from this configuration.
    pub fn sweep_config(&self) -> Result<SweepConfig, DomainError> {
        Ok(SweepConfig::new(
            self.channel_names(),
            self.retention()?,
            self.preview_or_default(),
        ))
    }
}
