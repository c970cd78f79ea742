//! Discord REST payloads, exactly as they appear on the wire.
//!
//! Snowflakes stay strings here; the mapper parses them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: String,
    pub username: String,
}

/// Entry of `GET /users/@me/guilds`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPartialGuild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGuild {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub roles: Vec<ApiRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRole {
    pub id: String,
    /// Decimal bit set.
    pub permissions: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMember {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permission_overwrites: Vec<ApiOverwrite>,
}

/// Overwrite target type: 0 = role, 1 = member.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiOverwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub allow: String,
    pub deny: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    pub author: ApiUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiBulkDelete {
    pub messages: Vec<String>,
}

/// Body of a 429 response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateLimit {
    /// Seconds (fractional).
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
}
