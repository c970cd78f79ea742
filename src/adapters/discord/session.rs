//! Session handle. Bot token, logged-in identity and the single swept guild.
//!
//! Also owns the HTTP plumbing: auth headers, 429 handling, status mapping.

use crate::adapters::discord::mapper;
use crate::adapters::discord::models::{ApiPartialGuild, ApiRateLimit, ApiUser};
use crate::domain::{BotIdentity, DomainError};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Attempts per request when the API answers 429.
const MAX_ATTEMPTS: u32 = 3;

/// A logged-in bot session bound to one guild.
pub struct DiscordSession {
    http: Client,
    api_base: String,
    identity: BotIdentity,
    guild_id: u64,
}

impl DiscordSession {
    /// Validate the token and pick the guild to sweep.
    ///
    /// With `guild_id = None` the bot must be a member of exactly one guild.
    pub async fn connect(
        token: &str,
        api_base: &str,
        guild_id: Option<u64>,
    ) -> Result<Self, DomainError> {
        let http = build_client(token)?;
        let api_base = api_base.trim_end_matches('/').to_string();

        let me: ApiUser = get_json(&http, &format!("{}/users/@me", api_base)).await?;
        let identity = mapper::user_to_identity(&me)?;

        let guild_id = match guild_id {
            Some(id) => id,
            None => {
                let guilds: Vec<ApiPartialGuild> =
                    get_json(&http, &format!("{}/users/@me/guilds", api_base)).await?;
                match guilds.as_slice() {
                    [only] => {
                        info!(guild = %only.name, "using the only guild the bot is in");
                        mapper::parse_snowflake(&only.id)?
                    }
                    [] => {
                        return Err(DomainError::Session(
                            "bot is not a member of any guild".into(),
                        ));
                    }
                    many => {
                        return Err(DomainError::Session(format!(
                            "bot is in {} guilds; set DISCORD_TTL_GUILD_ID",
                            many.len()
                        )));
                    }
                }
            }
        };

        info!(
            bot = %identity.username,
            bot_id = identity.id,
            guild_id,
            "logged in"
        );
        Ok(Self {
            http,
            api_base,
            identity,
            guild_id,
        })
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DomainError> {
        get_json(&self.http, &self.url(path)).await
    }

    /// Like [`Self::get`], but a 404 yields `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, DomainError> {
        let url = self.url(path);
        let res = send(|| self.http.get(&url)).await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = check_status(res).await?;
        parse_json(res).await.map(Some)
    }

    /// Send a request built by `build`, honouring rate limits; fail on non-2xx.
    pub async fn execute<F>(&self, build: F) -> Result<Response, DomainError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let res = send(build).await?;
        check_status(res).await
    }
}

fn build_client(token: &str) -> Result<Client, DomainError> {
    let mut auth = HeaderValue::from_str(&format!("Bot {}", token))
        .map_err(|_| DomainError::Session("bot token contains invalid characters".into()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(
            "DiscordBot (https://github.com/discord-ttl, ",
            env!("CARGO_PKG_VERSION"),
            ")"
        )),
    );

    Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| DomainError::Session(format!("build HTTP client: {}", e)))
}

async fn get_json<T: DeserializeOwned>(http: &Client, url: &str) -> Result<T, DomainError> {
    let res = send(|| http.get(url)).await?;
    let res = check_status(res).await?;
    parse_json(res).await
}

async fn parse_json<T: DeserializeOwned>(res: Response) -> Result<T, DomainError> {
    res.json()
        .await
        .map_err(|e| DomainError::Gateway(format!("Failed to parse API response: {}", e)))
}

/// Send, sleeping and retrying while the API answers 429.
async fn send<F>(build: F) -> Result<Response, DomainError>
where
    F: Fn() -> RequestBuilder + Send + Sync,
{
    let mut retry_after_ms = 0u64;
    for attempt in 0..MAX_ATTEMPTS {
        let res = build()
            .send()
            .await
            .map_err(|e| DomainError::Gateway(format!("HTTP request failed: {}", e)))?;

        if res.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(res);
        }

        let (retry_after, global) = match res.json::<ApiRateLimit>().await {
            Ok(body) => (body.retry_after, body.global),
            Err(_) => (1.0, false),
        };
        retry_after_ms = (retry_after.max(0.0) * 1000.0).ceil() as u64;
        warn!(attempt, retry_after_ms, global, "rate limited, sleeping");
        tokio::time::sleep(Duration::from_millis(retry_after_ms)).await;
    }
    Err(DomainError::RateLimited { retry_after_ms })
}

async fn check_status(res: Response) -> Result<Response, DomainError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    warn!(status = %status, body = %text, "Discord API returned error");
    let err = format!(
        "API error {}: {}",
        status,
        text.chars().take(200).collect::<String>()
    );
    if status == StatusCode::UNAUTHORIZED {
        return Err(DomainError::Session(err));
    }
    Err(DomainError::Gateway(err))
}
