//! Configuration for Optimo.
//!
//! All settings come from environment variables. Required credentials are
//! checked once at startup: a missing token is a [`ConfigError`] from
//! [`BotConfig::from_env`], never a per-request failure.
//!
//! # Storage Structure
//!
//! Local data lives under `~/.optimo/` (override with `OPTIMO_STATE_DIR`):
//!
//! ```text
//! ~/.optimo/
//! ├── .env.local    # Secrets, loaded before the environment is read
//! └── store/        # File-backed key-value snapshot
//! ```
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `OPENAI_API_KEY`: Completion service key (decisions)
//! - `ASSEMBLYAI_API_KEY`: Transcription service key (voice notes)
//!
//! Optional:
//! - `OPENAI_BASE_URL`, `OPENAI_MODEL`, `ASSEMBLYAI_BASE_URL`
//! - `USER_TZ`: IANA timezone for reminder times (default: Asia/Singapore)
//! - `OPTIMO_STORE`: `memory`, `file` or `upstash`
//! - `UPSTASH_REDIS_REST_URL`, `UPSTASH_REDIS_REST_TOKEN`
//! - `MODE_TTL_SECS`, `CLAIM_TTL_SECS`, `HTTP_TIMEOUT_SECS`
//! - `WEBHOOK_URL`, `TELEGRAM_WEBHOOK_SECRET`, `CRON_SECRET`
//! - `OPTIMO_HOST`, `PORT`

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use chrono_tz::Tz;
use optimo_persistence::upstash::{UPSTASH_TOKEN_ENV, UPSTASH_URL_ENV};
use optimo_persistence::StoreBackend;
use thiserror::Error;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "OPTIMO_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".optimo";

pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ASSEMBLYAI_API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

/// Default completion endpoint base.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default transcription endpoint base.
pub const DEFAULT_ASSEMBLYAI_BASE_URL: &str = "https://api.assemblyai.com";

/// Default timezone for interpreting `HH:MM`.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Singapore;

const DEFAULT_MODE_TTL_SECS: u64 = 15 * 60;
const DEFAULT_CLAIM_TTL_SECS: u64 = 120;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Transcription polls every 3 s, up to 30 times.
const DEFAULT_TRANSCRIPT_POLL_MS: u64 = 3_000;
const DEFAULT_TRANSCRIPT_MAX_POLLS: u32 = 30;

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the Optimo state directory.
///
/// 1. `OPTIMO_STATE_DIR` if set
/// 2. `~/.optimo` if a home directory is available
/// 3. `.optimo` in the current directory
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Secrets file loaded before configuration is read.
pub fn env_file() -> PathBuf {
    state_dir().join(".env.local")
}

/// Directory of the file-backed store.
pub fn store_dir() -> PathBuf {
    state_dir().join("store")
}

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set or empty.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but unusable.
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Completion (decision advice) settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Transcription (voice notes) settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionConfig {
    pub api_key: String,
    pub base_url: String,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Polls before giving up.
    pub max_polls: u32,
}

/// Complete bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub completion: CompletionConfig,
    pub transcription: TranscriptionConfig,
    /// Timezone `HH:MM` reminders are interpreted in.
    pub timezone: Tz,
    pub store: StoreBackend,
    /// Lifetime of a menu selection.
    pub mode_ttl: Duration,
    /// Lifetime of a reminder delivery lease.
    pub claim_ttl: Duration,
    /// Per-request timeout for every outbound HTTP call.
    pub http_timeout: Duration,
    /// Public base URL; `<url>/webhook` is registered with Telegram.
    pub webhook_url: Option<String>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` value.
    pub webhook_secret: Option<String>,
    /// Expected `Authorization: Bearer` value on `/cron`.
    pub cron_secret: Option<String>,
    pub host: String,
    pub port: u16,
}

impl BotConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup` (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let telegram_token = required(TELEGRAM_TOKEN_ENV)?;

        let completion = CompletionConfig {
            api_key: required(OPENAI_API_KEY_ENV)?,
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        };

        let transcription = TranscriptionConfig {
            api_key: required(ASSEMBLYAI_API_KEY_ENV)?,
            base_url: get("ASSEMBLYAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ASSEMBLYAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_interval: Duration::from_millis(DEFAULT_TRANSCRIPT_POLL_MS),
            max_polls: DEFAULT_TRANSCRIPT_MAX_POLLS,
        };

        let timezone = match get("USER_TZ") {
            Some(name) => Tz::from_str(&name).map_err(|e| ConfigError::Invalid {
                var: "USER_TZ",
                value: name.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let store = parse_store(&get)?;

        Ok(Self {
            telegram_token,
            completion,
            transcription,
            timezone,
            store,
            mode_ttl: Duration::from_secs(parse_number(&get, "MODE_TTL_SECS", DEFAULT_MODE_TTL_SECS)?),
            claim_ttl: Duration::from_secs(parse_number(&get, "CLAIM_TTL_SECS", DEFAULT_CLAIM_TTL_SECS)?),
            http_timeout: Duration::from_secs(parse_number(
                &get,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            webhook_url: get("WEBHOOK_URL").map(|u| u.trim_end_matches('/').to_string()),
            webhook_secret: get("TELEGRAM_WEBHOOK_SECRET"),
            cron_secret: get("CRON_SECRET"),
            host: get("OPTIMO_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number(&get, "PORT", DEFAULT_PORT)?,
        })
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: value.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_store<G>(get: &G) -> Result<StoreBackend, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let upstash = match (get(UPSTASH_URL_ENV), get(UPSTASH_TOKEN_ENV)) {
        (Some(url), Some(token)) => Some(StoreBackend::Upstash { url, token }),
        _ => None,
    };
    let file = || StoreBackend::File { dir: store_dir() };

    match get("OPTIMO_STORE").as_deref() {
        None => Ok(upstash.unwrap_or_else(file)),
        Some("memory") => Ok(StoreBackend::Memory),
        Some("file") => Ok(file()),
        Some("upstash") => upstash.ok_or(ConfigError::Missing(UPSTASH_URL_ENV)),
        Some(other) => Err(ConfigError::Invalid {
            var: "OPTIMO_STORE",
            value: other.to_string(),
            reason: "expected memory, file or upstash".to_string(),
        }),
    }
}
