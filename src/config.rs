use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Secrets as read from the environment. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub practicum_token: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

/// Secrets after the startup gate has passed.
#[derive(Debug, Clone)]
pub struct RequiredCredentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl Credentials {
    /// Read the three secrets from the process environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        // A missing .env is normal in production; the variables come from the shell.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            practicum_token: lookup(PRACTICUM_TOKEN),
            telegram_token: lookup(TELEGRAM_TOKEN),
            telegram_chat_id: lookup(TELEGRAM_CHAT_ID),
        }
    }

    /// True only if every secret is present. Empty strings count as present.
    pub fn check_tokens(&self) -> bool {
        self.practicum_token.is_some()
            && self.telegram_token.is_some()
            && self.telegram_chat_id.is_some()
    }

    /// Names of the variables that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN, &self.practicum_token),
            (TELEGRAM_TOKEN, &self.telegram_token),
            (TELEGRAM_CHAT_ID, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn require(self) -> Option<RequiredCredentials> {
        Some(RequiredCredentials {
            practicum_token: self.practicum_token?,
            telegram_token: self.telegram_token?,
            telegram_chat_id: self.telegram_chat_id?,
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub poller: PollerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_retry_period_secs")]
    pub retry_period_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            retry_period_secs: default_retry_period_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

fn default_retry_period_secs() -> u64 {
    600
}

/// One week.
pub const MAX_RETRY_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

impl Settings {
    /// Load tunables from a TOML file.
    ///
    /// Never fails: a missing, unreadable or invalid file yields the defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::read(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring config file, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        let period = settings.poller.retry_period_secs;
        if period == 0 || period > MAX_RETRY_PERIOD_SECS {
            anyhow::bail!(
                "poller.retry_period_secs must be between 1 and {}, got {}",
                MAX_RETRY_PERIOD_SECS,
                period
            );
        }
        Ok(settings)
    }
}
