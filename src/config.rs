//! Layered service configuration.
//!
//! Sources, lowest priority first: compiled-in defaults, an optional TOML file
//! (`leadrelay.toml` unless `--config` names another), `LEADRELAY_*`
//! environment variables, the canonical `TELEGRAM_BOT_TOKEN` /
//! `TELEGRAM_CHAT_ID` variables, and finally CLI flags.
//!
//! The resulting [`AppConfig`] is injected into the service; nothing reads the
//! process environment after startup.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::enrich::providers::GeoProviderKind;
use crate::utils::mask_token;

pub const DEFAULT_CONFIG_FILE: &str = "leadrelay.toml";
const ENV_PREFIX: &str = "LEADRELAY";
const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// At most a primary and a secondary geolocation provider.
pub const MAX_GEO_PROVIDERS: usize = 2;

// ── Schema ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub intake: IntakeConfig,
    pub enrichment: EnrichmentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Path of the intake endpoint.
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            route: "/api/sendLead".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Bot API base URL. Overridden in tests to point at a mock server.
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl TelegramConfig {
    /// Token and chat id, if both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let chat_id = self.chat_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((token, chat_id))
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_deref().map(mask_token))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Name of the form field that carries the submitter's contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    /// Email address only.
    #[default]
    Email,
    /// Email address or phone number.
    Contact,
}

impl ContactField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Contact => "contact",
        }
    }

    /// The other field name, read when this one is empty.
    pub fn fallback(&self) -> Self {
        match self {
            Self::Email => Self::Contact,
            Self::Contact => Self::Email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub contact_field: ContactField,
    /// Reject contacts that are neither a plausible email nor phone number.
    pub enforce_format: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            contact_field: ContactField::Email,
            enforce_format: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    /// Geolocation providers in priority order.
    pub providers: Vec<GeoProviderKind>,
    /// Per-provider deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            providers: vec![GeoProviderKind::IpApi],
            timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily rolling log files. Console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file and environment.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let settings = Config::builder()
            .add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(path.is_some()),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("enrichment.providers")
                    .try_parsing(true),
            )
            .set_override_option("telegram.bot_token", env_non_empty(BOT_TOKEN_VAR))?
            .set_override_option("telegram.chat_id", env_non_empty(CHAT_ID_VAR))?
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(config)
    }

    /// Apply CLI flag overrides.
    pub fn with_overrides(mut self, bind: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.server.route.starts_with('/') {
            anyhow::bail!("server.route must start with '/': {}", self.server.route);
        }
        if self.enrichment.timeout_ms == 0 {
            anyhow::bail!("enrichment.timeout_ms must be greater than zero");
        }
        if self.enrichment.providers.len() > MAX_GEO_PROVIDERS {
            anyhow::bail!(
                "enrichment.providers accepts at most {} entries (primary and secondary), got {}",
                MAX_GEO_PROVIDERS,
                self.enrichment.providers.len()
            );
        }
        if self.telegram.request_timeout_secs == 0 {
            anyhow::bail!("telegram.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// TOML rendering with the bot token masked, for `check-config`.
    pub fn to_redacted_toml(&self) -> anyhow::Result<String> {
        let mut redacted = self.clone();
        redacted.telegram.bot_token = redacted.telegram.bot_token.as_deref().map(mask_token);
        toml::to_string_pretty(&redacted).context("Failed to render configuration")
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
