// Configuration for Balance Monitor service

use anyhow::{anyhow, Context, Result};
use balance_ledger::{amount::DEFAULT_TOKEN_DECIMALS, AccountAddress};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080/erc20/api";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSettings,
    pub accounts: Vec<String>,
    /// Six-field cron expression; one-shot run when unset
    pub poll_schedule: Option<String>,
    pub display: DisplayConfig,
    /// Prometheus textfile written after each refresh
    pub metrics_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            accounts: Vec::new(),
            poll_schedule: None,
            display: DisplayConfig::default(),
            metrics_file: None,
            log_format: LogFormat::Text,
        }
    }
}

/// Where the payment backend lives and how to authenticate against it
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub backend_url: String,
    pub bearer_token: String,
    pub enable_bearer_token: bool,
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            bearer_token: String::new(),
            enable_bearer_token: false,
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.bearer_token.is_empty() { "" } else { "<redacted>" };

        f.debug_struct("BackendSettings")
            .field("backend_url", &self.backend_url)
            .field("bearer_token", &token)
            .field("enable_bearer_token", &self.enable_bearer_token)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl BackendSettings {
    /// Token to send, only when enabled and non-empty
    pub fn bearer_token(&self) -> Option<&str> {
        (self.enable_bearer_token && !self.bearer_token.is_empty())
            .then_some(self.bearer_token.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub token_decimals: u32,
    pub token_symbol: String,
    pub output: OutputFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            token_symbol: "GLM".to_string(),
            output: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("Unknown output format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("Unknown log format: {other}")),
        }
    }
}

impl Config {
    /// Load from `BALANCE_MONITOR_CONFIG` if set, otherwise from the environment
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        match env::var("BALANCE_MONITOR_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Self::from_env(),
        }
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(url) = lookup("BACKEND_URL") {
            config.backend.backend_url = url;
        }

        if let Some(token) = lookup("BEARER_TOKEN") {
            config.backend.bearer_token = token;
        }

        if let Some(enabled) = lookup("BEARER_TOKEN_ENABLED") {
            config.backend.enable_bearer_token = parse_flag(&enabled);
        }

        if let Some(timeout) = lookup("BACKEND_TIMEOUT_SECS") {
            config.backend.request_timeout_secs = timeout
                .parse()
                .context("BACKEND_TIMEOUT_SECS must be a number of seconds")?;
        }

        if let Some(accounts) = lookup("BALANCE_ACCOUNTS") {
            config.accounts = parse_account_list(&accounts)?;
        }

        config.poll_schedule = lookup("POLL_SCHEDULE").filter(|s| !s.trim().is_empty());

        if let Some(decimals) = lookup("TOKEN_DECIMALS") {
            config.display.token_decimals = decimals
                .parse()
                .context("TOKEN_DECIMALS must be a non-negative integer")?;
        }

        if let Some(symbol) = lookup("TOKEN_SYMBOL") {
            config.display.token_symbol = symbol;
        }

        if let Some(output) = lookup("OUTPUT_FORMAT") {
            config.display.output = output.parse()?;
        }

        config.metrics_file = lookup("METRICS_FILE").map(PathBuf::from);

        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Monitored accounts, validated and normalized
    pub fn account_addresses(&self) -> Result<Vec<AccountAddress>> {
        self.accounts
            .iter()
            .map(|raw| AccountAddress::parse(raw).map_err(anyhow::Error::from))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let url = &self.backend.backend_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("Backend URL must be http(s): {url:?}"));
        }

        if self.accounts.is_empty() {
            return Err(anyhow!("No accounts configured (set BALANCE_ACCOUNTS)"));
        }

        self.account_addresses()?;
        Ok(())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Accept a JSON array or a comma-separated list
fn parse_account_list(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();

    if raw.starts_with('[') {
        return serde_json::from_str(raw).context("Failed to parse BALANCE_ACCOUNTS JSON");
    }

    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}
