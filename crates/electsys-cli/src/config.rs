//! Configuration loading and resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use electsys::http::{DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use electsys::{
    Classifier, Endpoints, HttpSession, Portal, RequestExecutor, RetryPolicy, DEFAULT_BASE_URL,
};

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "ELECTSYS_CONFIG";
/// Environment variable holding the portal cookie header.
pub const COOKIE_ENV: &str = "ELECTSYS_COOKIE";

/// Settings for talking to the portal. Every field has a default, so a
/// partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Wait between transport retries.
    pub retry_delay_ms: u64,
    /// Cap on attempts per request; unset retries forever.
    pub max_attempts: Option<u32>,
    /// Wait between election rounds.
    pub round_interval_ms: u64,
}

impl Default for ElectConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry_delay_ms: 1000,
            max_attempts: None,
            round_interval_ms: 1000,
        }
    }
}

impl ElectConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.retry_delay_ms);
        match self.max_attempts {
            Some(max) => RetryPolicy::bounded(max, delay),
            None => RetryPolicy::unbounded(delay),
        }
    }

    pub fn portal(&self) -> Portal {
        Portal::new(
            RequestExecutor::new(self.retry_policy()),
            Classifier::default(),
            Endpoints::with_base_url(&self.base_url),
        )
    }

    pub fn session(&self, cookie: &str) -> Result<HttpSession> {
        HttpSession::from_cookie_header(&self.base_url, cookie, self.timeout_ms, &self.user_agent)
            .context("failed to build portal session")
    }
}

/// Resolve the config file path: explicit flag, then `ELECTSYS_CONFIG`,
/// then `./electsys.json`, then `~/.electsys/config.json`. Returns `None`
/// when no candidate exists.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }

    let cwd_config = PathBuf::from("electsys.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    dirs::home_dir()
        .map(|home| home.join(".electsys").join("config.json"))
        .filter(|p| p.exists())
}

/// Load the config at `path`, or defaults when there is none.
pub fn load_config(path: Option<&Path>) -> Result<ElectConfig> {
    let Some(path) = path else {
        return Ok(ElectConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let config: ElectConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Resolve the portal cookie header: explicit flag, then `ELECTSYS_COOKIE`.
pub fn resolve_cookie(explicit: Option<&str>) -> Result<String> {
    let cookie = match explicit {
        Some(c) => c.to_string(),
        None => std::env::var(COOKIE_ENV).unwrap_or_default(),
    };
    if cookie.trim().is_empty() {
        bail!("no portal cookie: pass --cookie or set {COOKIE_ENV} (e.g. \"JSESSIONID=...\")");
    }
    Ok(cookie)
}
