//! Browser engine configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false for debugging or if headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Chrome executable to launch. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    /// Can also be set via BROWSER_URL environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Proxy servers; one is picked at random for each browser launch.
    #[serde(default)]
    pub proxies: Vec<String>,

    /// User agents; one is picked at random for each browser launch.
    /// Empty means the built-in pool.
    #[serde(default)]
    pub user_agents: Vec<String>,

    /// Inject automation-hiding scripts into every page.
    #[serde(default = "default_stealth")]
    pub stealth: bool,
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    50
}

fn default_stealth() -> bool {
    true
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout: default_timeout(),
            chrome_path: None,
            chrome_args: Vec::new(),
            remote_url: None,
            proxies: Vec::new(),
            user_agents: Vec::new(),
            stealth: default_stealth(),
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `CARLOT_PROXIES` - Comma-separated proxy pool (replaces the configured one)
    /// - `CARLOT_CHROME` - Chrome executable path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.is_empty() {
                self.remote_url = Some(val);
            }
        }

        if let Ok(val) = std::env::var("CARLOT_PROXIES") {
            let proxies = split_list(&val);
            if !proxies.is_empty() {
                self.proxies = proxies;
            }
        }

        if let Ok(val) = std::env::var("CARLOT_CHROME") {
            if !val.is_empty() {
                self.chrome_path = Some(PathBuf::from(val));
            }
        }

        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err("browser.timeout must be at least 1 second".to_string());
        }
        for proxy in &self.proxies {
            url::Url::parse(proxy)
                .map_err(|e| format!("browser.proxies entry {:?} is invalid: {}", proxy, e))?;
        }
        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
