//! Configuration loading.
//!
//! A config file is optional. When none is given on the command line,
//! prefer discovers a `carlot` config file in the standard locations;
//! without one the defaults are used. Environment variables are applied
//! on top of whatever was loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scrapers::browser::BrowserEngineConfig;
use crate::scrapers::config::{CrawlConfig, SiteConfig};

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON Lines file records are appended to.
    #[serde(default = "default_output_path")]
    pub path: String,
}

fn default_output_path() -> String {
    "data.json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// Log settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file appended to alongside the console. Defaults to `logs/app.log`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Filter directive, e.g. `carlot=debug`. `RUST_LOG` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub browser: BrowserEngineConfig,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load from an explicit path, or discover one. Environment overrides
    /// are applied in both cases.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(format!("Config file not found: {}", path.display()));
                }
                Self::load_from_path(path).await?
            }
            None => Self::discover().await?,
        };

        Ok(config.with_env_overrides())
    }

    /// Use prefer for file discovery, then parse with serde.
    async fn discover() -> Result<Self, String> {
        let discovered = match prefer::load("carlot").await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            // No config file found
            Err(_) => None,
        };

        match discovered {
            Some(path) => {
                debug!("Using config file {}", path.display());
                Self::load_from_path(&path).await
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    /// TOML, YAML or JSON, chosen by file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// - `CARLOT_OUTPUT` - output file
    /// - `CARLOT_MAX_PAGES` - page ceiling
    /// - `CARLOT_LOG_FILE` - log file
    /// - plus the browser overrides (`BROWSER_URL`, `CARLOT_PROXIES`, `CARLOT_CHROME`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("CARLOT_OUTPUT") {
            if !val.is_empty() {
                self.output.path = val;
            }
        }

        if let Ok(val) = std::env::var("CARLOT_MAX_PAGES") {
            match val.trim().parse() {
                Ok(pages) => self.crawl.max_pages = pages,
                Err(_) => warn!("Ignoring invalid CARLOT_MAX_PAGES value {:?}", val),
            }
        }

        if let Ok(val) = std::env::var("CARLOT_LOG_FILE") {
            if !val.is_empty() {
                self.log.file = Some(val);
            }
        }

        self.browser = self.browser.with_env_overrides();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.site.validate()?;
        self.browser.validate()?;
        self.crawl.validate()?;
        if self.output.path.trim().is_empty() {
            return Err("output.path must not be empty".to_string());
        }
        Ok(())
    }

    /// Directory relative paths are resolved against: the config file's
    /// directory when there is one, otherwise the working directory.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve a configured path.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are joined onto [`Config::base_dir`]
    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve_path(&self.output.path)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve_path(self.log.file.as_deref().unwrap_or(DEFAULT_LOG_FILE))
    }
}
