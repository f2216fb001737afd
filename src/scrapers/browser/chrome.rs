//! Chrome provisioning over CDP (chromiumoxide).

use std::path::{Path, PathBuf};

#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use async_trait::async_trait;
use tracing::info;
#[cfg(feature = "browser")]
use tracing::{debug, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use super::config::BrowserEngineConfig;
#[cfg(feature = "browser")]
use super::user_agent::pick_random;
use super::user_agent::UserAgentPool;
#[cfg(feature = "browser")]
use super::stealth::STEALTH_SCRIPTS;
#[cfg(feature = "browser")]
use super::{DriverProvisioner, PageDriver};
#[cfg(feature = "browser")]
use crate::scrapers::error::NavigationError;
use crate::scrapers::error::ProvisionError;

/// Launches (or connects to) Chrome with a fresh identity per acquisition.
pub struct ChromeProvisioner {
    config: BrowserEngineConfig,
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    user_agents: UserAgentPool,
}

impl ChromeProvisioner {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Executable names looked up in PATH.
    const CHROME_COMMANDS: &'static [&'static str] = &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ];

    pub fn new(config: BrowserEngineConfig) -> Self {
        let user_agents = UserAgentPool::from_config(&config.user_agents);
        Self {
            config,
            user_agents,
        }
    }

    /// Locate a Chrome executable: configured path, well-known paths, then PATH.
    pub fn find_chrome(&self) -> Result<PathBuf, ProvisionError> {
        if let Some(ref path) = self.config.chrome_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ProvisionError::NotFound(format!(
                "configured chrome_path {} does not exist",
                path.display()
            )));
        }

        for path in Self::CHROME_PATHS {
            let p = Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in Self::CHROME_COMMANDS {
            if let Ok(path) = which::which(cmd) {
                info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(ProvisionError::NotFound(
            "install it or set browser.chrome_path:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium"
                .to_string(),
        ))
    }

    /// Command-line flags for one launch.
    pub fn launch_args(&self, user_agent: &str, proxy: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = [
            "--no-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-blink-features=AutomationControlled",
            "--enable-unsafe-swiftshader",
            "--disable-infobars",
            "--no-first-run",
            "--no-default-browser-check",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push(format!("--user-agent={}", user_agent));
        if let Some(proxy) = proxy {
            args.push(format!("--proxy-server={}", proxy));
        }
        args.extend(self.config.chrome_args.iter().cloned());
        args
    }
}

#[cfg(feature = "browser")]
impl ChromeProvisioner {
    async fn launch(&self, user_agent: &str) -> Result<(Browser, JoinHandle<()>), ProvisionError> {
        let chrome_path = self.find_chrome()?;
        let proxy = pick_random(&self.config.proxies);

        info!(
            "Launching browser (headless={}, proxy={})",
            self.config.headless,
            proxy.unwrap_or("none")
        );

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }
        for arg in self.launch_args(user_agent, proxy) {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| ProvisionError::Config(e.to_string()))?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| ProvisionError::Launch(e.to_string()))?;

        Ok((browser, spawn_handler(handler)))
    }

    async fn connect_remote(&self, url: &str) -> Result<(Browser, JoinHandle<()>), ProvisionError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );
        let remote_err = |reason: String| ProvisionError::Remote {
            url: url.to_string(),
            reason,
        };

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| remote_err(e.to_string()))?
            .json()
            .await
            .map_err(|e| remote_err(format!("bad version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| remote_err("no webSocketDebuggerUrl in response".to_string()))?;

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };
        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| remote_err(e.to_string()))?;

        Ok((browser, spawn_handler(handler)))
    }

    /// Open the working tab and give it this acquisition's identity.
    async fn prepare_page(&self, browser: &Browser, user_agent: &str) -> Result<Page, ProvisionError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProvisionError::Launch(format!("could not open tab: {}", e)))?;

        page.execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
            .await
            .map_err(|e| ProvisionError::Launch(format!("could not set user agent: {}", e)))?;

        if self.config.stealth {
            for script in STEALTH_SCRIPTS {
                if let Err(e) = page
                    .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                        script.to_string(),
                    ))
                    .await
                {
                    debug!("Stealth script registration skipped: {}", e);
                }
            }
        }

        Ok(page)
    }
}

/// Drive the CDP event loop until the connection drops.
#[cfg(feature = "browser")]
fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

#[cfg(feature = "browser")]
#[async_trait]
impl DriverProvisioner for ChromeProvisioner {
    async fn acquire(&self) -> Result<Box<dyn PageDriver>, ProvisionError> {
        let user_agent = self.user_agents.pick().to_string();

        let (mut browser, handler) = match self.config.remote_url {
            Some(ref url) => self.connect_remote(url).await?,
            None => self.launch(&user_agent).await?,
        };

        let page = match self.prepare_page(&browser, &user_agent).await {
            Ok(page) => page,
            Err(e) => {
                if self.config.remote_url.is_none() {
                    let _ = browser.close().await;
                }
                handler.abort();
                return Err(e);
            }
        };

        debug!("Browser ready with user agent: {}", user_agent);

        Ok(Box::new(ChromeSession {
            browser,
            page: Some(page),
            handler,
            owns_process: self.config.remote_url.is_none(),
            timeout_secs: self.config.timeout,
        }))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait::async_trait]
impl super::DriverProvisioner for ChromeProvisioner {
    async fn acquire(&self) -> Result<Box<dyn super::PageDriver>, ProvisionError> {
        Err(ProvisionError::Unsupported)
    }
}

/// One live Chrome instance with a single working tab.
#[cfg(feature = "browser")]
pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    /// False when attached to a remote browser we must not shut down.
    owns_process: bool,
    timeout_secs: u64,
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for ChromeSession {
    async fn load(&mut self, url: &str) -> Result<String, NavigationError> {
        url::Url::parse(url).map_err(|e| NavigationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let page = self.page.as_ref().ok_or(NavigationError::Closed)?;

        debug!("Navigating to {}", url);
        tokio::time::timeout(Duration::from_secs(self.timeout_secs), page.goto(url))
            .await
            .map_err(|_| NavigationError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            })?
            .map_err(|e| NavigationError::Failed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        page.content().await.map_err(|e| NavigationError::Content {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn is_alive(&mut self) -> bool {
        if self.page.is_none() || self.handler.is_finished() {
            return false;
        }
        match self.browser.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("Browser process exited: {}", status);
                false
            }
            Err(e) => {
                warn!("Could not poll browser process: {}", e);
                false
            }
        }
    }

    async fn quit(&mut self) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if self.owns_process {
            if let Err(e) = self.browser.close().await {
                debug!("Browser close failed: {}", e);
            }
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
    }
}
