//! Headless browser provisioning.
//!
//! Uses chromiumoxide (CDP) with stealth evasion scripts and a rotating
//! user agent. The rest of the scraper only sees the [`PageDriver`] and
//! [`DriverProvisioner`] traits, so the page loop can run against any
//! source of rendered HTML.

mod chrome;
mod config;
mod stealth;
mod user_agent;

pub use chrome::ChromeProvisioner;
#[cfg(feature = "browser")]
pub use chrome::ChromeSession;
pub use config::{default_headless, default_timeout, BrowserEngineConfig};
pub use user_agent::{pick_random, UserAgentPool, DEFAULT_USER_AGENTS};

use async_trait::async_trait;
use tracing::info;

use super::error::{NavigationError, ProvisionError};

/// A live browser session that can render pages.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to `url` and return the rendered page HTML.
    async fn load(&mut self, url: &str) -> Result<String, NavigationError>;

    /// Whether the underlying browser is still running.
    fn is_alive(&mut self) -> bool;

    /// Shut the session down. Safe to call more than once.
    async fn quit(&mut self);
}

/// Creates browser sessions.
#[async_trait]
pub trait DriverProvisioner: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn PageDriver>, ProvisionError>;
}

/// Replace `driver` with a fresh session if its browser has died.
///
/// The check is best effort: the browser can still die between this call
/// and the next navigation.
pub async fn ensure_alive(
    provisioner: &dyn DriverProvisioner,
    mut driver: Box<dyn PageDriver>,
) -> Result<Box<dyn PageDriver>, ProvisionError> {
    if driver.is_alive() {
        return Ok(driver);
    }

    info!("Browser disconnected. Restarting...");
    driver.quit().await;
    provisioner.acquire().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct StubDriver {
        alive: bool,
        quits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PageDriver for StubDriver {
        async fn load(&mut self, _url: &str) -> Result<String, NavigationError> {
            Ok("<html></html>".to_string())
        }

        fn is_alive(&mut self) -> bool {
            self.alive
        }

        async fn quit(&mut self) {
            self.quits.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StubProvisioner {
        acquired: AtomicUsize,
        quits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DriverProvisioner for StubProvisioner {
        async fn acquire(&self) -> Result<Box<dyn PageDriver>, ProvisionError> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubDriver {
                alive: true,
                quits: self.quits.clone(),
            }))
        }
    }

    struct FailingProvisioner;

    #[async_trait]
    impl DriverProvisioner for FailingProvisioner {
        async fn acquire(&self) -> Result<Box<dyn PageDriver>, ProvisionError> {
            Err(ProvisionError::NotFound("no chrome here".to_string()))
        }
    }

    fn stub_provisioner() -> StubProvisioner {
        StubProvisioner {
            acquired: AtomicUsize::new(0),
            quits: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[tokio::test]
    async fn live_driver_is_kept() {
        let provisioner = stub_provisioner();
        let driver = Box::new(StubDriver {
            alive: true,
            quits: provisioner.quits.clone(),
        });

        let mut driver = ensure_alive(&provisioner, driver).await.unwrap();

        assert!(driver.is_alive());
        assert_eq!(provisioner.acquired.load(Ordering::SeqCst), 0);
        assert_eq!(provisioner.quits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dead_driver_is_replaced() {
        let provisioner = stub_provisioner();
        let driver = Box::new(StubDriver {
            alive: false,
            quits: provisioner.quits.clone(),
        });

        let mut driver = ensure_alive(&provisioner, driver).await.unwrap();

        assert!(driver.is_alive());
        assert_eq!(provisioner.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(provisioner.quits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn restart_failure_propagates() {
        let driver = Box::new(StubDriver {
            alive: false,
            quits: Arc::new(AtomicUsize::new(0)),
        });

        let result = ensure_alive(&FailingProvisioner, driver).await;
        assert!(matches!(result, Err(ProvisionError::NotFound(_))));
    }
}
