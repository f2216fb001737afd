//! Browser check command.

use console::style;

use crate::cli::icons::{arrow, error, success};
use crate::config::Config;
use crate::logging;
use crate::scrapers::browser::{ChromeProvisioner, DriverProvisioner};

/// Provision a browser, load a blank page, and release it.
pub async fn cmd_check(config: Config, verbose: bool) -> anyhow::Result<()> {
    logging::init(None, verbose, config.log.level.as_deref())?;
    config.browser.validate().map_err(|e| anyhow::anyhow!(e))?;

    let provisioner = ChromeProvisioner::new(config.browser.clone());

    match &config.browser.remote_url {
        Some(url) => eprintln!("  {} Remote browser: {}", arrow(), url),
        None => match provisioner.find_chrome() {
            Ok(path) => eprintln!("  {} Chrome: {}", arrow(), path.display()),
            Err(e) => {
                eprintln!("{} {}", error(), e);
                anyhow::bail!("browser check failed");
            }
        },
    }

    let mut driver = match provisioner.acquire().await {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{} Could not start browser: {}", error(), e);
            anyhow::bail!("browser check failed");
        }
    };

    let loaded = driver.load("about:blank").await;
    driver.quit().await;

    match loaded {
        Ok(_) => {
            eprintln!("{} Browser is working", success());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} Browser started but {}", error(), style(&e).red());
            anyhow::bail!("browser check failed");
        }
    }
}
