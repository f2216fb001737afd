//! Listing site scraping.
//!
//! The browser module provides rendered pages; `listing` turns an index page
//! into ad references and `detail` turns one ad into a [`VehicleRecord`].
//!
//! [`VehicleRecord`]: crate::models::VehicleRecord

pub mod browser;
pub mod config;
pub mod detail;
pub mod error;
pub mod listing;
pub mod pacing;

pub use browser::{ensure_alive, BrowserEngineConfig, ChromeProvisioner, DriverProvisioner, PageDriver};
pub use config::{CrawlConfig, RetryMode, RetryPolicy, Selectors, SiteConfig};
pub use detail::{extract, ExtractOutcome};
pub use error::{ExtractError, NavigationError, PersistError, ProvisionError};
pub use listing::{fetch_page, FetchOutcome, ListingReference};
pub use pacing::PacingConfig;
