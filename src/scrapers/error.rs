//! Scraper error types.
//!
//! Each variant family matches the unit that contains it: provisioning
//! failures abort the run, navigation failures degrade a page, extraction
//! failures drop one listing, and persistence failures are retried later.

use std::path::PathBuf;

use thiserror::Error;

/// The browser could not be launched or connected to.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Chrome/Chromium not found: {0}")]
    NotFound(String),
    #[error("Invalid browser configuration: {0}")]
    Config(String),
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Failed to connect to remote browser at {url}: {reason}")]
    Remote { url: String, reason: String },
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unsupported,
}

/// A page could not be loaded or read back from the browser.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Navigation timed out after {secs}s for {url}")]
    Timeout { url: String, secs: u64 },
    #[error("Navigation failed for {url}: {reason}")]
    Failed { url: String, reason: String },
    #[error("Could not read page content for {url}: {reason}")]
    Content { url: String, reason: String },
    #[error("Browser session is closed")]
    Closed,
}

/// A single listing could not be turned into a record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("Invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("Attribute block without {0} element")]
    MissingElement(String),
    #[error("Icon attribute with empty itemprop name")]
    EmptyAttributeName,
}

/// Records could not be written to the output file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}
