//! Scraper configuration types.
//!
//! These structs describe the target site's markup and how the page loop
//! walks it: where the index lives, which CSS selectors pick out listings
//! and fields, and how hard to retry.

use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use super::error::ExtractError;
use super::pacing::PacingConfig;

/// Target site configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Paginated index URL; `?page=N` is appended per page.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Host prefix joined with each listing's relative href.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub selectors: Selectors,
}

fn default_base_url() -> String {
    "https://jiji.ng/cars".to_string()
}

fn default_host() -> String {
    "https://jiji.ng".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            host: default_host(),
            selectors: Selectors::default(),
        }
    }
}

impl SiteConfig {
    /// Index URL for a page number.
    pub fn page_url(&self, page: u32) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.base_url, sep, page)
    }

    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.base_url)
            .map_err(|e| format!("site.base_url {:?} is not a valid URL: {}", self.base_url, e))?;
        url::Url::parse(&self.host)
            .map_err(|e| format!("site.host {:?} is not a valid URL: {}", self.host, e))?;
        self.selectors.compile().map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// CSS selectors for listing and detail page markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Ad anchors on an index page.
    pub listing: String,
    pub price: String,
    pub title: String,
    pub description: String,
    pub region: String,
    /// Icon attribute blocks on a detail page.
    pub icon_attribute: String,
    /// Tagged elements inside an icon attribute block.
    pub icon_item: String,
    /// Key/value attribute rows on a detail page.
    pub attribute: String,
    pub attribute_key: String,
    pub attribute_value: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing: "div.masonry-item a.qa-advert-list-item".to_string(),
            price: "div.qa-advert-price".to_string(),
            title: "div.qa-advert-title".to_string(),
            description: "div.b-list-advert-base__description-text".to_string(),
            region: "span.b-list-advert__region__text".to_string(),
            icon_attribute: "div.b-advert-icon-attribute".to_string(),
            icon_item: "span[itemprop]".to_string(),
            attribute: "div.b-advert-attribute".to_string(),
            attribute_key: "div.b-advert-attribute__key".to_string(),
            attribute_value: "div.b-advert-attribute__value".to_string(),
        }
    }
}

impl Selectors {
    /// Parse every selector once, up front.
    pub fn compile(&self) -> Result<CompiledSelectors, ExtractError> {
        Ok(CompiledSelectors {
            listing: parse_selector(&self.listing)?,
            price: parse_selector(&self.price)?,
            title: parse_selector(&self.title)?,
            description: parse_selector(&self.description)?,
            region: parse_selector(&self.region)?,
            icon_attribute: parse_selector(&self.icon_attribute)?,
            icon_item: parse_selector(&self.icon_item)?,
            attribute: parse_selector(&self.attribute)?,
            attribute_key: parse_selector(&self.attribute_key)?,
            attribute_value: parse_selector(&self.attribute_value)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Parsed form of [`Selectors`].
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub listing: Selector,
    pub price: Selector,
    pub title: Selector,
    pub description: Selector,
    pub region: Selector,
    pub icon_attribute: Selector,
    pub icon_item: Selector,
    pub attribute: Selector,
    pub attribute_key: Selector,
    pub attribute_value: Selector,
}

/// What the listing fetcher does after a failed navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Sleep, then navigate again until retries run out.
    #[default]
    Renavigate,

    /// Sleep once and report the page as empty without re-fetching.
    GiveUp,
}

impl std::fmt::Display for RetryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Renavigate => write!(f, "renavigate"),
            Self::GiveUp => write!(f, "give_up"),
        }
    }
}

/// Retry settings for index page fetches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(1),
            mode: RetryMode::default(),
        }
    }
}

/// Page loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Hard ceiling on the page number.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// An empty page past this number ends the run.
    #[serde(default = "default_empty_page_cutoff")]
    pub empty_page_cutoff: u32,

    /// Extra attempts after a failed index page navigation.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base retry delay in seconds; the actual sleep is in `[backoff, 2*backoff]`.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: f64,

    #[serde(default)]
    pub retry_mode: RetryMode,

    /// Consecutive failed writes to the output before the run is aborted.
    #[serde(default = "default_max_flush_failures")]
    pub max_flush_failures: u32,

    /// Delay before each detail page and between listings.
    #[serde(default)]
    pub pacing: PacingConfig,
}

fn default_max_pages() -> u32 {
    1000
}

fn default_empty_page_cutoff() -> u32 {
    500
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_secs() -> f64 {
    1.0
}

fn default_max_flush_failures() -> u32 {
    3
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            empty_page_cutoff: default_empty_page_cutoff(),
            retries: default_retries(),
            backoff_secs: default_backoff_secs(),
            retry_mode: RetryMode::default(),
            max_flush_failures: default_max_flush_failures(),
            pacing: PacingConfig::default(),
        }
    }
}

impl CrawlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff: Duration::from_secs_f64(self.backoff_secs.max(0.0)),
            mode: self.retry_mode,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_pages == 0 {
            return Err("crawl.max_pages must be at least 1".to_string());
        }
        if self.max_flush_failures == 0 {
            return Err("crawl.max_flush_failures must be at least 1".to_string());
        }
        if !self.backoff_secs.is_finite() || self.backoff_secs < 0.0 {
            return Err("crawl.backoff_secs must be a non-negative number".to_string());
        }
        self.pacing.validate().map_err(|e| format!("crawl.{}", e))
    }
}
