//! Index page fetching and listing anchor parsing.

use scraper::Html;
use tracing::{info, warn};

use super::browser::PageDriver;
use super::config::{CompiledSelectors, RetryMode, RetryPolicy};
use super::error::NavigationError;
use super::pacing::backoff_jitter;

/// One ad anchor from an index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReference {
    /// Link attribute as it appeared in the markup.
    pub href: String,
    /// Absolute detail page URL.
    pub url: String,
    /// Outer HTML of the anchor, re-read for index-page fields.
    anchor_html: String,
}

impl ListingReference {
    pub fn new(href: impl Into<String>, url: impl Into<String>, anchor_html: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            url: url.into(),
            anchor_html: anchor_html.into(),
        }
    }

    pub fn anchor_html(&self) -> &str {
        &self.anchor_html
    }
}

/// Result of fetching one index page.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page loaded and contained at least one listing.
    Listings(Vec<ListingReference>),
    /// Page loaded but had no listings.
    Empty,
    /// Navigation kept failing; the page is treated as empty.
    Failed {
        attempts: u32,
        error: NavigationError,
    },
}

/// Join a listing href onto the site host.
pub fn detail_url(host: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", host, href)
    }
}

/// Select every ad anchor on an index page.
pub fn parse_listings(html: &str, selectors: &CompiledSelectors, host: &str) -> Vec<ListingReference> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.listing)
        .filter_map(|anchor| match anchor.value().attr("href") {
            Some(href) => Some(ListingReference::new(
                href,
                detail_url(host, href),
                anchor.html(),
            )),
            None => {
                warn!("Skipping listing anchor without href");
                None
            }
        })
        .collect()
}

/// Load an index page and return its listings.
///
/// Never fails: navigation errors are retried according to `policy` and
/// then reported as [`FetchOutcome::Failed`].
pub async fn fetch_page(
    driver: &mut dyn PageDriver,
    url: &str,
    selectors: &CompiledSelectors,
    host: &str,
    policy: &RetryPolicy,
) -> FetchOutcome {
    let mut attempts = 0;

    loop {
        attempts += 1;
        info!("Getting vehicles data from: {}", url);

        let error = match driver.load(url).await {
            Ok(html) => {
                let listings = parse_listings(&html, selectors, host);
                info!("{} vehicles found", listings.len());
                return if listings.is_empty() {
                    FetchOutcome::Empty
                } else {
                    FetchOutcome::Listings(listings)
                };
            }
            Err(e) => e,
        };

        warn!("Getting car listings failed: {}", error);

        let retries_left = policy.retries.saturating_sub(attempts - 1);
        if retries_left == 0 {
            return FetchOutcome::Failed { attempts, error };
        }

        let wait = backoff_jitter(policy.backoff);
        info!(
            "Retrying in {:.2}s... ({} retries left)",
            wait.as_secs_f64(),
            retries_left
        );
        tokio::time::sleep(wait).await;

        if policy.mode == RetryMode::GiveUp {
            return FetchOutcome::Failed { attempts, error };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::scrapers::config::Selectors;

    const INDEX_HTML: &str = r#"
        <html><body>
          <div class="masonry-item">
            <a class="qa-advert-list-item" href="/cars/toyota-corolla-1">
              <div class="qa-advert-price">₦ 4,500,000</div>
            </a>
          </div>
          <div class="masonry-item">
            <a class="qa-advert-list-item" href="/cars/honda-accord-2">
              <div class="qa-advert-price">₦ 6,200,000</div>
            </a>
          </div>
          <div class="masonry-item">
            <a class="qa-advert-list-item">no link</a>
          </div>
          <a class="qa-advert-list-item" href="/outside-masonry">ignored</a>
        </body></html>
    "#;

    struct ScriptedDriver {
        responses: VecDeque<Result<String, NavigationError>>,
        loads: u32,
    }

    impl ScriptedDriver {
        fn new(responses: Vec<Result<String, NavigationError>>) -> Self {
            Self {
                responses: responses.into(),
                loads: 0,
            }
        }
    }

    #[async_trait]
    impl PageDriver for ScriptedDriver {
        async fn load(&mut self, _url: &str) -> Result<String, NavigationError> {
            self.loads += 1;
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(NavigationError::Closed))
        }

        fn is_alive(&mut self) -> bool {
            true
        }

        async fn quit(&mut self) {}
    }

    fn timeout_error() -> NavigationError {
        NavigationError::Timeout {
            url: "https://jiji.ng/cars?page=1".to_string(),
            secs: 50,
        }
    }

    fn listing_count(outcome: FetchOutcome) -> usize {
        match outcome {
            FetchOutcome::Listings(listings) => listings.len(),
            other => panic!("expected listings, got {:?}", other),
        }
    }

    fn fast_policy(mode: RetryMode) -> RetryPolicy {
        RetryPolicy {
            retries: 3,
            backoff: Duration::ZERO,
            mode,
        }
    }

    #[test]
    fn detail_url_joins_relative_href() {
        assert_eq!(detail_url("https://jiji.ng", "/ad/1"), "https://jiji.ng/ad/1");
        assert_eq!(
            detail_url("https://jiji.ng", "https://other.example/ad/1"),
            "https://other.example/ad/1"
        );
    }

    #[test]
    fn parse_listings_selects_masonry_anchors() {
        let selectors = Selectors::default().compile().unwrap();
        let listings = parse_listings(INDEX_HTML, &selectors, "https://jiji.ng");

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].href, "/cars/toyota-corolla-1");
        assert_eq!(listings[0].url, "https://jiji.ng/cars/toyota-corolla-1");
        assert!(listings[0].anchor_html().contains("4,500,000"));
        assert_eq!(listings[1].url, "https://jiji.ng/cars/honda-accord-2");
    }

    #[tokio::test]
    async fn fetch_returns_listings() {
        let selectors = Selectors::default().compile().unwrap();
        let mut driver = ScriptedDriver::new(vec![Ok(INDEX_HTML.to_string())]);

        let outcome = fetch_page(
            &mut driver,
            "https://jiji.ng/cars?page=1",
            &selectors,
            "https://jiji.ng",
            &fast_policy(RetryMode::Renavigate),
        )
        .await;

        assert_eq!(listing_count(outcome), 2);
        assert_eq!(driver.loads, 1);
    }

    #[tokio::test]
    async fn fetch_page_without_listings_is_empty() {
        let selectors = Selectors::default().compile().unwrap();
        let mut driver = ScriptedDriver::new(vec![Ok("<html><body></body></html>".to_string())]);

        let outcome = fetch_page(
            &mut driver,
            "https://jiji.ng/cars?page=1",
            &selectors,
            "https://jiji.ng",
            &fast_policy(RetryMode::Renavigate),
        )
        .await;

        assert!(matches!(outcome, FetchOutcome::Empty));
    }

    #[tokio::test]
    async fn renavigate_retries_until_success() {
        let selectors = Selectors::default().compile().unwrap();
        let mut driver = ScriptedDriver::new(vec![
            Err(timeout_error()),
            Err(timeout_error()),
            Ok(INDEX_HTML.to_string()),
        ]);

        let outcome = fetch_page(
            &mut driver,
            "https://jiji.ng/cars?page=1",
            &selectors,
            "https://jiji.ng",
            &fast_policy(RetryMode::Renavigate),
        )
        .await;

        assert_eq!(listing_count(outcome), 2);
        assert_eq!(driver.loads, 3);
    }

    #[tokio::test]
    async fn renavigate_gives_up_after_retries() {
        let selectors = Selectors::default().compile().unwrap();
        let mut driver = ScriptedDriver::new(vec![]);

        let outcome = fetch_page(
            &mut driver,
            "https://jiji.ng/cars?page=1",
            &selectors,
            "https://jiji.ng",
            &fast_policy(RetryMode::Renavigate),
        )
        .await;

        match outcome {
            FetchOutcome::Failed { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(driver.loads, 4);
    }

    #[tokio::test]
    async fn give_up_mode_never_refetches() {
        let selectors = Selectors::default().compile().unwrap();
        let mut driver = ScriptedDriver::new(vec![Err(timeout_error()), Ok(INDEX_HTML.to_string())]);

        let outcome = fetch_page(
            &mut driver,
            "https://jiji.ng/cars?page=1",
            &selectors,
            "https://jiji.ng",
            &fast_policy(RetryMode::GiveUp),
        )
        .await;

        assert!(matches!(outcome, FetchOutcome::Failed { attempts: 1, .. }));
        assert_eq!(driver.loads, 1);
    }

    #[tokio::test]
    async fn zero_retries_fails_immediately() {
        let selectors = Selectors::default().compile().unwrap();
        let mut driver = ScriptedDriver::new(vec![Err(timeout_error())]);
        let policy = RetryPolicy {
            retries: 0,
            backoff: Duration::from_secs(60),
            mode: RetryMode::Renavigate,
        };

        let outcome = fetch_page(
            &mut driver,
            "https://jiji.ng/cars?page=1",
            &selectors,
            "https://jiji.ng",
            &policy,
        )
        .await;

        assert!(matches!(outcome, FetchOutcome::Failed { attempts: 1, .. }));
    }
}
