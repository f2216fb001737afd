//! Page loop orchestration.
//!
//! Walks index pages in order, extracts every listing on each page and
//! hands the page's records to the sink. The loop stops when the page
//! ceiling is reached, when an empty page shows up past the cutoff, when
//! no browser can be provisioned or when the sink keeps failing.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::models::VehicleRecord;
use crate::scrapers::browser::{ensure_alive, DriverProvisioner, PageDriver};
use crate::scrapers::config::{CompiledSelectors, CrawlConfig, SiteConfig};
use crate::scrapers::detail::extract;
use crate::scrapers::error::ExtractError;
use crate::scrapers::listing::{fetch_page, FetchOutcome};
use crate::storage::RecordSink;

/// Where the page loop is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Running(u32),
    Exhausted,
    Aborted(String),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    /// Page ceiling reached or an empty page past the cutoff.
    Exhausted,
    /// No browser could be provisioned, or the sink kept failing.
    Aborted(String),
}

impl std::fmt::Display for RunEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunEnd::Exhausted => write!(f, "exhausted"),
            RunEnd::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_visited: u32,
    pub empty_pages: u32,
    pub listings_seen: usize,
    pub records_extracted: usize,
    pub records_dropped: usize,
    pub records_persisted: usize,
    /// Records still unsaved because the sink kept failing.
    pub records_pending: usize,
    pub end: RunEnd,
}

impl RunSummary {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            pages_visited: 0,
            empty_pages: 0,
            listings_seen: 0,
            records_extracted: 0,
            records_dropped: 0,
            records_persisted: 0,
            records_pending: 0,
            end: RunEnd::Exhausted,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.end, RunEnd::Aborted(_))
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Sequential scrape of one site.
pub struct Runner<'a> {
    provisioner: &'a dyn DriverProvisioner,
    sink: &'a mut dyn RecordSink,
    site: SiteConfig,
    selectors: CompiledSelectors,
    crawl: CrawlConfig,
    /// Sink failures since the last successful flush.
    flush_failures: u32,
}

/// The page after `page`, or the end of the run once page numbers run out.
fn next_page(page: u32) -> RunState {
    page.checked_add(1).map_or(RunState::Exhausted, RunState::Running)
}

impl<'a> Runner<'a> {
    pub fn new(
        provisioner: &'a dyn DriverProvisioner,
        sink: &'a mut dyn RecordSink,
        site: SiteConfig,
        crawl: CrawlConfig,
    ) -> Result<Self, ExtractError> {
        let selectors = site.selectors.compile()?;
        Ok(Self {
            provisioner,
            sink,
            site,
            selectors,
            crawl,
            flush_failures: 0,
        })
    }

    /// Run until the loop ends. The browser is always released before
    /// returning, whatever the outcome.
    pub async fn run(mut self) -> RunSummary {
        let mut summary = RunSummary::start();
        let mut driver: Option<Box<dyn PageDriver>> = None;
        let mut batch: Vec<VehicleRecord> = Vec::new();

        info!(
            "Scraping {} (pages 1..={}, retry mode {}), writing to {}",
            self.site.base_url,
            self.crawl.max_pages,
            self.crawl.retry_mode,
            self.sink.describe()
        );

        let mut state = RunState::Running(1);
        let end = loop {
            state = match state {
                RunState::Running(page) => {
                    self.step(page, &mut driver, &mut batch, &mut summary)
                        .await
                }
                RunState::Exhausted => break RunEnd::Exhausted,
                RunState::Aborted(reason) => break RunEnd::Aborted(reason),
            };
        };

        if !batch.is_empty() {
            self.flush(&mut batch, &mut summary);
        }
        if let Some(mut driver) = driver.take() {
            driver.quit().await;
        }

        summary.records_pending = batch.len();
        if summary.records_pending > 0 {
            error!(
                "{} records could not be saved to {}",
                summary.records_pending,
                self.sink.describe()
            );
        }
        summary.end = end;
        summary.finished_at = Utc::now();

        info!("The program is exiting");
        summary
    }

    async fn step(
        &mut self,
        page: u32,
        driver: &mut Option<Box<dyn PageDriver>>,
        batch: &mut Vec<VehicleRecord>,
        summary: &mut RunSummary,
    ) -> RunState {
        if page > self.crawl.max_pages {
            info!("Reached page limit ({})", self.crawl.max_pages);
            return RunState::Exhausted;
        }

        let acquired = match driver.take() {
            Some(current) => ensure_alive(self.provisioner, current).await,
            None => self.provisioner.acquire().await,
        };
        let current = match acquired {
            Ok(d) => driver.insert(d),
            Err(e) => {
                error!("Could not start browser: {}", e);
                return RunState::Aborted(e.to_string());
            }
        };

        let url = self.site.page_url(page);
        summary.pages_visited += 1;

        let outcome = fetch_page(
            current.as_mut(),
            &url,
            &self.selectors,
            &self.site.host,
            &self.crawl.retry_policy(),
        )
        .await;

        let listings = match outcome {
            FetchOutcome::Listings(listings) => listings,
            FetchOutcome::Empty | FetchOutcome::Failed { .. } => {
                summary.empty_pages += 1;
                error!("{} returned an empty car list", url);
                if page > self.crawl.empty_page_cutoff {
                    info!(
                        "Empty page past page {}, stopping",
                        self.crawl.empty_page_cutoff
                    );
                    return RunState::Exhausted;
                }
                return next_page(page);
            }
        };

        summary.listings_seen += listings.len();
        for listing in &listings {
            let record = extract(current.as_mut(), listing, &self.selectors, &self.crawl.pacing)
                .await
                .into_record();
            if record.is_empty() {
                debug!("Dropped listing {}", listing.href);
                summary.records_dropped += 1;
            } else {
                summary.records_extracted += 1;
                batch.push(record);
            }
            self.crawl.pacing.pause().await;
        }

        self.flush(batch, summary);
        info!("Total vehicles processed: {}", summary.records_persisted);

        if self.flush_failures >= self.crawl.max_flush_failures {
            error!(
                "Saving to {} failed {} times in a row, stopping",
                self.sink.describe(),
                self.flush_failures
            );
            return RunState::Aborted(format!(
                "could not write to {} after {} attempts",
                self.sink.describe(),
                self.flush_failures
            ));
        }

        next_page(page)
    }

    /// Hand the batch to the sink. The batch is only cleared once the sink
    /// reports success.
    fn flush(&mut self, batch: &mut Vec<VehicleRecord>, summary: &mut RunSummary) {
        if batch.is_empty() {
            return;
        }

        match self.sink.append(batch) {
            Ok(written) => {
                info!("Data written to {}", self.sink.describe());
                summary.records_persisted += written;
                batch.clear();
                self.flush_failures = 0;
            }
            Err(e) => {
                self.flush_failures += 1;
                warn!(
                    "Error saving {} records to {}, keeping them for the next flush: {}",
                    batch.len(),
                    self.sink.describe(),
                    e
                );
            }
        }
    }
}
