//! Scrape command.

use std::path::PathBuf;

use crate::cli::icons::{arrow, success, warn};
use crate::config::Config;
use crate::logging;
use crate::runner::{RunEnd, Runner};
use crate::scrapers::browser::ChromeProvisioner;
use crate::storage::JsonLinesSink;

/// Run the page loop with the given overrides.
pub async fn cmd_run(
    mut config: Config,
    pages: Option<u32>,
    output: Option<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    if let Some(pages) = pages {
        config.crawl.max_pages = pages;
    }
    let output_path = match output {
        Some(path) => path,
        None => config.output_path(),
    };

    logging::init(Some(&config.log_path()), verbose, config.log.level.as_deref())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let provisioner = ChromeProvisioner::new(config.browser.clone());
    let mut sink = JsonLinesSink::new(&output_path);

    let runner = Runner::new(&provisioner, &mut sink, config.site.clone(), config.crawl.clone())?;
    let summary = runner.run().await;

    let icon = match summary.end {
        RunEnd::Exhausted => success(),
        RunEnd::Aborted(_) => warn(),
    };
    eprintln!("{} Run {}", icon, summary.end);
    eprintln!(
        "  {} {} pages visited ({} empty)",
        arrow(),
        summary.pages_visited,
        summary.empty_pages
    );
    eprintln!(
        "  {} {} listings, {} extracted, {} dropped",
        arrow(),
        summary.listings_seen,
        summary.records_extracted,
        summary.records_dropped
    );
    eprintln!(
        "  {} {} records written to {}",
        arrow(),
        summary.records_persisted,
        output_path.display()
    );
    if summary.records_pending > 0 {
        eprintln!(
            "  {} {} records could not be written",
            warn(),
            summary.records_pending
        );
    }
    eprintln!(
        "  {} took {}s",
        arrow(),
        summary.elapsed().num_seconds()
    );

    Ok(())
}
