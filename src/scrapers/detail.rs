//! Detail extraction for a single listing.
//!
//! A record is built in two phases: summary fields read from the listing's
//! anchor on the index page, then attribute fields read from the ad's own
//! page. Any failure discards the whole record.

use scraper::{ElementRef, Html, Selector};
use tracing::{error, info};

use super::browser::PageDriver;
use super::config::CompiledSelectors;
use super::error::ExtractError;
use super::listing::ListingReference;
use super::pacing::PacingConfig;
use crate::models::{VehicleRecord, MISSING_VALUE, PAGE_URL_FIELD};

/// Result of extracting one listing.
#[derive(Debug)]
pub enum ExtractOutcome {
    Record(VehicleRecord),
    Failed(ExtractError),
}

impl ExtractOutcome {
    /// The record, or an empty one if extraction failed.
    pub fn into_record(self) -> VehicleRecord {
        match self {
            ExtractOutcome::Record(record) => record,
            ExtractOutcome::Failed(_) => VehicleRecord::new(),
        }
    }
}

/// Extract one listing: pace, read index fields, visit the detail page.
pub async fn extract(
    driver: &mut dyn PageDriver,
    listing: &ListingReference,
    selectors: &CompiledSelectors,
    pacing: &PacingConfig,
) -> ExtractOutcome {
    pacing.pause().await;

    match extract_record(driver, listing, selectors).await {
        Ok(record) => {
            info!(
                "'{}: [{} attributes found] [{}]",
                record.get("AdvertTitle").unwrap_or(MISSING_VALUE),
                record.len(),
                listing.url
            );
            ExtractOutcome::Record(record)
        }
        Err(e) => {
            error!("Error while extracting listing details for {}: {}", listing.url, e);
            ExtractOutcome::Failed(e)
        }
    }
}

async fn extract_record(
    driver: &mut dyn PageDriver,
    listing: &ListingReference,
    selectors: &CompiledSelectors,
) -> Result<VehicleRecord, ExtractError> {
    let mut record = index_fields(listing.anchor_html(), selectors);

    let html = driver.load(&listing.url).await?;
    detail_fields(&html, selectors, &mut record)?;

    record.insert(PAGE_URL_FIELD, listing.url.clone());
    Ok(record)
}

/// Summary fields from the listing anchor. Missing ones become `"NA"`.
pub fn index_fields(anchor_html: &str, selectors: &CompiledSelectors) -> VehicleRecord {
    let fragment = Html::parse_fragment(anchor_html);
    let first_text = |selector: &Selector| {
        fragment
            .select(selector)
            .next()
            .map(element_text)
            .unwrap_or_else(|| MISSING_VALUE.to_string())
    };

    let mut record = VehicleRecord::new();
    record.insert("AdvertPrice", first_text(&selectors.price));
    record.insert("AdvertTitle", first_text(&selectors.title));
    record.insert("DescriptionText", first_text(&selectors.description));
    record.insert("RegionText", first_text(&selectors.region));
    record
}

/// Attribute fields from a detail page, added to `record`.
pub fn detail_fields(
    html: &str,
    selectors: &CompiledSelectors,
    record: &mut VehicleRecord,
) -> Result<(), ExtractError> {
    let document = Html::parse_document(html);

    for block in document.select(&selectors.icon_attribute) {
        for item in block.select(&selectors.icon_item) {
            let raw_name = item.value().attr("itemprop").unwrap_or_default();
            let name = normalize_icon_name(raw_name).ok_or(ExtractError::EmptyAttributeName)?;
            let value = element_text(item);
            let value = if value.is_empty() {
                MISSING_VALUE.to_string()
            } else {
                value
            };
            record.insert(name, value);
        }
    }

    for row in document.select(&selectors.attribute) {
        let key = row
            .select(&selectors.attribute_key)
            .next()
            .ok_or_else(|| ExtractError::MissingElement("key".to_string()))?;
        let value = row
            .select(&selectors.attribute_value)
            .next()
            .ok_or_else(|| ExtractError::MissingElement("value".to_string()))?;
        record.insert(
            normalize_attribute_key(&element_text(key)),
            element_text(value),
        );
    }

    Ok(())
}

/// Icon attribute name with its first character upper-cased.
/// Returns `None` for an empty name.
pub fn normalize_icon_name(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Attribute label title-cased with spaces removed ("engine size" -> "EngineSize").
pub fn normalize_attribute_key(raw: &str) -> String {
    title_case(raw.trim()).replace(' ', "")
}

/// Upper-case the first letter of every word and lower-case the rest, where
/// a word starts after any non-alphabetic character.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic();
    }
    out
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
