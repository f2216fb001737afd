//! Data models for scraped listings.

mod vehicle;

pub use vehicle::{VehicleRecord, MISSING_VALUE, PAGE_URL_FIELD};
