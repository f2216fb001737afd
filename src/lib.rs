//! carlot - vehicle listing scraper.
//!
//! Walks the paginated car index of a classifieds site in a headless
//! browser, extracts one record per ad and appends the records to a
//! JSON Lines file.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod runner;
pub mod scrapers;
pub mod storage;
