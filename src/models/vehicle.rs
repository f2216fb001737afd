//! Vehicle record model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the detail page URL a record was scraped from.
pub const PAGE_URL_FIELD: &str = "PageURL";

/// Sentinel for index-page fields missing from the listing markup.
pub const MISSING_VALUE: &str = "NA";

/// A scraped vehicle listing.
///
/// Fields are kept in the order they were scraped. There is no fixed schema:
/// detail pages contribute whatever attributes they render, so the key set
/// varies between listings. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleRecord {
    fields: Map<String, Value>,
}

impl VehicleRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its original position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), Value::String(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in scrape order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Detail URL this record came from, if it has been attached.
    pub fn page_url(&self) -> Option<&str> {
        self.get(PAGE_URL_FIELD)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VehicleRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut record = VehicleRecord::new();
        record.insert("AdvertPrice", "NA");
        record.insert("Make", "Toyota");
        record.insert("AdvertPrice", "₦1,200,000");

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["AdvertPrice", "Make"]);
        assert_eq!(record.get("AdvertPrice"), Some("₦1,200,000"));
    }

    #[test]
    fn serializes_as_flat_object() {
        let record: VehicleRecord = [("Model", "Corolla"), (PAGE_URL_FIELD, "https://jiji.ng/ad/9")]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Model":"Corolla","PageURL":"https://jiji.ng/ad/9"}"#
        );
        assert_eq!(record.page_url(), Some("https://jiji.ng/ad/9"));
    }

    #[test]
    fn empty_record() {
        let record = VehicleRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
        assert_eq!(record.page_url(), None);
    }
}
