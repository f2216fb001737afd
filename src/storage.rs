//! Record persistence to a JSON Lines file.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::VehicleRecord;
use crate::scrapers::error::PersistError;

/// Destination for completed records.
pub trait RecordSink: Send {
    /// Append every non-empty record, returning how many were written.
    fn append(&mut self, records: &[VehicleRecord]) -> Result<usize, PersistError>;

    /// Human-readable destination for log lines.
    fn describe(&self) -> String;
}

/// Appends one JSON object per line. Existing content is never rewritten.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&mut self, records: &[VehicleRecord]) -> Result<usize, PersistError> {
        let open_err = |source| PersistError::Open {
            path: self.path.clone(),
            source,
        };
        let write_err = |source| PersistError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(open_err)?;
        let mut writer = BufWriter::new(file);

        let mut written = 0;
        for record in records.iter().filter(|r| !r.is_empty()) {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n").map_err(write_err)?;
            written += 1;
        }
        writer.flush().map_err(write_err)?;

        Ok(written)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PAGE_URL_FIELD;

    fn record(price: &str, url: &str) -> VehicleRecord {
        [("AdvertPrice", price), (PAGE_URL_FIELD, url)]
            .into_iter()
            .collect()
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn appends_batches_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut sink = JsonLinesSink::new(&path);

        let first = vec![
            record("₦500,000", "https://jiji.ng/ad/1"),
            record("₦750,000", "https://jiji.ng/ad/2"),
        ];
        let second = vec![record("₦900,000", "https://jiji.ng/ad/3")];

        assert_eq!(sink.append(&first).unwrap(), 2);
        let after_first = std::fs::read_to_string(&path).unwrap();
        assert_eq!(sink.append(&second).unwrap(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(&after_first));

        let urls: Vec<String> = read_lines(&path)
            .iter()
            .map(|v| v[PAGE_URL_FIELD].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://jiji.ng/ad/1",
                "https://jiji.ng/ad/2",
                "https://jiji.ng/ad/3"
            ]
        );
    }

    #[test]
    fn skips_empty_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut sink = JsonLinesSink::new(&path);

        let batch = vec![
            VehicleRecord::new(),
            record("₦500,000", "https://jiji.ng/ad/1"),
        ];

        assert_eq!(sink.append(&batch).unwrap(), 1);
        assert_eq!(read_lines(&path).len(), 1);
    }

    #[test]
    fn writes_unescaped_utf8_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut sink = JsonLinesSink::new(&path);

        sink.append(&[record("₦500,000", "https://jiji.ng/ad/1")])
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "{\"AdvertPrice\":\"₦500,000\",\"PageURL\":\"https://jiji.ng/ad/1\"}\n"
        );
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("data.json");
        let mut sink = JsonLinesSink::new(&path);

        sink.append(&[record("₦1", "https://jiji.ng/ad/1")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let mut sink = JsonLinesSink::new(dir.path());

        let result = sink.append(&[record("₦1", "https://jiji.ng/ad/1")]);
        assert!(matches!(result, Err(PersistError::Open { .. })));
    }
}
