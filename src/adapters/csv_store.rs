//! CSV file ledger store.
//!
//! Rows look like `"2019-06-03 14:02:11.523418",1,0,99`: the timestamp
//! is quoted, amounts are not. Every flush rewrites the whole file through a
//! temporary sibling, so a crash mid-write leaves the previous ledger intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::models::{OutcomeRecord, TIMESTAMP_FORMAT};
use crate::domain::ports::LedgerStore;

pub const HEADER: [&str; 4] = ["Time", "Wager", "Win", "Balance"];

#[derive(Debug, Clone)]
pub struct CsvLedgerStore {
    path: PathBuf,
    header: bool,
}

impl CsvLedgerStore {
    pub fn new(path: impl Into<PathBuf>, header: bool) -> Self {
        Self {
            path: path.into(),
            header,
        }
    }

    /// Read a ledger file written by this store (with or without header).
    pub fn read(path: &Path) -> SessionResult<Vec<OutcomeRecord>> {
        let persistence = |source: io::Error| SessionError::Persistence {
            path: path.to_path_buf(),
            source,
        };
        let content = fs::read_to_string(path).map_err(persistence)?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter(|(index, line)| !(*index == 0 && is_header(line)))
            .map(|(index, line)| {
                parse_row(line).ok_or_else(|| {
                    persistence(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("malformed row {}: {line}", index + 1),
                    ))
                })
            })
            .collect()
    }

    fn render(&self, records: &[OutcomeRecord]) -> String {
        let mut out = String::new();
        if self.header {
            let quoted: Vec<String> = HEADER.iter().map(|h| format!("\"{h}\"")).collect();
            out.push_str(&quoted.join(","));
            out.push('\n');
        }
        for record in records {
            out.push_str(&format!(
                "\"{}\",{},{},{}\n",
                record.formatted_timestamp(),
                record.wager,
                record.win,
                record.balance
            ));
        }
        out
    }

    fn write_atomically(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let mut file = fs::File::create(&staging)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&staging, &self.path)
    }
}

fn is_header(line: &str) -> bool {
    line.trim_start_matches('"').starts_with(HEADER[0])
}

fn parse_row(line: &str) -> Option<OutcomeRecord> {
    let mut fields = line.split(',').map(|field| field.trim().trim_matches('"'));
    let timestamp = NaiveDateTime::parse_from_str(fields.next()?, TIMESTAMP_FORMAT).ok()?;
    let wager = Decimal::from_str(fields.next()?).ok()?;
    let win = Decimal::from_str(fields.next()?).ok()?;
    let balance = Decimal::from_str(fields.next()?).ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(OutcomeRecord::new(timestamp, wager, win, balance))
}

impl LedgerStore for CsvLedgerStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[OutcomeRecord]) -> SessionResult<()> {
        self.write_atomically(&self.render(records))
            .map_err(|source| SessionError::Persistence {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), rows = records.len(), "ledger written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    fn sample() -> Vec<OutcomeRecord> {
        vec![
            OutcomeRecord::opening(ts("2019-06-03 14:02:11.523418"), Decimal::from(100)),
            OutcomeRecord::new(
                ts("2019-06-03 14:02:15.000001"),
                Decimal::ONE,
                Decimal::new(25, 1),
                Decimal::new(1015, 1),
            ),
        ]
    }

    #[test]
    fn test_written_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slot_results.csv");
        let store = CsvLedgerStore::new(&path, true);

        store.persist(&sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], r#""Time","Wager","Win","Balance""#);
        assert_eq!(lines[1], r#""2019-06-03 14:02:11.523418",0,0,100"#);
        assert_eq!(lines[2], r#""2019-06-03 14:02:15.000001",1,2.5,101.5"#);
        assert!(!dir.path().join("slot_results.csv.tmp").exists());
    }

    #[test]
    fn test_flush_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.csv");
        let store = CsvLedgerStore::new(&path, false);

        store.persist(&sample()).unwrap();
        store.persist(&sample()[..1]).unwrap();

        let records = CsvLedgerStore::read(&path).unwrap();
        assert_eq!(records, sample()[..1].to_vec());
    }

    #[test]
    fn test_read_skips_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        CsvLedgerStore::new(&path, true).persist(&sample()).unwrap();

        assert_eq!(CsvLedgerStore::read(&path).unwrap(), sample());
    }

    #[test]
    fn test_malformed_row_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "\"2019-06-03 14:02:11.523418\",1,oops,3\n").unwrap();

        let err = CsvLedgerStore::read(&path).unwrap_err();
        assert!(matches!(err, SessionError::Persistence { .. }));
    }

    #[test]
    fn test_unwritable_location() {
        let dir = TempDir::new().unwrap();
        // a directory where the file should be
        let store = CsvLedgerStore::new(dir.path(), true);
        assert!(matches!(store.persist(&sample()), Err(SessionError::Persistence { .. })));
    }
}
