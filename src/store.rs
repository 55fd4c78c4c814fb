//! Case record store backed by a delimited file.
//!
//! The store is a read-only snapshot of `data/radicados.csv`, loaded into
//! memory once per process and shared across requests. Deployments move
//! the file around (repo root during development, next to the binary in
//! containers), so [`CaseStore::open`] probes a short list of candidate
//! locations before settling on the default.
//!
//! A missing or unreadable file is an operational condition, not a bug:
//! it yields an empty store plus an error-level log line, and lookups
//! answer with a service-unavailable notice.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::fields::{self, aliases};

/// One case entry: column header → raw cell value.
pub type Record = HashMap<String, String>;

/// Default store location, relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = "data/radicados.csv";

/// In-memory snapshot of the record store.
pub struct CaseStore {
    path: PathBuf,
    headers: Vec<String>,
    records: Vec<Record>,
}

impl CaseStore {
    /// Load the store from the first candidate path that exists.
    ///
    /// Never fails: a missing or malformed file produces an empty store
    /// and logs the cause for the operator.
    pub fn open(override_path: Option<&Path>) -> CaseStore {
        let path = locate(override_path);
        match read_records(&path) {
            Ok((headers, records)) => {
                info!(path = %path.display(), rows = records.len(), "loaded record store");
                CaseStore {
                    path,
                    headers,
                    records,
                }
            }
            Err(err) => {
                error!(path = %path.display(), error = %format!("{err:#}"), "record store unavailable");
                CaseStore {
                    path,
                    headers: Vec::new(),
                    records: Vec::new(),
                }
            }
        }
    }

    /// Process-wide store instance, loaded at most once.
    ///
    /// The first caller's `override_path` wins; later calls return the
    /// cached snapshot without touching the filesystem again.
    pub fn shared(override_path: Option<&Path>) -> Arc<CaseStore> {
        static STORE: OnceCell<Arc<CaseStore>> = OnceCell::new();
        STORE
            .get_or_init(|| Arc::new(CaseStore::open(override_path)))
            .clone()
    }

    /// Build a store directly from records, bypassing the filesystem.
    pub fn from_records(records: Vec<Record>) -> CaseStore {
        let headers = records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        CaseStore {
            path: PathBuf::from(DEFAULT_STORE_FILE),
            headers,
            records,
        }
    }

    /// Path the store was (or would have been) loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column headers as found in the file, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records whose normalized identification number equals the given
    /// digit string, in file order. A person with several open cases has
    /// one record per case.
    pub fn find_by_identifier(&self, digits: &str) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| fields::digits(&fields::resolve(r, aliases::IDENTIFICATION)) == digits)
            .collect()
    }
}

/// Resolve the store path: explicit override, then the working directory,
/// then next to the executable, then one level above it. Falls back to
/// the default relative path when nothing exists yet.
fn locate(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }

    let mut candidates = vec![PathBuf::from(DEFAULT_STORE_FILE)];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(DEFAULT_STORE_FILE));
            if let Some(up) = dir.parent() {
                candidates.push(up.join(DEFAULT_STORE_FILE));
            }
        }
    }

    candidates
        .iter()
        .find(|p| p.exists())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
}

/// Parse the CSV into (headers, records). Headers are trimmed and a UTF-8
/// byte-order mark is stripped; cell values are kept verbatim.
fn read_records(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read record store: {}", path.display()))?;
    let data = raw
        .strip_prefix("\u{feff}".as_bytes())
        .unwrap_or(raw.as_slice());

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .context("failed to parse record store headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.context("failed to parse record store row")?;
        let record: Record = headers
            .iter()
            .cloned()
            .zip(row.iter().map(|cell| cell.to_string()))
            .collect();
        records.push(record);
    }

    Ok((headers, records))
}
