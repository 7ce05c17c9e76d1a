//! Append-only session history.
//!
//! [`HistoryStore`] keeps every [`SessionRecord`] in memory and, when opened on a
//! file, mirrors each append as one CSV row (see [`tabular`]). Rows are never
//! rewritten. The only repair ever made to the file is cutting off a final row
//! that an interrupted append left incomplete.

pub mod tabular;

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SubsecRound, Utc};
use thiserror::Error;

use crate::models::{CleaningResult, PlanSummary, SessionRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {path} has an unexpected header: {found:?}")]
    HeaderMismatch { path: PathBuf, found: String },

    #[error("history file {path}, line {line}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Shared handle to the session history. Cloning is cheap and every clone sees
/// the same log.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    records: Vec<SessionRecord>,
    backing: Option<Backing>,
}

/// The history file and the length of its committed content.
struct Backing {
    path: PathBuf,
    len: u64,
}

impl HistoryStore {
    /// Open (or create) a history file and load its records.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(&path))?;
        }

        let (records, len) = if path.exists() {
            load(&path)?
        } else {
            (Vec::new(), write_header(&path)?)
        };

        tracing::info!(path = %path.display(), records = records.len(), "opened session history");

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                records,
                backing: Some(Backing { path, len }),
            })),
        })
    }

    /// A store that lives only as long as the process.
    pub fn open_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: Vec::new(),
                backing: None,
            })),
        }
    }

    /// Append a record for a finished run.
    ///
    /// The id and timestamp are assigned under the store lock, so concurrent
    /// callers get strictly increasing ids in commit order. If the file write
    /// fails nothing is recorded and the id is not consumed.
    pub fn record(
        &self,
        plan: PlanSummary,
        result: &CleaningResult,
    ) -> Result<SessionRecord, StoreError> {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        let id = inner.records.last().map_or(1, |r| r.id + 1);
        let record = SessionRecord::new(id, Utc::now().trunc_subsecs(6), plan, result);

        if let Some(backing) = inner.backing.as_mut() {
            backing.append(&tabular::encode_row(&record))?;
        }

        tracing::debug!(id, status = record.status.as_str(), "recorded session");
        inner.records.push(record.clone());
        Ok(record)
    }

    /// Every record in insertion order.
    pub fn list_all(&self) -> Vec<SessionRecord> {
        self.inner
            .lock()
            .expect("history lock poisoned")
            .records
            .clone()
    }

    pub fn get(&self, id: u64) -> Option<SessionRecord> {
        let inner = self.inner.lock().expect("history lock poisoned");
        inner
            .records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| inner.records[i].clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("history lock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CSV export of the whole log, header first.
    pub fn export_tabular(&self) -> String {
        let inner = self.inner.lock().expect("history lock poisoned");
        tabular::encode(&inner.records)
    }
}

impl Backing {
    fn append(&mut self, row: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(io_error(&self.path))?;

        let written = file
            .write_all(row.as_bytes())
            .and_then(|_| file.sync_data());
        if let Err(source) = written {
            // A partial row would glue itself to the next append.
            if let Err(e) = file.set_len(self.len) {
                tracing::error!(path = %self.path.display(), error = %e, "could not roll back partial history row");
            }
            return Err(StoreError::Io {
                path: self.path.clone(),
                source,
            });
        }

        self.len += row.len() as u64;
        Ok(())
    }
}

fn write_header(path: &Path) -> Result<u64, StoreError> {
    let mut file = File::create(path).map_err(io_error(path))?;
    let header = format!("{}\n", tabular::HEADER);
    file.write_all(header.as_bytes())
        .and_then(|_| file.sync_data())
        .map_err(io_error(path))?;
    Ok(header.len() as u64)
}

/// Read an existing history file. Returns the records and the committed length.
fn load(path: &Path) -> Result<(Vec<SessionRecord>, u64), StoreError> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    let content = String::from_utf8(bytes).map_err(|e| StoreError::MalformedRow {
        path: path.to_path_buf(),
        line: 0,
        reason: e.to_string(),
    })?;

    let Some(header_end) = content.find('\n') else {
        // Empty, or a header cut short before its newline.
        if tabular::HEADER.starts_with(content.trim_end_matches('\r')) {
            return Ok((Vec::new(), write_header(path)?));
        }
        return Err(StoreError::HeaderMismatch {
            path: path.to_path_buf(),
            found: content,
        });
    };

    let header = content[..header_end].trim_end_matches('\r');
    if header != tabular::HEADER {
        return Err(StoreError::HeaderMismatch {
            path: path.to_path_buf(),
            found: header.to_string(),
        });
    }

    let mut records: Vec<SessionRecord> = Vec::new();
    let mut committed = header_end + 1;
    let mut line_no = 1;
    let mut rest = &content[committed..];

    while !rest.is_empty() {
        line_no += 1;
        let Some(end) = rest.find('\n') else {
            tracing::warn!(
                path = %path.display(),
                line = line_no,
                "dropping incomplete final history row"
            );
            truncate(path, committed as u64)?;
            break;
        };

        let line = rest[..end].trim_end_matches('\r');
        if !line.is_empty() {
            let record = tabular::decode_row(line).map_err(|reason| StoreError::MalformedRow {
                path: path.to_path_buf(),
                line: line_no,
                reason,
            })?;
            if records.last().is_some_and(|prev| prev.id >= record.id) {
                return Err(StoreError::MalformedRow {
                    path: path.to_path_buf(),
                    line: line_no,
                    reason: format!("id {} is not greater than the previous id", record.id),
                });
            }
            records.push(record);
        }

        committed += end + 1;
        rest = &rest[end + 1..];
    }

    Ok((records, committed as u64))
}

fn truncate(path: &Path, len: u64) -> Result<(), StoreError> {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(io_error(path))?;
    file.set_len(len)
        .and_then(|_| file.sync_data())
        .map_err(io_error(path))
}
