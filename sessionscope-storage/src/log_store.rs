// Copyright 2025 Sessionscope (https://github.com/sessionscope)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Append-only event log
//!
//! One JSON line per [`EventRecord`] in a single file under the data dir.
//! A single mutex over {file writer, in-memory index} keeps id assignment
//! linearizable; `append_sync` flushes and syncs before returning, which is
//! the durability point the crash paths rely on.
//!
//! `append_sync` never suspends and takes no lock a reader can hold across
//! a suspension, so it is safe from the panic hook and the watchdog thread
//! even when the async scheduler is wedged.

use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use sessionscope_core::{EventDraft, EventRecord};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the on-disk log inside the data dir.
pub const LOG_FILE_NAME: &str = "logs.jsonl";

#[derive(Debug)]
struct StoreState {
    writer: BufWriter<File>,
    /// All records, index `i` holds id `i + 1`. Ids are dense and strictly
    /// increasing because only `append_sync` under this mutex assigns them.
    records: Vec<EventRecord>,
}

/// Durable, insertion-ordered event log. Cheap to clone; all clones share
/// the same file and index.
#[derive(Clone, Debug)]
pub struct EventStore {
    state: Arc<Mutex<StoreState>>,
    path: PathBuf,
}

impl EventStore {
    /// Open (or create) the log under `data_dir`, replaying existing records.
    ///
    /// A torn trailing line (a crash mid-append before the sync completed)
    /// is dropped with a warning and truncated away, so the next append
    /// starts on a clean line. Corruption anywhere else is an error.
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let path = data_dir.as_ref().join(LOG_FILE_NAME);

        let records = if path.exists() {
            let (records, valid_len) = Self::replay(&path)?;
            if valid_len < std::fs::metadata(&path)?.len() {
                OpenOptions::new().write(true).open(&path)?.set_len(valid_len)?;
            }
            records
        } else {
            Vec::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            state: Arc::new(Mutex::new(StoreState {
                writer: BufWriter::new(file),
                records,
            })),
            path,
        })
    }

    /// Replay the log, returning the records and the byte length of the
    /// valid prefix.
    fn replay(path: &Path) -> StoreResult<(Vec<EventRecord>, u64)> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        let mut valid_len: u64 = 0;
        let mut line_no = 0usize;
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                valid_len += read as u64;
                continue;
            }

            match serde_json::from_str::<EventRecord>(trimmed) {
                Ok(record) => {
                    let expected = records.len() as u64 + 1;
                    if record.id != expected {
                        return Err(StoreError::Corruption(format!(
                            "expected id {expected}, found {} at line {line_no}",
                            record.id
                        )));
                    }
                    records.push(record);
                    valid_len += read as u64;
                }
                Err(e) => {
                    let mut rest = String::new();
                    reader.read_line(&mut rest)?;
                    if rest.is_empty() {
                        // Torn tail from a crash mid-write; the record was
                        // never acknowledged, so dropping it loses nothing
                        // promised.
                        tracing::warn!(line = line_no, error = %e, "dropping torn trailing log line");
                        break;
                    }
                    return Err(StoreError::Corruption(format!(
                        "unparsable record at line {line_no}: {e}"
                    )));
                }
            }
        }

        Ok((records, valid_len))
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, blocking until it is durable. Safe from any thread,
    /// including a panicking one; never suspends.
    pub fn append_sync(&self, draft: EventDraft) -> StoreResult<u64> {
        let mut state = self.state.lock();

        let id = state.records.len() as u64 + 1;
        let record = draft.into_record(id);

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        state.writer.write_all(line.as_bytes())?;
        state.writer.flush()?;
        state.writer.get_ref().sync_data()?;

        state.records.push(record);
        Ok(id)
    }

    /// Append a record from async context without blocking the executor.
    pub async fn append(&self, draft: EventDraft) -> StoreResult<u64> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.append_sync(draft))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// The most recent `limit` records, newest first.
    pub fn query_latest(&self, limit: usize) -> Vec<EventRecord> {
        let state = self.state.lock();
        state.records.iter().rev().take(limit).cloned().collect()
    }

    /// All records with id strictly greater than `after_id`, ascending.
    pub fn query_after(&self, after_id: u64) -> Vec<EventRecord> {
        let state = self.state.lock();
        state
            .records
            .iter()
            .filter(|r| r.id > after_id)
            .cloned()
            .collect()
    }

    /// Number of committed records; also the highest assigned id.
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
