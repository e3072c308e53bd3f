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

//! Sessionscope storage
//!
//! Durable, append-only, insertion-ordered event log. One store per process,
//! constructed once by startup wiring and cloned (cheap, `Arc` interior) into
//! every consumer: the writer, the crash handler, the stall watchdog, and the
//! log projector.
//!
//! Guarantees:
//! - `append` is linearizable with respect to id assignment: concurrent
//!   appends never share an id and id order matches append-completion order.
//! - A successful append is durable — the record is flushed and synced to
//!   the single on-disk log file before the call returns.
//! - `query_after(k)` returns exactly the records with id > k, ascending.

pub mod error;
pub mod log_store;

pub use error::{StoreError, StoreResult};
pub use log_store::{EventStore, LOG_FILE_NAME};
