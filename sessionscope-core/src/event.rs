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

//! Structured application events
//!
//! Every durable log entry is an [`EventRecord`]. Records are immutable once
//! written; the store assigns the `id` on insert, so callers build an
//! [`EventDraft`] and receive the id back from the append.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Category of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Info,
    Error,
    Api,
    Payment,
    Crash,
    Anr,
}

impl EventKind {
    /// Wire/display name, matching the on-disk representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Info => "INFO",
            EventKind::Error => "ERROR",
            EventKind::Api => "API",
            EventKind::Payment => "PAYMENT",
            EventKind::Crash => "CRASH",
            EventKind::Anr => "ANR",
        }
    }

    /// True for the terminal failure categories written by the crash and
    /// stall detectors.
    pub fn is_failure_report(self) -> bool {
        matches!(self, EventKind::Crash | EventKind::Anr)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable structured log entry.
///
/// `id` is assigned by the store on insert and is strictly increasing in
/// insertion order; it doubles as the watermark cursor for incremental
/// embedding and is never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    /// Milliseconds since epoch at creation time.
    pub timestamp_ms: i64,
    /// Logical session active when the event was created.
    pub session_id: i64,
    pub kind: EventKind,
    /// Last known UI screen, possibly stale or absent.
    pub screen: Option<String>,
    /// Short symbolic action tag (e.g. `SCREEN_VIEW`, `PAYMENT_RESULT`).
    pub action: Option<String>,
    /// Logical API operation name.
    pub api: Option<String>,
    /// Human-readable description, never empty.
    pub message: String,
    pub stack_trace: Option<String>,
    /// Fully-qualified failure type name, if the event carries one.
    pub exception: Option<String>,
}

/// An event that has not been appended yet: an [`EventRecord`] minus the
/// store-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub timestamp_ms: i64,
    pub session_id: i64,
    pub kind: EventKind,
    pub screen: Option<String>,
    pub action: Option<String>,
    pub api: Option<String>,
    pub message: String,
    pub stack_trace: Option<String>,
    pub exception: Option<String>,
}

impl EventDraft {
    /// Create a draft timestamped now. An empty message is replaced with a
    /// generic placeholder so the message invariant holds everywhere.
    pub fn new(kind: EventKind, session_id: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "(no message)".to_string()
        } else {
            message
        };

        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            session_id,
            kind,
            screen: None,
            action: None,
            api: None,
            message,
            stack_trace: None,
            exception: None,
        }
    }

    /// Set the screen snapshot.
    pub fn screen(mut self, screen: Option<String>) -> Self {
        self.screen = screen;
        self
    }

    /// Set the action tag.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the logical API name.
    pub fn api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    /// Attach a full textual stack trace.
    pub fn stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    /// Attach the failure type name.
    pub fn exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Seal the draft with a store-assigned id.
    pub fn into_record(self, id: u64) -> EventRecord {
        EventRecord {
            id,
            timestamp_ms: self.timestamp_ms,
            session_id: self.session_id,
            kind: self.kind,
            screen: self.screen,
            action: self.action,
            api: self.api,
            message: self.message,
            stack_trace: self.stack_trace,
            exception: self.exception,
        }
    }
}
