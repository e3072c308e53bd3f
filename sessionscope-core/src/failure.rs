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

//! Owned failure snapshots
//!
//! The writer's error paths and the crash detectors all record the same
//! three facts about a failure: its type name, its message, and (when
//! available) a backtrace. [`FailureInfo`] captures those as owned strings
//! so a record can outlive the error or panic payload it came from.

use std::any::Any;

/// Snapshot of an error or panic, safe to move across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureInfo {
    /// Fully-qualified type name of the failure.
    pub kind: String,
    /// Human-readable description, never empty.
    pub message: String,
    /// Full textual backtrace, if one was captured.
    pub backtrace: Option<String>,
}

impl FailureInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "(no message)".to_string()
        } else {
            message
        };

        Self {
            kind: kind.into(),
            message,
            backtrace: None,
        }
    }

    /// Snapshot a typed error. The type name comes from the static type, so
    /// call this where the concrete error type is still known.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        Self::new(std::any::type_name::<E>(), err.to_string())
    }

    /// Snapshot a panic payload. String payloads keep their text; anything
    /// else gets a generic description so the message invariant holds.
    pub fn from_panic(payload: &(dyn Any + Send), location: Option<String>) -> Self {
        let text = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        let message = match location {
            Some(loc) => format!("{text} (at {loc})"),
            None => text,
        };

        Self::new("panic", message)
    }

    /// Attach a captured backtrace.
    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }
}
