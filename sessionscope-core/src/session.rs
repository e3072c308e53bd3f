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

//! Process-wide session context
//!
//! A session is a single logical run of the app: every event written while a
//! given id is current carries that id. The id is initialized from wall-clock
//! millis at construction and can be replaced with [`SessionContext::start_new`].
//! Not persisted; visibility is last-writer-wins across threads.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Generator and holder of the current session id.
#[derive(Debug)]
pub struct SessionContext {
    current: AtomicI64,
}

impl SessionContext {
    /// Start the first session of this process.
    pub fn new() -> Self {
        Self {
            current: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    /// The session id active right now. Readable from any thread.
    pub fn current(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Begin a new logical session and return its id.
    pub fn start_new(&self) -> i64 {
        let id = Utc::now().timestamp_millis();
        self.current.store(id, Ordering::SeqCst);
        id
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_stable_until_replaced() {
        let ctx = SessionContext::new();
        let first = ctx.current();
        assert_eq!(ctx.current(), first);

        let next = ctx.start_new();
        assert_eq!(ctx.current(), next);
        assert!(next >= first);
    }
}
