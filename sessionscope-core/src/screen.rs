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

//! Last-known-screen tracking
//!
//! The UI layer records the screen it is currently showing; the writer and
//! the crash paths snapshot it at call time. The value may be stale or absent
//! before any screen has been recorded, which is acceptable — crash records
//! want "where the user most likely was", not a guarantee.

use parking_lot::RwLock;

/// Shared handle to the most recently shown screen name.
#[derive(Debug, Default)]
pub struct ScreenTracker {
    current: RwLock<Option<String>>,
}

impl ScreenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the screen now being shown. Last writer wins.
    pub fn set(&self, screen: impl Into<String>) {
        *self.current.write() = Some(screen.into());
    }

    /// Snapshot the last known screen, if any.
    pub fn snapshot(&self) -> Option<String> {
        self.current.read().clone()
    }
}
