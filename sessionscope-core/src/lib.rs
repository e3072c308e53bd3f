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

//! Sessionscope core types
//!
//! Shared vocabulary for the session diagnostics pipeline:
//! - **Event taxonomy**: [`EventKind`], [`EventRecord`], [`EventDraft`] —
//!   one immutable structured entry per application event.
//! - **Session context**: [`SessionContext`] — process-wide session id,
//!   replaceable at runtime.
//! - **Screen tracking**: [`ScreenTracker`] — last known UI screen,
//!   snapshotted per call by the writer and the crash paths.
//! - **Failure snapshots**: [`FailureInfo`] — owned capture of an error or
//!   panic (type name, message, backtrace) so crash records survive the
//!   value that produced them.

pub mod event;
pub mod failure;
pub mod screen;
pub mod session;

// Re-exports
pub use event::{EventDraft, EventKind, EventRecord};
pub use failure::FailureInfo;
pub use screen::ScreenTracker;
pub use session::SessionContext;
