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

//! Terminal crash capture
//!
//! Writes a CRASH record synchronously while the process is dying. The
//! capture path must run to completion on the panicking thread itself: no
//! suspension, no background dispatch, because the async scheduler may never
//! run another task. Any failure inside the capture is swallowed so it can
//! never mask or alter the original crash's disposition.

use sessionscope_core::{EventDraft, EventKind, FailureInfo, ScreenTracker, SessionContext};
use sessionscope_storage::EventStore;
use std::sync::Arc;

/// Builds and synchronously appends CRASH records.
pub struct CrashCapture {
    store: EventStore,
    session: Arc<SessionContext>,
    screen: Arc<ScreenTracker>,
}

impl CrashCapture {
    pub fn new(
        store: EventStore,
        session: Arc<SessionContext>,
        screen: Arc<ScreenTracker>,
    ) -> Self {
        Self {
            store,
            session,
            screen,
        }
    }

    /// Record a terminal failure. Never raises; calling twice with the same
    /// failure produces two independent records, each preserving the message
    /// and stack text verbatim.
    pub fn capture(&self, failure: &FailureInfo) {
        let mut draft = EventDraft::new(
            EventKind::Crash,
            self.session.current(),
            failure.message.clone(),
        )
        .screen(self.screen.snapshot())
        .action("UncaughtException")
        .exception(failure.kind.clone());

        if let Some(trace) = &failure.backtrace {
            draft = draft.stack_trace(trace.clone());
        }

        if let Err(e) = self.store.append_sync(draft) {
            // The process is going down; losing this record is acceptable,
            // interfering with the crash is not.
            tracing::warn!(error = %e, "failed to persist crash record");
        }
    }
}

/// Install the crash capture as the process panic hook, wrapping whatever
/// hook was installed before. The previous hook always runs afterwards so
/// normal fatal-error behavior (abort, default report) is preserved.
pub fn install_panic_capture(capture: Arc<CrashCapture>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(|l| l.to_string());
        let failure = FailureInfo::from_panic(info.payload(), location)
            .with_backtrace(std::backtrace::Backtrace::force_capture().to_string());
        capture.capture(&failure);
        previous(info);
    }));
}
