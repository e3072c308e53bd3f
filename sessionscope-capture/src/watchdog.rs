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

//! Main-loop stall watchdog
//!
//! A heartbeat protocol on a dedicated thread: each cycle posts a no-op
//! marker onto the main loop, sleeps for the stall threshold, and checks
//! whether the marker ran. A missed marker means the main loop failed to
//! schedule work within the threshold; the watchdog then records an ANR
//! event synchronously and re-arms. Liveness is inferred from the marker,
//! never from scheduler internals.
//!
//! Cycle states: armed, then either cleared (marker ran) or reported
//! (deadline elapsed). The loop has no terminal state besides [`StallWatchdog::stop`].

use sessionscope_core::{EventDraft, EventKind, ScreenTracker, SessionContext};
use sessionscope_storage::EventStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle to the single-threaded UI/main execution context being probed.
pub trait MainLoop: Send + Sync + 'static {
    /// Schedule a closure onto the main context. Must not block the caller.
    fn post(&self, marker: Box<dyn FnOnce() + Send>);

    /// Best-effort textual stack snapshot of the main thread, captured when
    /// a stall is being reported.
    fn stack_snapshot(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Stall threshold; also the cycle period.
    pub timeout: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
        }
    }
}

/// Running watchdog thread. Stopping is optional — the loop swallows every
/// failure and can simply be abandoned at process exit.
pub struct StallWatchdog {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StallWatchdog {
    /// Start the watchdog thread.
    pub fn spawn(
        config: WatchdogConfig,
        store: EventStore,
        session: Arc<SessionContext>,
        screen: Arc<ScreenTracker>,
        main_loop: Arc<dyn MainLoop>,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = std::thread::Builder::new()
            .name("stall-watchdog".to_string())
            .spawn(move || {
                run_cycles(config, store, session, screen, main_loop, thread_stop);
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Request shutdown and wait for the current cycle to finish.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StallWatchdog {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn run_cycles(
    config: WatchdogConfig,
    store: EventStore,
    session: Arc<SessionContext>,
    screen: Arc<ScreenTracker>,
    main_loop: Arc<dyn MainLoop>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::SeqCst) {
        let cleared = Arc::new(AtomicBool::new(false));
        let marker = cleared.clone();
        main_loop.post(Box::new(move || {
            marker.store(true, Ordering::SeqCst);
        }));

        std::thread::sleep(config.timeout);

        if stop.load(Ordering::SeqCst) {
            return;
        }

        if !cleared.load(Ordering::SeqCst) {
            report_stall(&config, &store, &session, &screen, main_loop.as_ref());
        }
    }
}

fn report_stall(
    config: &WatchdogConfig,
    store: &EventStore,
    session: &SessionContext,
    screen: &ScreenTracker,
    main_loop: &dyn MainLoop,
) {
    let timeout_ms = config.timeout.as_millis();
    let stack = main_loop.stack_snapshot();
    let message =
        format!("Main thread unresponsive for >= {timeout_ms}ms.\nStacktrace:\n{stack}");

    let draft = EventDraft::new(EventKind::Anr, session.current(), message)
        .screen(screen.snapshot())
        .action("ANR_DETECTED")
        .stack_trace(stack);

    // Synchronous on purpose: the async scheduler may be the thing that is
    // stalled. Failures never escape the watchdog thread.
    if let Err(e) = store.append_sync(draft) {
        tracing::warn!(error = %e, "failed to persist stall record");
    }
}
