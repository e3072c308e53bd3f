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

//! Sessionscope capture
//!
//! Everything that writes events into the log store:
//! - [`EventWriter`] — the high-level logging taxonomy used by normal app
//!   flow. Every operation is total: a failed append is downgraded to a
//!   `tracing` warning, because instrumentation must never destabilize the
//!   app it observes.
//! - [`CrashCapture`] / [`install_panic_capture`] — synchronous terminal
//!   capture on the panic path, always delegating to the previously
//!   installed hook afterwards.
//! - [`StallWatchdog`] — a heartbeat thread that detects an unresponsive
//!   main loop and records an ANR event without involving the async
//!   scheduler.

pub mod crash;
pub mod watchdog;
pub mod writer;

pub use crash::{install_panic_capture, CrashCapture};
pub use watchdog::{MainLoop, StallWatchdog, WatchdogConfig};
pub use writer::{EventWriter, PaymentOutcome, PaymentStatus};
