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

//! Conversation state
//!
//! One mutable snapshot of the chat screen, updated only through
//! whole-snapshot reducers on a watch channel: single writer discipline,
//! many readers. Message ids come from a monotonic per-process counter;
//! the two messages of a turn (user + pending assistant placeholder) get
//! adjacent ids reserved atomically up front.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// One chat bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: u64,
    pub is_user: bool,
    pub text: String,
    pub timestamp_ms: i64,
    /// True while the assistant's answer for this turn is outstanding.
    pub is_pending: bool,
}

impl ChatMessage {
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            is_user: true,
            text: text.into(),
            timestamp_ms: Utc::now().timestamp_millis(),
            is_pending: false,
        }
    }

    pub fn pending_assistant(id: u64, placeholder: impl Into<String>) -> Self {
        Self {
            id,
            is_user: false,
            text: placeholder.into(),
            timestamp_ms: Utc::now().timestamp_millis(),
            is_pending: true,
        }
    }
}

/// Snapshot of the chat screen.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    /// True while a turn is in flight; gates further sends.
    pub is_sending: bool,
    pub is_model_ready: bool,
    pub model_error: Option<String>,
    pub progress_message: Option<String>,
}

impl ConversationState {
    /// Replace the pending placeholder's text in place. Existing messages
    /// are never removed or reordered.
    pub fn resolve_pending(&mut self, id: u64, text: impl Into<String>) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.text = text.into();
            message.is_pending = false;
        }
    }
}

/// Shared holder of the conversation snapshot, message-id counter, and the
/// once-per-process model init latch.
pub struct ConversationStore {
    state: watch::Sender<ConversationState>,
    next_message_id: AtomicU64,
    model_init_started: AtomicBool,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConversationState::default());
        Self {
            state,
            next_message_id: AtomicU64::new(1),
            model_init_started: AtomicBool::new(false),
        }
    }

    /// Current snapshot, cloned.
    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    /// Watch the snapshot for changes (for the UI layer).
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    /// Apply a reducer atomically against the current snapshot.
    pub fn update(&self, reducer: impl FnOnce(&mut ConversationState)) {
        self.state.send_modify(reducer);
    }

    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.input_text = text);
    }

    /// Atomically claim the send gate. Returns false if a turn is already
    /// in flight.
    pub fn try_begin_turn(&self) -> bool {
        let mut claimed = false;
        self.update(|s| {
            if !s.is_sending {
                s.is_sending = true;
                claimed = true;
            }
        });
        claimed
    }

    /// Reserve `count` adjacent message ids and return the first.
    pub fn reserve_message_ids(&self, count: u64) -> u64 {
        self.next_message_id.fetch_add(count, Ordering::SeqCst)
    }

    /// Claim the one-time model initialization. Returns true exactly once
    /// per process unless a failed attempt is abandoned.
    pub fn try_begin_model_init(&self) -> bool {
        self.model_init_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the init latch after a failed attempt so the next screen
    /// visit retries.
    pub fn abort_model_init(&self) {
        self.model_init_started.store(false, Ordering::SeqCst);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
