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

//! Retrieval-and-inference orchestration
//!
//! Per-turn pipeline: gate on blank input and in-flight turns, short-circuit
//! small talk, gate on model readiness, refresh the projector, run retrieval
//! plus generation, then truncate. Every failure becomes a same-turn textual
//! answer; a turn always resolves.

use crate::config::AssistantConfig;
use crate::conversation::{ChatMessage, ConversationStore};
use crate::memory::SemanticMemory;
use crate::projector::LogProjector;
use sessionscope_capture::EventWriter;
use sessionscope_core::FailureInfo;
use sessionscope_storage::EventStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Inputs answered without retrieval: exact match or prefix followed by a
/// space, case-insensitive, trimmed.
const GREETING_PATTERNS: &[&str] = &["hi", "hello", "hey", "thanks", "thank you", "ok", "okay"];

const SMALL_TALK_ANSWER: &str = "Hi! I'm your session assistant. Ask me things like:\n\
    - \"Summarize this session's journey\"\n\
    - \"Which payments succeeded or failed?\"";

const MODEL_NOT_READY_ANSWER: &str =
    "The local model is still initializing. Please wait and try again.";

const PENDING_PLACEHOLDER: &str = "Thinking…";

const TRUNCATION_NOTICE: &str = "[Answer shortened to keep it concise.]";

/// Classify greeting/acknowledgement inputs.
pub fn is_small_talk(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return true;
    }
    GREETING_PATTERNS
        .iter()
        .any(|p| text == *p || text.starts_with(&format!("{p} ")))
}

/// Cut an over-budget answer at the last newline at or before the budget,
/// falling back to a hard cut, and append a truncation notice. The budget is
/// counted in characters.
pub fn shorten_answer(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars).collect();
    let cut = match head.rfind('\n') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head.as_str(),
    };

    format!("{}\n\n{TRUNCATION_NOTICE}", cut.trim_end())
}

/// Orchestrates one question-answering turn at a time.
pub struct AssistantEngine {
    memory: Arc<dyn SemanticMemory>,
    projector: Mutex<LogProjector>,
    conversation: Arc<ConversationStore>,
    writer: EventWriter,
    config: AssistantConfig,
}

impl AssistantEngine {
    pub fn new(
        store: EventStore,
        memory: Arc<dyn SemanticMemory>,
        conversation: Arc<ConversationStore>,
        writer: EventWriter,
        config: AssistantConfig,
    ) -> Self {
        Self {
            memory,
            projector: Mutex::new(LogProjector::new(store, config.clone())),
            conversation,
            writer,
            config,
        }
    }

    pub fn conversation(&self) -> &Arc<ConversationStore> {
        &self.conversation
    }

    /// One-time model initialization. The latch makes subsequent screen
    /// visits skip this entirely; a failed attempt releases the latch so the
    /// next visit retries.
    pub async fn init_model_once(&self) {
        if !self.conversation.try_begin_model_init() {
            return;
        }

        self.conversation.update(|s| {
            s.progress_message = Some("Initializing local AI model…".to_string());
            s.model_error = None;
        });

        match self.memory.wait_until_ready().await {
            Ok(()) => {
                self.conversation.update(|s| {
                    s.is_model_ready = true;
                    s.progress_message = None;
                });
            }
            Err(e) => {
                let detail = format!("Failed to initialize model: {e}");
                self.conversation.update(|s| {
                    s.is_model_ready = false;
                    s.model_error = Some(detail.clone());
                    s.progress_message = None;
                });
                self.writer
                    .error(&detail, None, Some(&FailureInfo::from_error(&e)))
                    .await;
                self.conversation.abort_model_init();
            }
        }
    }

    /// Run one full turn. Ignored when the input is blank or a turn is
    /// already in flight; otherwise the turn always resolves with a textual
    /// answer in the placeholder message.
    pub async fn send(&self, raw: &str) {
        let text = raw.trim().to_string();
        if text.is_empty() {
            return;
        }
        if !self.conversation.try_begin_turn() {
            return;
        }

        let small_talk = is_small_talk(&text);
        let base_id = self.conversation.reserve_message_ids(2);
        let user = ChatMessage::user(base_id, text.clone());
        let placeholder = ChatMessage::pending_assistant(base_id + 1, PENDING_PLACEHOLDER);

        // Optimistic UI: both bubbles appear before any work happens.
        self.conversation.update(|s| {
            s.messages.push(user);
            s.messages.push(placeholder);
            s.input_text.clear();
            s.progress_message = if small_talk {
                None
            } else {
                Some("Refreshing this session's logs and querying the model…".to_string())
            };
        });

        self.writer.assistant_question(&text).await;

        let started = Instant::now();
        let answer = self.answer_for(&text).await;
        let took_ms = started.elapsed().as_millis();

        self.writer.assistant_answer(&answer).await;

        self.conversation.update(|s| {
            s.progress_message = None;
            s.resolve_pending(base_id + 1, format!("{answer}\n\n(Answered in {took_ms}ms)"));
            s.is_sending = false;
        });
    }

    /// The answer pipeline proper: shortcut, gate, refresh, generate,
    /// truncate. Failures are converted to user-facing text here.
    async fn answer_for(&self, question: &str) -> String {
        if is_small_talk(question) {
            return SMALL_TALK_ANSWER.to_string();
        }

        if !self.conversation.snapshot().is_model_ready {
            return MODEL_NOT_READY_ANSWER.to_string();
        }

        {
            let mut projector = self.projector.lock().await;
            if let Err(e) = projector.refresh(question, self.memory.as_ref()).await {
                tracing::warn!(error = %e, "memory refresh failed");
                self.writer
                    .error(
                        &format!("Assistant pipeline failure for question: \"{question}\" - {e}"),
                        None,
                        Some(&FailureInfo::from_error(&e)),
                    )
                    .await;
                return format!("The local AI pipeline failed while answering your question: {e}");
            }
        }

        let raw = match self
            .memory
            .retrieve_and_generate(question, &self.config.retrieval)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval/generation failed");
                self.writer
                    .error(
                        &format!("Assistant pipeline failure for question: \"{question}\" - {e}"),
                        None,
                        Some(&FailureInfo::from_error(&e)),
                    )
                    .await;
                return format!("The local AI pipeline failed while answering your question: {e}");
            }
        };

        shorten_answer(&raw, self.config.max_answer_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mock::MockMemory;
    use sessionscope_core::{EventDraft, EventKind, ScreenTracker, SessionContext};
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    struct Harness {
        engine: AssistantEngine,
        memory: Arc<MockMemory>,
        store: EventStore,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let store = EventStore::open(dir.path()).unwrap();
        let memory = Arc::new(MockMemory::new());
        let writer = EventWriter::new(
            store.clone(),
            Arc::new(SessionContext::new()),
            Arc::new(ScreenTracker::new()),
        );
        let engine = AssistantEngine::new(
            store.clone(),
            memory.clone(),
            Arc::new(ConversationStore::new()),
            writer,
            AssistantConfig::default(),
        );
        Harness {
            engine,
            memory,
            store,
            _dir: dir,
        }
    }

    fn last_assistant_text(engine: &AssistantEngine) -> String {
        let state = engine.conversation().snapshot();
        state
            .messages
            .iter()
            .rev()
            .find(|m| !m.is_user)
            .map(|m| m.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_small_talk_classifier() {
        assert!(is_small_talk("hi"));
        assert!(is_small_talk("Hello"));
        assert!(is_small_talk("thanks "));
        assert!(is_small_talk("okay then"));
        assert!(is_small_talk("   "));
        assert!(!is_small_talk("history of this session"));
        assert!(!is_small_talk("why did payment fail?"));
    }

    #[test]
    fn test_shorten_answer_prefers_newline_boundary() {
        // 900 chars with the only newline at position 650.
        let mut text = "a".repeat(650);
        text.push('\n');
        text.push_str(&"b".repeat(249));
        assert_eq!(text.chars().count(), 900);

        let shortened = shorten_answer(&text, 700);
        let body = shortened.split("\n\n").next().unwrap();
        assert_eq!(body.chars().count(), 650);
        assert!(body.chars().all(|c| c == 'a'));
        assert!(shortened.ends_with(TRUNCATION_NOTICE));
    }

    #[test]
    fn test_shorten_answer_hard_cut_without_newline() {
        let text = "x".repeat(900);
        let shortened = shorten_answer(&text, 700);
        let body = shortened.split("\n\n").next().unwrap();
        assert_eq!(body.chars().count(), 700);
        assert!(shortened.ends_with(TRUNCATION_NOTICE));
    }

    #[test]
    fn test_shorten_answer_within_budget_is_untouched() {
        let text = "short answer";
        assert_eq!(shorten_answer(text, 700), text);
    }

    #[tokio::test]
    async fn test_greetings_bypass_the_memory_entirely() {
        let h = harness();
        h.engine.init_model_once().await;

        for input in ["hi", "Hello", "thanks "] {
            h.engine.send(input).await;
        }

        assert_eq!(h.memory.memorize_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.memory.generate_calls.load(Ordering::SeqCst), 0);
        assert!(last_assistant_text(&h.engine).contains("I'm your session assistant"));
    }

    #[tokio::test]
    async fn test_model_not_ready_short_circuits() {
        let h = harness();
        // No init_model_once: the model is not ready.

        h.engine.send("why did payment fail?").await;

        assert_eq!(h.memory.memorize_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.memory.generate_calls.load(Ordering::SeqCst), 0);
        assert!(last_assistant_text(&h.engine).contains("still initializing"));
    }

    #[tokio::test]
    async fn test_successful_turn_resolves_placeholder_in_place() {
        let h = harness();
        h.engine.init_model_once().await;
        h.store
            .append_sync(EventDraft::new(EventKind::Payment, 1, "PAYMENT_RESULT; payment_status=FAILED"))
            .unwrap();
        *h.memory.answer.lock() = "The DTH payment failed with a server error.".to_string();

        h.engine.send("which payments failed?").await;

        let state = h.engine.conversation().snapshot();
        assert!(!state.is_sending);
        assert_eq!(state.progress_message, None);

        let turn: Vec<_> = state.messages.iter().rev().take(2).collect();
        let assistant = turn[0];
        let user = turn[1];
        assert!(user.is_user);
        assert_eq!(user.id + 1, assistant.id);
        assert!(!assistant.is_pending);
        assert!(assistant.text.contains("The DTH payment failed"));
        assert!(assistant.text.contains("(Answered in "));
        assert_eq!(h.memory.generate_calls.load(Ordering::SeqCst), 1);
        assert!(h.memory.memorized_text().contains("payment_status=FAILED"));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_a_textual_answer() {
        let h = harness();
        h.engine.init_model_once().await;
        h.store
            .append_sync(EventDraft::new(EventKind::Info, 1, "Screen viewed"))
            .unwrap();
        h.memory.fail_generate.store(true, Ordering::SeqCst);

        h.engine.send("summarize this session").await;

        let text = last_assistant_text(&h.engine);
        assert!(text.contains("The local AI pipeline failed"));
        assert!(text.contains("decoder crashed"));
        assert!(!h.engine.conversation().snapshot().is_sending);

        // The failure was also logged as an ERROR event.
        let errors: Vec<_> = h
            .store
            .query_after(0)
            .into_iter()
            .filter(|r| r.kind == EventKind::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Assistant pipeline failure"));
        // The typed error travels along as the record's exception field.
        assert!(errors[0].exception.as_deref().unwrap().contains("MemoryError"));
    }

    #[tokio::test]
    async fn test_refresh_failure_skips_generation() {
        let h = harness();
        h.engine.init_model_once().await;
        h.store
            .append_sync(EventDraft::new(EventKind::Info, 1, "Screen viewed"))
            .unwrap();
        h.memory.fail_memorize_times.store(1, Ordering::SeqCst);

        h.engine.send("summarize this session").await;

        assert_eq!(h.memory.generate_calls.load(Ordering::SeqCst), 0);
        assert!(last_assistant_text(&h.engine).contains("vector store offline"));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let h = harness();
        h.engine.send("   ").await;
        assert!(h.engine.conversation().snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_turn_blocks_further_sends() {
        let h = harness();
        h.engine.conversation().update(|s| s.is_sending = true);

        h.engine.send("hello there").await;

        assert!(h.engine.conversation().snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_failed_model_init_records_error_and_allows_retry() {
        let h = harness();
        *h.memory.ready_error.lock() = Some("weights missing".to_string());

        h.engine.init_model_once().await;

        let state = h.engine.conversation().snapshot();
        assert!(!state.is_model_ready);
        assert!(state.model_error.as_deref().unwrap().contains("weights missing"));

        let errors: Vec<_> = h
            .store
            .query_after(0)
            .into_iter()
            .filter(|r| r.kind == EventKind::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].exception.as_deref().unwrap().contains("MemoryError"));

        // Retry succeeds once the backend recovers.
        *h.memory.ready_error.lock() = None;
        h.engine.init_model_once().await;
        assert!(h.engine.conversation().snapshot().is_model_ready);
    }
}
