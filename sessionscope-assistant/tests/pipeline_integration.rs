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

//! Integration tests for the full ingestion-to-answer pipeline

use async_trait::async_trait;
use parking_lot::Mutex;
use sessionscope_assistant::{
    AssistantConfig, AssistantEngine, ConversationStore, MemoryError, RetrievalOptions,
    SemanticMemory,
};
use sessionscope_capture::{CrashCapture, EventWriter, PaymentOutcome, PaymentStatus};
use sessionscope_core::{EventKind, FailureInfo, ScreenTracker, SessionContext};
use sessionscope_storage::EventStore;
use std::sync::Arc;
use tempfile::tempdir;

/// Memory that records what it was asked to embed and answers from a canned
/// string, standing in for the on-device embedder + LLM.
#[derive(Default)]
struct RecordingMemory {
    memorized: Mutex<Vec<String>>,
    answer: Mutex<String>,
}

#[async_trait]
impl SemanticMemory for RecordingMemory {
    async fn wait_until_ready(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn memorize(&self, facts: Vec<String>) -> Result<(), MemoryError> {
        self.memorized.lock().extend(facts);
        Ok(())
    }

    async fn retrieve_and_generate(
        &self,
        _question: &str,
        _options: &RetrievalOptions,
    ) -> Result<String, MemoryError> {
        Ok(self.answer.lock().clone())
    }
}

struct App {
    store: EventStore,
    writer: EventWriter,
    crash: CrashCapture,
    engine: AssistantEngine,
    memory: Arc<RecordingMemory>,
    _dir: tempfile::TempDir,
}

fn wire_app() -> App {
    let dir = tempdir().unwrap();
    let store = EventStore::open(dir.path()).unwrap();
    let session = Arc::new(SessionContext::new());
    let screen = Arc::new(ScreenTracker::new());

    let writer = EventWriter::new(store.clone(), session.clone(), screen.clone());
    let crash = CrashCapture::new(store.clone(), session, screen);

    let memory = Arc::new(RecordingMemory::default());
    let engine = AssistantEngine::new(
        store.clone(),
        memory.clone(),
        Arc::new(ConversationStore::new()),
        writer.clone(),
        AssistantConfig::default(),
    );

    App {
        store,
        writer,
        crash,
        engine,
        memory,
        _dir: dir,
    }
}

async fn simulate_session(app: &App) {
    app.writer.screen_view("Login").await;
    app.writer.journey_step("login", Some("demo user")).await;
    app.writer.api_start("fetch_dashboard").await;
    app.writer.api_success("fetch_dashboard", 200, 84).await;
    app.writer.screen_view("Payments").await;
    app.writer
        .payment_result(&PaymentOutcome {
            payment_type: "DTH".to_string(),
            status: PaymentStatus::Failed,
            amount: Some("499".to_string()),
            label: "DTH recharge".to_string(),
            scenario: "SERVER_ERROR".to_string(),
            http_code: Some(500),
        })
        .await;
}

#[tokio::test]
async fn test_session_events_flow_into_the_answer_context() {
    let app = wire_app();
    simulate_session(&app).await;

    *app.memory.answer.lock() = "The DTH recharge failed with a server error.".to_string();
    app.engine.init_model_once().await;
    app.engine.send("which payments failed?").await;

    let embedded = app.memory.memorized.lock().join("\n");
    assert!(embedded.contains("screen=Payments"));
    assert!(embedded.contains("payment_status=FAILED"));
    assert!(embedded.contains("api=fetch_dashboard"));

    let state = app.engine.conversation().snapshot();
    let answer = &state.messages.last().unwrap().text;
    assert!(answer.contains("DTH recharge failed"));
    assert!(!state.is_sending);
}

#[tokio::test]
async fn test_crash_question_sees_only_failure_records() {
    let app = wire_app();
    simulate_session(&app).await;

    let failure = FailureInfo::new("demo::RenderPanic", "null surface")
        .with_backtrace("frame 0\nframe 1");
    app.crash.capture(&failure);

    app.engine.init_model_once().await;
    app.engine.send("why did the app crash?").await;

    let embedded = app.memory.memorized.lock().join("\n");
    assert!(embedded.contains("type=CRASH"));
    assert!(embedded.contains("exception=demo::RenderPanic"));
    assert!(!embedded.contains("type=PAYMENT"));
}

#[tokio::test]
async fn test_crash_records_survive_restart_and_reach_the_assistant() {
    let dir = tempdir().unwrap();

    // First process: a crash is captured synchronously, then the process dies.
    {
        let store = EventStore::open(dir.path()).unwrap();
        let crash = CrashCapture::new(
            store,
            Arc::new(SessionContext::new()),
            Arc::new(ScreenTracker::new()),
        );
        crash.capture(&FailureInfo::new("demo::Oom", "out of memory"));
    }

    // Second process: the record is still there and gets embedded.
    let store = EventStore::open(dir.path()).unwrap();
    assert_eq!(store.query_after(0).len(), 1);
    assert_eq!(store.query_after(0)[0].kind, EventKind::Crash);

    let memory = Arc::new(RecordingMemory::default());
    let session = Arc::new(SessionContext::new());
    let screen = Arc::new(ScreenTracker::new());
    let writer = EventWriter::new(store.clone(), session, screen);
    let engine = AssistantEngine::new(
        store,
        memory.clone(),
        Arc::new(ConversationStore::new()),
        writer,
        AssistantConfig::default(),
    );

    engine.init_model_once().await;
    engine.send("did anything crash last time?").await;

    assert!(memory.memorized.lock().join("\n").contains("out of memory"));
}
