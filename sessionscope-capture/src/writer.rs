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

//! High-level event writer
//!
//! All operations funnel through one `commit` primitive that snapshots the
//! current screen and session id, builds a delimited key-value message
//! envelope (`API_CALL; api=…; result=SUCCESS; …`) for downstream machine
//! parsing, and appends asynchronously.
//!
//! Every public operation is total. A failed append is logged and discarded;
//! callers never see an error from here.

use sessionscope_core::{EventDraft, EventKind, FailureInfo, ScreenTracker, SessionContext};
use sessionscope_storage::EventStore;
use std::fmt::Write as _;
use std::sync::Arc;

/// Outcome of a simulated payment, serialized into a `PAYMENT_RESULT`
/// message envelope.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// e.g. "DTH", "CREDIT_CARD"
    pub payment_type: String,
    pub status: PaymentStatus,
    /// e.g. "499"
    pub amount: Option<String>,
    /// Human label for the payment.
    pub label: String,
    /// e.g. "SUCCESS", "SERVER_ERROR"
    pub scenario: String,
    pub http_code: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

/// Formats typed events and appends them to the store.
#[derive(Clone)]
pub struct EventWriter {
    store: EventStore,
    session: Arc<SessionContext>,
    screen: Arc<ScreenTracker>,
}

impl EventWriter {
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

    /// Base commit helper. Screen and session are snapshotted here, at call
    /// time, so crash-adjacent records carry "where the user last was".
    async fn commit(
        &self,
        kind: EventKind,
        message: String,
        action: Option<&str>,
        api: Option<&str>,
        failure: Option<&FailureInfo>,
    ) {
        let mut draft = EventDraft::new(kind, self.session.current(), message)
            .screen(self.screen.snapshot());
        if let Some(action) = action {
            draft = draft.action(action);
        }
        if let Some(api) = api {
            draft = draft.api(api);
        }
        if let Some(failure) = failure {
            draft = draft.exception(failure.kind.as_str());
            if let Some(trace) = &failure.backtrace {
                draft = draft.stack_trace(trace.clone());
            }
        }

        if let Err(e) = self.store.append(draft).await {
            tracing::warn!(error = %e, "dropping log event, append failed");
        }
    }

    pub async fn info(&self, message: &str, action: Option<&str>, api: Option<&str>) {
        self.commit(EventKind::Info, message.to_string(), action, api, None)
            .await;
    }

    /// Record a recoverable failure as a `result=FAILED` envelope.
    pub async fn error(&self, message: &str, api: Option<&str>, failure: Option<&FailureInfo>) {
        let mut envelope = format!("ERROR_EVENT; result=FAILED; message={message}");
        if let Some(failure) = failure {
            let _ = write!(envelope, "; exception={}", failure.kind);
        }
        self.commit(EventKind::Error, envelope, Some("ERROR_EVENT"), api, failure)
            .await;
    }

    pub async fn api_start(&self, api: &str) {
        let envelope = format!("API_CALL; api={api}; state=START");
        self.commit(EventKind::Api, envelope, Some("API_START"), Some(api), None)
            .await;
    }

    pub async fn api_success(&self, api: &str, http_code: u16, duration_ms: u64) {
        let envelope = format!(
            "API_CALL; api={api}; result=SUCCESS; http_code={http_code}; duration_ms={duration_ms}"
        );
        self.commit(EventKind::Api, envelope, Some("API_RESULT"), Some(api), None)
            .await;
    }

    pub async fn api_failure(
        &self,
        api: &str,
        http_code: Option<u16>,
        failure: Option<&FailureInfo>,
    ) {
        let code = http_code.map(i32::from).unwrap_or(-1);
        let mut envelope = format!("API_CALL; api={api}; result=FAILED; http_code={code}");
        if let Some(failure) = failure {
            let _ = write!(envelope, "; exception={}", failure.kind);
        }
        self.commit(EventKind::Api, envelope, Some("API_RESULT"), Some(api), failure)
            .await;
    }

    /// Record that `screen` is now being shown, and remember it as the last
    /// known screen for every later event.
    pub async fn screen_view(&self, screen: &str) {
        self.screen.set(screen);
        self.commit(
            EventKind::Info,
            "Screen viewed".to_string(),
            Some("SCREEN_VIEW"),
            None,
            None,
        )
        .await;
    }

    pub async fn journey_step(&self, step: &str, detail: Option<&str>) {
        let mut envelope = format!("JOURNEY_STEP; step={step}");
        if let Some(detail) = detail.filter(|d| !d.trim().is_empty()) {
            let _ = write!(envelope, "; detail={detail}");
        }
        self.commit(EventKind::Info, envelope, Some("JOURNEY_STEP"), None, None)
            .await;
    }

    pub async fn user_action(&self, name: &str, detail: Option<&str>) {
        let mut envelope = format!("USER_ACTION; action={name}");
        if let Some(detail) = detail.filter(|d| !d.trim().is_empty()) {
            let _ = write!(envelope, "; detail={detail}");
        }
        self.commit(EventKind::Info, envelope, Some("USER_ACTION"), None, None)
            .await;
    }

    pub async fn payment_result(&self, outcome: &PaymentOutcome) {
        let mut envelope = format!(
            "PAYMENT_RESULT; payment_type={}; payment_status={}; payment_title={}",
            outcome.payment_type,
            outcome.status.as_str(),
            outcome.label
        );
        if let Some(amount) = outcome.amount.as_deref().filter(|a| !a.trim().is_empty()) {
            let _ = write!(envelope, "; payment_amount={amount}");
        }
        let code = outcome.http_code.map(i32::from).unwrap_or(-1);
        let _ = write!(envelope, "; scenario={}; http_code={code}", outcome.scenario);

        self.commit(
            EventKind::Payment,
            envelope,
            Some("PAYMENT_RESULT"),
            Some("simulate_payment"),
            None,
        )
        .await;
    }

    pub async fn assistant_question(&self, question: &str) {
        let envelope = format!("ASSISTANT_QUESTION; question={question}");
        self.commit(
            EventKind::Info,
            envelope,
            Some("ASSISTANT_QUESTION"),
            None,
            None,
        )
        .await;
    }

    pub async fn assistant_answer(&self, answer: &str) {
        let envelope = format!("ASSISTANT_ANSWER; answer={answer}");
        self.commit(
            EventKind::Info,
            envelope,
            Some("ASSISTANT_ANSWER"),
            None,
            None,
        )
        .await;
    }
}
