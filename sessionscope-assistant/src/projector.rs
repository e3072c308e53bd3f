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

//! Watermark-based log projection
//!
//! Tracks the highest record id already fetched and projects only newer
//! records into compact fact lines. The watermark advances only after the
//! memory accepts a batch, so a failed embedding call leaves it unchanged
//! and the same records are retried on the next refresh. Records a topic
//! filter holds back stay in a backlog until a later refresh embeds them.

use crate::config::AssistantConfig;
use crate::error::AssistantResult;
use crate::memory::SemanticMemory;
use sessionscope_core::EventRecord;
use sessionscope_storage::EventStore;

/// Question vocabulary that narrows projection to crash/ANR records.
/// Matched as whole words; "hang" inside "changed" is not a crash question.
const CRASH_TOPIC_KEYWORDS: &[&str] = &[
    "crash",
    "crashed",
    "crashes",
    "anr",
    "unresponsive",
    "freeze",
    "frozen",
    "hang",
];

const CRASH_TOPIC_PHRASE: &str = "not responding";

/// True if the question is asking about crashes or stalls.
pub fn question_targets_crashes(question: &str) -> bool {
    let question = question.to_lowercase();
    if question.contains(CRASH_TOPIC_PHRASE) {
        return true;
    }
    question
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| CRASH_TOPIC_KEYWORDS.contains(&token))
}

/// Project one record into a single compact fact line. Fields appear in a
/// fixed order and absent optional fields are omitted entirely.
pub fn fact_line(record: &EventRecord) -> String {
    let mut line = format!("time={}; type={}", record.timestamp_ms, record.kind);

    if let Some(screen) = record.screen.as_deref().filter(|s| !s.trim().is_empty()) {
        line.push_str("; screen=");
        line.push_str(screen);
    }
    if let Some(action) = record.action.as_deref().filter(|s| !s.trim().is_empty()) {
        line.push_str("; action=");
        line.push_str(action);
    }
    if let Some(api) = record.api.as_deref().filter(|s| !s.trim().is_empty()) {
        line.push_str("; api=");
        line.push_str(api);
    }

    line.push_str("; message=");
    line.push_str(&record.message);

    if let Some(exception) = record.exception.as_deref().filter(|s| !s.trim().is_empty()) {
        line.push_str("; exception=");
        line.push_str(exception);
    }
    if let Some(trace) = record.stack_trace.as_deref().filter(|s| !s.trim().is_empty()) {
        let head: Vec<&str> = trace.lines().take(2).collect();
        line.push_str("; stack=");
        line.push_str(&head.join(" | "));
    }

    line
}

/// Split text into chunks of at most `max_chars` characters, on character
/// boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Incremental projector from the event store into the semantic memory.
pub struct LogProjector {
    store: EventStore,
    config: AssistantConfig,
    /// Highest record id already fetched; unset until the first successful
    /// refresh of this process.
    watermark: Option<u64>,
    /// Records fetched but held back by a topic filter; re-projected on the
    /// next refresh so every record is eventually embedded.
    deferred: Vec<EventRecord>,
}

impl LogProjector {
    pub fn new(store: EventStore, config: AssistantConfig) -> Self {
        Self {
            store,
            config,
            watermark: None,
            deferred: Vec::new(),
        }
    }

    pub fn watermark(&self) -> Option<u64> {
        self.watermark
    }

    /// Fetch records newer than the watermark, project them to facts, and
    /// hand them to the memory. Returns how many records were projected.
    ///
    /// When `question` matches the crash vocabulary the batch is narrowed to
    /// CRASH/ANR records, unless that leaves nothing — the assistant must
    /// never answer from an empty context when no crash records exist.
    /// Narrowed-out records are deferred, not dropped; a later refresh picks
    /// them up again.
    pub async fn refresh(
        &mut self,
        question: &str,
        memory: &dyn SemanticMemory,
    ) -> AssistantResult<usize> {
        let fetched = match self.watermark {
            None => {
                // Cold start: latest N, restored to causal order.
                let mut records = self.store.query_latest(self.config.cold_start_limit);
                records.sort_by_key(|r| (r.timestamp_ms, r.id));
                records
            }
            Some(watermark) => self.store.query_after(watermark),
        };
        let fetched_max = fetched.iter().map(|r| r.id).max();

        // Deferred ids all precede the watermark, so causal order holds.
        let mut records: Vec<EventRecord> =
            self.deferred.iter().cloned().chain(fetched).collect();
        if records.is_empty() {
            return Ok(0);
        }

        let mut defer_next = Vec::new();
        if question_targets_crashes(question) {
            let failures: Vec<EventRecord> = records
                .iter()
                .filter(|r| r.kind.is_failure_report())
                .cloned()
                .collect();
            if !failures.is_empty() {
                defer_next = records
                    .into_iter()
                    .filter(|r| !r.kind.is_failure_report())
                    .collect();
                records = failures;
            }
        }

        let facts: Vec<String> = records.iter().map(fact_line).collect();
        let chunks = chunk_text(&facts.join("\n"), self.config.max_chunk_chars);

        // State changes only after the batch is accepted; a failed hand-off
        // leaves watermark and backlog intact for the retry.
        memory.memorize(chunks).await?;

        self.deferred = defer_next;
        if let Some(max_id) = fetched_max {
            self.watermark = Some(max_id);
        }
        tracing::debug!(
            embedded = records.len(),
            deferred = self.deferred.len(),
            watermark = ?self.watermark,
            "projected log batch into semantic memory"
        );

        Ok(records.len())
    }
}
