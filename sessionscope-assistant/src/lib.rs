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

//! Sessionscope assistant
//!
//! The log-driven retrieval-augmented question answering pipeline:
//! - [`LogProjector`] — watermark-based incremental projection of new event
//!   records into compact textual facts, chunked and handed to the semantic
//!   memory. A failed hand-off never advances the watermark, so the same
//!   records are retried on the next refresh (at-least-once embedding).
//! - [`SemanticMemory`] — capability boundary to the embedding / inference
//!   backend. The core assumes nothing about it beyond the three async
//!   operations and that any of them may fail or never complete.
//! - [`ConversationStore`] — single snapshot of the per-screen chat state,
//!   updated only through whole-snapshot reducers; one turn in flight at a
//!   time.
//! - [`AssistantEngine`] — per-turn orchestration: small-talk shortcut,
//!   model readiness gate, memory refresh, retrieval + generation, and
//!   answer truncation. Failures become same-turn textual answers; a raw
//!   error never reaches the UI layer.

pub mod config;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod memory;
pub mod projector;

// Re-exports
pub use config::{AssistantConfig, RetrievalOptions, RetrievalTask};
pub use conversation::{ChatMessage, ConversationState, ConversationStore};
pub use engine::AssistantEngine;
pub use error::{AssistantError, AssistantResult};
pub use memory::{MemoryError, SemanticMemory};
pub use projector::LogProjector;
