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

//! Semantic memory capability boundary
//!
//! The embedding model and the language model live behind this trait. The
//! core treats all three operations as opaque futures that may fail or never
//! complete; readiness is a recognized precondition, not an error.

use crate::config::RetrievalOptions;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a semantic memory implementation
#[derive(Debug, Error)]
pub enum MemoryError {
    /// One-time model initialization failed
    #[error("Model initialization failed: {0}")]
    Initialization(String),

    /// Embedding a batch of facts failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Retrieval or generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Anything else the backend reports
    #[error("Memory error: {0}")]
    Other(String),
}

/// Embedding store plus language model, as one capability.
#[async_trait]
pub trait SemanticMemory: Send + Sync {
    /// Resolve once one-time model initialization has finished. Idempotent.
    async fn wait_until_ready(&self) -> Result<(), MemoryError>;

    /// Embed a batch of fact chunks into the retrievable store. Each chunk
    /// is already within the per-unit character limit; the projector does
    /// the splitting.
    async fn memorize(&self, facts: Vec<String>) -> Result<(), MemoryError>;

    /// Retrieve relevant context for `question` and generate an answer.
    async fn retrieve_and_generate(
        &self,
        question: &str,
        options: &RetrievalOptions,
    ) -> Result<String, MemoryError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scriptable in-process memory for orchestration tests.
    pub(crate) struct MockMemory {
        pub ready_error: Mutex<Option<String>>,
        pub fail_memorize_times: AtomicUsize,
        pub fail_generate: AtomicBool,
        pub answer: Mutex<String>,
        pub memorize_calls: AtomicUsize,
        pub generate_calls: AtomicUsize,
        /// Every batch handed to `memorize`, in order.
        pub memorized: Mutex<Vec<Vec<String>>>,
    }

    impl MockMemory {
        pub(crate) fn new() -> Self {
            Self {
                ready_error: Mutex::new(None),
                fail_memorize_times: AtomicUsize::new(0),
                fail_generate: AtomicBool::new(false),
                answer: Mutex::new("mock answer".to_string()),
                memorize_calls: AtomicUsize::new(0),
                generate_calls: AtomicUsize::new(0),
                memorized: Mutex::new(Vec::new()),
            }
        }

        /// All memorized chunks flattened into one string, for containment
        /// assertions.
        pub(crate) fn memorized_text(&self) -> String {
            self.memorized
                .lock()
                .iter()
                .flatten()
                .cloned()
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    #[async_trait]
    impl SemanticMemory for MockMemory {
        async fn wait_until_ready(&self) -> Result<(), MemoryError> {
            match self.ready_error.lock().clone() {
                Some(e) => Err(MemoryError::Initialization(e)),
                None => Ok(()),
            }
        }

        async fn memorize(&self, facts: Vec<String>) -> Result<(), MemoryError> {
            self.memorize_calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.fail_memorize_times.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_memorize_times.store(remaining - 1, Ordering::SeqCst);
                return Err(MemoryError::Embedding("vector store offline".to_string()));
            }
            self.memorized.lock().push(facts);
            Ok(())
        }

        async fn retrieve_and_generate(
            &self,
            _question: &str,
            _options: &RetrievalOptions,
        ) -> Result<String, MemoryError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_generate.load(Ordering::SeqCst) {
                return Err(MemoryError::Inference("decoder crashed".to_string()));
            }
            Ok(self.answer.lock().clone())
        }
    }
}
