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

//! Assistant configuration

/// Retrieval parameters passed to the semantic memory on every
/// retrieve-and-generate call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    /// Number of candidate facts to retrieve.
    pub top_k: usize,
    /// Minimum similarity score for a candidate to be used.
    pub min_score: f32,
    pub task: RetrievalTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTask {
    QuestionAnswering,
    RetrievalOnly,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.1,
            task: RetrievalTask::QuestionAnswering,
        }
    }
}

/// Tuning knobs for the question-answering pipeline.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// How many of the latest records to project on a cold start, before
    /// any watermark exists.
    pub cold_start_limit: usize,

    /// Maximum characters per memorized chunk; the projector splits the
    /// aggregate fact text before handing it to the memory.
    pub max_chunk_chars: usize,

    /// Character budget for a generated answer before truncation.
    pub max_answer_chars: usize,

    pub retrieval: RetrievalOptions,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            cold_start_limit: 400,
            max_chunk_chars: 400,
            max_answer_chars: 700,
            retrieval: RetrievalOptions::default(),
        }
    }
}
