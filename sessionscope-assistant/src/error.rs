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

//! Assistant error types

use crate::memory::MemoryError;
use thiserror::Error;

/// Result type for assistant operations
pub type AssistantResult<T> = Result<T, AssistantError>;

/// Errors that can occur in the retrieval pipeline. These are caught at the
/// orchestrator boundary and converted into user-facing answers; they never
/// propagate into the UI layer.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Event store failure while fetching records to project
    #[error("Store error: {0}")]
    Store(#[from] sessionscope_storage::StoreError),

    /// Semantic memory failure (embedding, retrieval, or inference)
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}
