// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-retrieval trait.

use async_trait::async_trait;

use crate::error::FincabotError;

/// Ranked-snippet retrieval over a namespaced knowledge base.
///
/// Returns the top snippets concatenated as plain text, ready to drop into a
/// system prompt. An empty string means nothing relevant was found.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(
        &self,
        namespace: &str,
        query: &str,
        limit: usize,
    ) -> Result<String, FincabotError>;
}
