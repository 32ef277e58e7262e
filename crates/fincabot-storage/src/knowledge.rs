// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FTS5-backed knowledge base.
//!
//! Snippets (policies, FAQs, quick answers) live in a namespaced FTS5 table
//! and are retrieved with bm25() ranking. Raw customer text is tokenized
//! before it reaches MATCH, since FTS5 query syntax chokes on free-form
//! punctuation.

use async_trait::async_trait;
use fincabot_core::{FincabotError, KnowledgeSearch};
use rusqlite::params;

use crate::database::Database;

/// Knowledge retrieval over the `knowledge` FTS5 table.
#[derive(Clone)]
pub struct KnowledgeBase {
    db: Database,
}

impl KnowledgeBase {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add a snippet to a namespace.
    pub async fn insert_snippet(
        &self,
        namespace: &str,
        content: &str,
    ) -> Result<(), FincabotError> {
        let namespace = namespace.to_string();
        let content = content.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO knowledge (namespace, content) VALUES (?1, ?2)",
                    params![namespace, content],
                )?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

/// Turn free-form customer text into a safe FTS5 OR-query.
///
/// Each alphanumeric token is double-quoted; anything else is dropped.
fn fts_query(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| format!("\"{t}\""))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

#[async_trait]
impl KnowledgeSearch for KnowledgeBase {
    async fn search(
        &self,
        namespace: &str,
        query: &str,
        limit: usize,
    ) -> Result<String, FincabotError> {
        let Some(match_query) = fts_query(query) else {
            return Ok(String::new());
        };
        let namespace = namespace.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT content FROM knowledge \
                     WHERE knowledge MATCH ?1 AND namespace = ?2 \
                     ORDER BY bm25(knowledge) LIMIT ?3",
                )?;
                let rows =
                    stmt.query_map(params![match_query, namespace, limit as i64], |row| {
                        row.get::<_, String>(0)
                    })?;
                let mut snippets = Vec::new();
                for row in rows {
                    snippets.push(row?);
                }
                Ok(snippets.join("\n\n"))
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}
