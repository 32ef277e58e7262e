// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Fincabot agent.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query operations for
//! processed events, contacts, conversations, messages, and the read-mostly
//! listing/catalog/knowledge tables.

pub mod database;
pub mod knowledge;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use knowledge::KnowledgeBase;
pub use models::*;
