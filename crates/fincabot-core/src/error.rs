// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fincabot agent.

use thiserror::Error;

/// The primary error type used across all Fincabot crates.
#[derive(Debug, Error)]
pub enum FincabotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound WhatsApp transport errors (API failure, rejected payload).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text-generation provider errors (API failure, malformed response).
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced contact, conversation, or listing does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
