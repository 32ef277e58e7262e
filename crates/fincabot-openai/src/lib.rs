// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Chat Completions provider for Fincabot.
//!
//! Implements [`TextGenerator`] over the Chat Completions HTTP API with
//! one-shot retry on transient errors. Both the free-form reply path and the
//! constrained classification path go through the same client.

pub mod client;
pub mod types;

pub use client::OpenAiClient;
