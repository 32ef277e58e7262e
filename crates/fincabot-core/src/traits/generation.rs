// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation provider trait.

use async_trait::async_trait;

use crate::error::FincabotError;
use crate::types::ChatMessage;

/// A black-box text-generation provider.
///
/// [`generate`](TextGenerator::generate) produces a free-form reply from a
/// system prompt and dialogue history. [`classify`](TextGenerator::classify)
/// is the constrained variant used by the intent classifier: the provider is
/// instructed to emit a single JSON object and the raw text is returned for
/// the caller to parse defensively.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a reply from a system prompt and ordered dialogue turns.
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, FincabotError>;

    /// Generates a short constrained completion for a single user message.
    async fn classify(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, FincabotError>;
}
