// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound WhatsApp transport trait.

use async_trait::async_trait;

use crate::error::FincabotError;

/// Outbound side of the messaging provider.
///
/// Delivery is at-least-once from the platform's perspective; callers treat
/// every send as fallible and idempotence lives upstream in the event
/// deduplicator.
#[async_trait]
pub trait WhatsAppTransport: Send + Sync {
    /// Sends a plain text message, optionally threaded under `reply_to`.
    async fn send_text(
        &self,
        to: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<(), FincabotError>;

    /// Sends catalog entries as an interactive message.
    ///
    /// A single product id degrades to the single-product message type;
    /// multiple ids are sent as a product list.
    async fn send_product_list(
        &self,
        to: &str,
        product_ids: &[String],
        body_text: &str,
        catalog_external_id: &str,
        reply_to: Option<&str>,
    ) -> Result<(), FincabotError>;
}
