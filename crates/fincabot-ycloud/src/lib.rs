// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YCloud WhatsApp integration for Fincabot.
//!
//! [`client`] implements the outbound [`WhatsAppTransport`] over the YCloud
//! HTTP API; [`webhook`] models the inbound event envelope and extracts the
//! fields the orchestrator cares about.
//!
//! [`WhatsAppTransport`]: fincabot_core::WhatsAppTransport

pub mod client;
pub mod webhook;

pub use client::YCloudClient;
pub use webhook::{WebhookEvent, WebhookPayload};
