// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP intake for Fincabot.
//!
//! The gateway serves the YCloud webhook endpoint and the thin operator
//! inbox routes. Webhook processing is spawned so the provider gets its 200
//! immediately; the event deduplicator upstream makes redeliveries safe.

pub mod handlers;
pub mod server;

pub use server::{start_server, AppState, ServerConfig};
