// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event deduplication.
//!
//! Webhook events are delivered at-least-once; the insert below is the single
//! atomicity point that keeps the rest of the pipeline idempotent.

use fincabot_core::FincabotError;
use rusqlite::params;

use crate::database::Database;

/// Record an event identifier if unseen.
///
/// Returns `true` when the identifier was already recorded (a duplicate
/// delivery). The `INSERT OR IGNORE` runs on the single writer thread, so two
/// concurrent calls for the same identifier can never both observe `false`.
pub async fn record_if_new(db: &Database, event_id: &str) -> Result<bool, FincabotError> {
    let event_id = event_id.to_string();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO processed_events (event_id) VALUES (?1)",
                params![event_id],
            )?;
            Ok(inserted == 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
