// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact resolution.

use fincabot_core::FincabotError;
use rusqlite::params;
use rusqlite::OptionalExtension;

use crate::database::Database;
use crate::models::Contact;

/// Resolve a phone number to a contact id, creating the contact on first
/// sight.
///
/// Idempotent: repeated calls with the same phone return the same id
/// regardless of name drift. An empty name falls back to the phone itself.
pub async fn get_or_create(
    db: &Database,
    phone: &str,
    name: &str,
    now_ms: i64,
) -> Result<String, FincabotError> {
    let phone = phone.to_string();
    let name = if name.trim().is_empty() {
        phone.clone()
    } else {
        name.trim().to_string()
    };
    let id = uuid::Uuid::new_v4().to_string();

    db.connection()
        .call(move |conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM contacts WHERE phone = ?1",
                    params![phone],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(existing_id) = existing {
                return Ok(existing_id);
            }
            conn.execute(
                "INSERT INTO contacts (id, phone, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, phone, name, now_ms],
            )?;
            Ok(id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a contact by id.
pub async fn get(db: &Database, id: &str) -> Result<Option<Contact>, FincabotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let contact = conn
                .query_row(
                    "SELECT id, phone, name, created_at FROM contacts WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(Contact {
                            id: row.get(0)?,
                            phone: row.get(1)?,
                            name: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(contact)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a contact by phone number.
pub async fn get_by_phone(db: &Database, phone: &str) -> Result<Option<Contact>, FincabotError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let contact = conn
                .query_row(
                    "SELECT id, phone, name, created_at FROM contacts WHERE phone = ?1",
                    params![phone],
                    |row| {
                        Ok(Contact {
                            id: row.get(0)?,
                            phone: row.get(1)?,
                            name: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(contact)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
