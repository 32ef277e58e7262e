// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle and the automated/human/resolved handoff machine.
//!
//! At most one conversation per contact is active (automated or human) at a
//! time. Resolution of "the conversation for this contact" prefers the most
//! recently updated active one, then reactivates the most recent resolved
//! one, and only then creates a new thread. Old resolved conversations stay
//! untouched as separate historical threads.

use fincabot_core::FincabotError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::models::{
    Conversation, ConversationStatus, ConversationWithContact, Priority, SearchFilters,
};

fn parse_col<T, E>(idx: usize, result: Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn row_to_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    let status: String = row.get(2)?;
    let priority: Option<String> = row.get(3)?;
    let last_sent: Option<String> = row.get(4)?;
    let last_filters: Option<String> = row.get(5)?;

    Ok(Conversation {
        id: row.get(0)?,
        contact_id: row.get(1)?,
        status: parse_col(2, status.parse::<ConversationStatus>())?,
        priority: match priority {
            Some(p) => Some(parse_col(3, p.parse::<Priority>())?),
            None => None,
        },
        last_sent_listing_ids: match last_sent {
            Some(json) => parse_col(4, serde_json::from_str(&json))?,
            None => Vec::new(),
        },
        last_search_filters: match last_filters {
            Some(json) => Some(parse_col(5, serde_json::from_str::<SearchFilters>(&json))?),
            None => None,
        },
        last_message_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const CONVERSATION_COLUMNS: &str = "id, contact_id, status, priority, last_sent_listing_ids, \
     last_search_filters, last_message_at, created_at";

/// Resolve the conversation for a contact, creating one when necessary.
///
/// Returns the conversation and whether it was newly created. A newly created
/// conversation starts in `automated` and receives `welcome_text` as its
/// first assistant message; a resolved conversation found instead is
/// reactivated to `automated` (the sole automatic transition).
pub async fn resolve_for_contact(
    db: &Database,
    contact_id: &str,
    welcome_text: &str,
    now_ms: i64,
) -> Result<(Conversation, bool), FincabotError> {
    let contact_id = contact_id.to_string();
    let welcome_text = welcome_text.to_string();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let found = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations \
                     WHERE contact_id = ?1 \
                     ORDER BY last_message_at DESC, created_at DESC"
                ))?;
                let rows = stmt.query_map(params![contact_id], row_to_conversation)?;

                let mut active: Option<Conversation> = None;
                let mut latest_resolved: Option<Conversation> = None;
                for row in rows {
                    let conv = row?;
                    match conv.status {
                        ConversationStatus::Automated | ConversationStatus::Human => {
                            active = Some(conv);
                            break;
                        }
                        ConversationStatus::Resolved => {
                            if latest_resolved.is_none() {
                                latest_resolved = Some(conv);
                            }
                        }
                    }
                }
                (active, latest_resolved)
            };

            if let Some(conv) = found.0 {
                tx.commit()?;
                return Ok((conv, false));
            }

            if let Some(mut conv) = found.1 {
                tx.execute(
                    "UPDATE conversations SET status = 'automated' WHERE id = ?1",
                    params![conv.id],
                )?;
                tx.commit()?;
                conv.status = ConversationStatus::Automated;
                return Ok((conv, false));
            }

            let conv = Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                contact_id: contact_id.clone(),
                status: ConversationStatus::Automated,
                priority: None,
                last_sent_listing_ids: Vec::new(),
                last_search_filters: None,
                last_message_at: now_ms,
                created_at: now_ms,
            };
            tx.execute(
                "INSERT INTO conversations (id, contact_id, status, last_message_at, created_at) \
                 VALUES (?1, ?2, 'automated', ?3, ?4)",
                params![conv.id, contact_id, now_ms, now_ms],
            )?;
            tx.execute(
                "INSERT INTO messages (id, conversation_id, sender, content, created_at) \
                 VALUES (?1, ?2, 'assistant', ?3, ?4)",
                params![uuid::Uuid::new_v4().to_string(), conv.id, welcome_text, now_ms],
            )?;
            tx.commit()?;
            Ok((conv, true))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a conversation by id.
pub async fn get(db: &Database, id: &str) -> Result<Option<Conversation>, FincabotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let conv = conn
                .query_row(
                    &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                    params![id],
                    row_to_conversation,
                )
                .optional()?;
            Ok(conv)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a conversation's handoff status. Idempotent.
pub async fn set_status(
    db: &Database,
    id: &str,
    status: ConversationStatus,
) -> Result<(), FincabotError> {
    let id = id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let updated = conn.execute(
                "UPDATE conversations SET status = ?1 WHERE id = ?2",
                params![status, id],
            )?;
            if updated == 0 {
                return Err(format!("conversation {id} not found").into());
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err_boxed)
}

/// Set a conversation's operator priority. Never called by the automated
/// pipeline.
pub async fn set_priority(
    db: &Database,
    id: &str,
    priority: Priority,
) -> Result<(), FincabotError> {
    let id = id.to_string();
    let priority = priority.to_string();
    db.connection()
        .call(move |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let updated = conn.execute(
                "UPDATE conversations SET priority = ?1 WHERE id = ?2",
                params![priority, id],
            )?;
            if updated == 0 {
                return Err(format!("conversation {id} not found").into());
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err_boxed)
}

/// Bump a conversation's last-message timestamp.
pub async fn update_last_message_at(
    db: &Database,
    id: &str,
    now_ms: i64,
) -> Result<(), FincabotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET last_message_at = ?1 WHERE id = ?2",
                params![now_ms, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remember what the last catalog send contained and which filters produced
/// it, for a later "more options" request.
pub async fn set_last_catalog_sent(
    db: &Database,
    id: &str,
    listing_ids: &[String],
    filters: &SearchFilters,
) -> Result<(), FincabotError> {
    let id = id.to_string();
    let ids_json = serde_json::to_string(listing_ids)
        .map_err(|e| FincabotError::Internal(format!("serializing sent listing ids: {e}")))?;
    let filters_json = serde_json::to_string(filters)
        .map_err(|e| FincabotError::Internal(format!("serializing search filters: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET last_sent_listing_ids = ?1, last_search_filters = ?2 \
                 WHERE id = ?3",
                params![ids_json, filters_json, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Escalate the contact's newest active conversation to `human`.
///
/// Used when the business sends a manual message from the provider console;
/// a no-op when the contact has no active conversation. Returns whether a
/// conversation was escalated.
pub async fn escalate_latest_for_contact(
    db: &Database,
    contact_id: &str,
) -> Result<bool, FincabotError> {
    let contact_id = contact_id.to_string();
    db.connection()
        .call(move |conn| {
            let latest: Option<String> = conn
                .query_row(
                    "SELECT id FROM conversations WHERE contact_id = ?1 \
                     AND status IN ('automated', 'human') \
                     ORDER BY last_message_at DESC, created_at DESC LIMIT 1",
                    params![contact_id],
                    |row| row.get(0),
                )
                .optional()?;
            match latest {
                Some(id) => {
                    conn.execute(
                        "UPDATE conversations SET status = 'human' WHERE id = ?1",
                        params![id],
                    )?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List conversations for the operator inbox, newest first, joined with
/// contact phone and name. Optional status/priority filters.
pub async fn list(
    db: &Database,
    status: Option<ConversationStatus>,
    priority: Option<Priority>,
    limit: i64,
) -> Result<Vec<ConversationWithContact>, FincabotError> {
    let status = status.map(|s| s.to_string());
    let priority = priority.map(|p| p.to_string());
    db.connection()
        .call(move |conn| {
            const BASE: &str = "SELECT c.id, c.contact_id, c.status, c.priority, \
                 c.last_sent_listing_ids, c.last_search_filters, c.last_message_at, \
                 c.created_at, k.phone, k.name \
                 FROM conversations c JOIN contacts k ON k.id = c.contact_id";
            const TAIL: &str = "ORDER BY c.last_message_at DESC, c.created_at DESC";

            let map_row = |row: &Row<'_>| -> rusqlite::Result<ConversationWithContact> {
                Ok(ConversationWithContact {
                    conversation: row_to_conversation(row)?,
                    phone: row.get(8)?,
                    name: row.get(9)?,
                })
            };

            let mut out = Vec::new();
            match (&status, &priority) {
                (Some(s), Some(p)) => {
                    let mut stmt = conn.prepare(&format!(
                        "{BASE} WHERE c.status = ?1 AND c.priority = ?2 {TAIL} LIMIT ?3"
                    ))?;
                    let rows = stmt.query_map(params![s, p, limit], map_row)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
                (Some(s), None) => {
                    let mut stmt =
                        conn.prepare(&format!("{BASE} WHERE c.status = ?1 {TAIL} LIMIT ?2"))?;
                    let rows = stmt.query_map(params![s, limit], map_row)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
                (None, Some(p)) => {
                    let mut stmt =
                        conn.prepare(&format!("{BASE} WHERE c.priority = ?1 {TAIL} LIMIT ?2"))?;
                    let rows = stmt.query_map(params![p, limit], map_row)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
                (None, None) => {
                    let mut stmt = conn.prepare(&format!("{BASE} {TAIL} LIMIT ?1"))?;
                    let rows = stmt.query_map(params![limit], map_row)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
            }
            Ok(out)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
