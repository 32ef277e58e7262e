// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.
//!
//! The log is append-only; nothing in this module mutates or deletes rows.
//! Ordering ties on `created_at` are broken by insertion order (rowid).

use fincabot_core::FincabotError;
use rusqlite::{params, Row};

use crate::database::Database;
use crate::models::{MediaKind, Message, Sender};

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let sender: String = row.get(2)?;
    let media_kind: Option<String> = row.get(4)?;
    let parse = |idx: usize, e: strum::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender: sender.parse::<Sender>().map_err(|e| parse(2, e))?,
        content: row.get(3)?,
        media_kind: match media_kind {
            Some(k) => Some(k.parse::<MediaKind>().map_err(|e| parse(4, e))?),
            None => None,
        },
        media_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append a message to a conversation's log.
pub async fn insert(db: &Database, msg: &Message) -> Result<(), FincabotError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender, content, media_kind, \
                 media_url, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    msg.id,
                    msg.conversation_id,
                    msg.sender.to_string(),
                    msg.content,
                    msg.media_kind.map(|k| k.to_string()),
                    msg.media_url,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The most recent `limit` messages of a conversation, in chronological order.
pub async fn list_recent(
    db: &Database,
    conversation_id: &str,
    limit: i64,
) -> Result<Vec<Message>, FincabotError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender, content, media_kind, media_url, created_at \
                 FROM messages WHERE conversation_id = ?1 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![conversation_id, limit], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
