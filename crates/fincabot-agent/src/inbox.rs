// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator-facing inbox surface.
//!
//! Simple projections and direct writes for the human side of the handoff:
//! list conversations, read messages, change status/priority, and send a
//! manual text. Unlike the automated pipeline, failures here propagate to
//! the operator — a manual send that did not go out must be visible.

use std::sync::Arc;

use chrono::Utc;
use fincabot_core::{
    ConversationStatus, FincabotError, Priority, Sender, WhatsAppTransport,
};
use fincabot_storage::models::ConversationWithContact;
use fincabot_storage::queries::{contacts, conversations, messages};
use fincabot_storage::{Database, Message};
use tracing::info;

/// Default page size for conversation listings.
const DEFAULT_LIST_LIMIT: i64 = 50;

/// Operator inbox over the shared storage and transport.
pub struct InboxService {
    db: Database,
    transport: Arc<dyn WhatsAppTransport>,
}

impl InboxService {
    pub fn new(db: Database, transport: Arc<dyn WhatsAppTransport>) -> Self {
        Self { db, transport }
    }

    /// Conversations newest first, optionally filtered by status/priority.
    pub async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
        priority: Option<Priority>,
        limit: Option<i64>,
    ) -> Result<Vec<ConversationWithContact>, FincabotError> {
        conversations::list(&self.db, status, priority, limit.unwrap_or(DEFAULT_LIST_LIMIT)).await
    }

    /// The recent messages of a conversation, chronological.
    pub async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, FincabotError> {
        messages::list_recent(&self.db, conversation_id, limit.unwrap_or(20)).await
    }

    /// Change the handoff status. Escalate/release/resolve are all idempotent
    /// writes through here.
    pub async fn set_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), FincabotError> {
        conversations::set_status(&self.db, conversation_id, status).await?;
        info!(conversation_id, status = %status, "conversation status changed by operator");
        Ok(())
    }

    /// Change the operator priority classification. Independent of status.
    pub async fn set_priority(
        &self,
        conversation_id: &str,
        priority: Priority,
    ) -> Result<(), FincabotError> {
        conversations::set_priority(&self.db, conversation_id, priority).await
    }

    /// Send a manual text message to the conversation's contact.
    ///
    /// Transport failure propagates (the operator must see it). On success
    /// the message is persisted and the conversation moves to `human` so the
    /// automated pipeline stays out of the way.
    pub async fn send_manual_text(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), FincabotError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FincabotError::Config(
                "texto requerido para mensaje de tipo text".to_string(),
            ));
        }

        let conversation = conversations::get(&self.db, conversation_id)
            .await?
            .ok_or_else(|| {
                FincabotError::NotFound(format!("conversation {conversation_id}"))
            })?;
        let contact = contacts::get(&self.db, &conversation.contact_id)
            .await?
            .ok_or_else(|| {
                FincabotError::NotFound(format!("contact {}", conversation.contact_id))
            })?;

        let phone = normalize_phone_e164(&contact.phone);
        self.transport.send_text(&phone, text, None).await?;

        let now_ms = Utc::now().timestamp_millis();
        messages::insert(
            &self.db,
            &Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: conversation_id.to_string(),
                sender: Sender::Assistant,
                content: text.to_string(),
                media_kind: None,
                media_url: None,
                created_at: now_ms,
            },
        )
        .await?;
        conversations::set_status(&self.db, conversation_id, ConversationStatus::Human).await?;
        conversations::update_last_message_at(&self.db, conversation_id, now_ms).await?;
        Ok(())
    }
}

/// Normalize a stored phone into E.164.
///
/// Colombian local mobiles (ten digits starting with 3) get the country
/// prefix; anything already carrying a country code passes through.
fn normalize_phone_e164(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return phone.to_string();
    }
    if digits.len() == 10 && digits.starts_with('3') {
        return format!("+57{digits}");
    }
    format!("+{digits}")
}
