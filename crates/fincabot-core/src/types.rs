// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Fincabot workspace.
//!
//! Entity structs mirror the storage schema one-to-one; timestamps are epoch
//! milliseconds (UTC) at every boundary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Handoff state of a conversation.
///
/// `Automated` conversations receive generated replies; `Human` conversations
/// are owned by an operator and the pipeline stays silent; `Resolved`
/// conversations are closed until a fresh inbound message reactivates the
/// most recent one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Automated,
    Human,
    Resolved,
}

/// Operator-assigned priority classification.
///
/// Independent of [`ConversationStatus`]; never written by the automated
/// pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Low,
    Medium,
    Resolved,
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Kind of media attached to a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Document,
}

/// A WhatsApp customer, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub phone: String,
    pub name: String,
    pub created_at: i64,
}

/// The filters of a catalog search, remembered on the conversation so a later
/// "more options" request can replay them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub location: String,
    /// Check-in, epoch milliseconds at 00:00.
    pub starts_at: i64,
    /// Check-out (exclusive), epoch milliseconds at 00:00.
    pub ends_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_capacity: Option<i64>,
    #[serde(default)]
    pub sort_by_price: bool,
}

/// A conversation thread with one contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub contact_id: String,
    pub status: ConversationStatus,
    pub priority: Option<Priority>,
    /// Listing ids sent in the most recent catalog message, for exclusion on
    /// "more options".
    pub last_sent_listing_ids: Vec<String>,
    /// Filters that produced the most recent catalog message.
    pub last_search_filters: Option<SearchFilters>,
    pub last_message_at: i64,
    pub created_at: i64,
}

/// One message in a conversation's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub content: String,
    pub media_kind: Option<MediaKind>,
    pub media_url: Option<String>,
    pub created_at: i64,
}

/// A bookable property. Read-only from the agent's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub capacity: i64,
    pub base_price: Option<f64>,
    pub visible: bool,
    pub reservable: bool,
}

/// Minimal listing projection returned by the availability query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub base_price: Option<f64>,
}

/// A provider-side product catalog that listings map into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    /// The catalog id on the provider side (goes on the wire).
    pub external_id: String,
    /// When set, this catalog is preferred for locations containing the keyword.
    pub location_keyword: Option<String>,
    pub is_default: bool,
}

/// One turn of dialogue handed to the text-generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Sender,
    pub content: String,
}
