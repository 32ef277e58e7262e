// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `fincabot-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within the
//! storage crate.

pub use fincabot_core::types::{
    Catalog, Contact, Conversation, ConversationStatus, Listing, ListingCard, MediaKind, Message,
    Priority, SearchFilters, Sender,
};

use serde::{Deserialize, Serialize};

/// A reservation window on a listing. Only consulted for overlap exclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub listing_id: String,
    /// Check-in, epoch milliseconds.
    pub starts_at: i64,
    /// Check-out (exclusive), epoch milliseconds.
    pub ends_at: i64,
    /// Free-form status; `cancelled` bookings never block availability.
    pub status: String,
}

/// A conversation joined with its contact, for the operator inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationWithContact {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub phone: String,
    pub name: String,
}
