// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Fincabot WhatsApp sales agent.
//!
//! This crate provides the domain types, the error taxonomy, and the adapter
//! traits at the external seams (text generation, knowledge retrieval, and
//! the WhatsApp transport). Every other crate in the workspace builds on
//! these definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::FincabotError;
pub use traits::{KnowledgeSearch, TextGenerator, WhatsAppTransport};
pub use types::{
    Catalog, ChatMessage, Contact, Conversation, ConversationStatus, Listing, ListingCard,
    MediaKind, Message, Priority, SearchFilters, Sender,
};
